
use crate::configuration::models::connection_settings::ConnectionSource;
use crate::services::backends::kubernetes::kubeconfig_loader;
use kube::{Client, Config};
use log::info;

/// Authenticated connection to the cluster control plane.
///
/// The cache and the apply engine only borrow the handle and derive their
/// per-resource `Api`s from [`ClusterHandle::client`].
#[derive(Clone)]
pub struct ClusterHandle {
    client: Client,
}

impl ClusterHandle {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Client::try_from(config)?;
        Ok(ClusterHandle { client })
    }

    pub async fn connect(source: &ConnectionSource) -> anyhow::Result<Self> {
        let config = kubeconfig_loader::load(source).await?;
        info!("Connecting to Kubernetes cluster at {}", config.cluster_url);
        Self::new(config)
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }
}
