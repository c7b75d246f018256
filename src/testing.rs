use crate::configuration::models::connection_settings::ConnectionSource;
use crate::services::backends::kubernetes::cluster_handle::ClusterHandle;
use crate::services::backends::kubernetes::kubeconfig_loader;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::PostParams;
use kube::{Api, Config};
use log::info;
use serde_json::json;
use uuid::Uuid;

pub mod fake_cluster;
pub mod fake_cluster_context;
pub mod temp_namespace_context;
pub mod watch_stream;

/// Kubeconfig of the local kind cluster used by the integration tests
pub async fn get_kubeconfig() -> anyhow::Result<Config> {
    let source = ConnectionSource::Command {
        command: "kind get kubeconfig --name kind".to_string(),
    };
    kubeconfig_loader::load(&source).await
}

pub async fn create_namespace(cluster: &ClusterHandle) -> anyhow::Result<String> {
    let namespace_name = Uuid::new_v4().to_string();
    info!("Using namespace: {}", namespace_name);

    let namespaces: Api<Namespace> = Api::all(cluster.client());
    let namespace_definition = json!({
        "metadata": {
            "name": namespace_name
        }
    });

    let ns = serde_json::from_value(namespace_definition)?;
    namespaces.create(&PostParams::default(), &ns).await?;
    info!("Namespace {} created successfully", namespace_name);
    Ok(namespace_name)
}
