
use crate::configuration::models::connection_settings::ConnectionSource;
use anyhow::bail;
use async_trait::async_trait;
use kube::Config;
use kube::config::{KubeConfigOptions, Kubeconfig};
use log::{debug, info};
use std::process::Command;
use std::sync::Arc;

/// Picks the loader matching the configured connection source and runs it.
pub async fn load(source: &ConnectionSource) -> anyhow::Result<Config> {
    match source {
        ConnectionSource::InCluster => from_cluster().load(),
        ConnectionSource::Kubeconfig { path } => from_file().load(path).await,
        ConnectionSource::Command { command } => from_command().load(command).await,
        ConnectionSource::Infer => {
            info!("Inferring Kubernetes configuration from the environment");
            Ok(Config::infer().await?)
        }
    }
}

pub fn from_command() -> Arc<dyn KubeConfigLoader<ConfigSource = String>> {
    Arc::new(ExecutableKubeConfigLoader)
}

pub fn from_file() -> Arc<dyn KubeConfigLoader<ConfigSource = String>> {
    Arc::new(FileKubeConfigLoader)
}

pub fn from_cluster() -> Arc<dyn ParameterLessConfigLoader> {
    Arc::new(InClusterKubeConfigLoader)
}

#[async_trait]
pub trait KubeConfigLoader: Send + Sync {
    type ConfigSource;
    async fn load(&self, source: &Self::ConfigSource) -> anyhow::Result<Config>;
}

pub trait ParameterLessConfigLoader: Send + Sync {
    fn load(&self) -> anyhow::Result<Config>;
}

/// Parses a kubeconfig document and resolves its current context.
pub async fn parse_kubeconfig(kubeconfig_string: &str) -> anyhow::Result<Config> {
    let kubeconfig: Kubeconfig = serde_yml::from_str(kubeconfig_string)?;
    if kubeconfig.clusters.is_empty() {
        bail!("Kubeconfig does not define any cluster");
    }
    Ok(Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?)
}

struct ExecutableKubeConfigLoader;

#[async_trait]
impl KubeConfigLoader for ExecutableKubeConfigLoader {
    type ConfigSource = String;

    async fn load(&self, source: &Self::ConfigSource) -> anyhow::Result<Config> {
        info!("Loading kubeconfig from command: {:?}", source);
        let output = Command::new("sh").arg("-c").arg(source).output()?;
        if !output.status.success() {
            bail!(
                "Failed to execute command: {:?}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        let kubeconfig_string = String::from_utf8(output.stdout)?;
        debug!("Kubeconfig produced by the command:\n{:?}", kubeconfig_string);
        parse_kubeconfig(&kubeconfig_string).await
    }
}

struct FileKubeConfigLoader;

#[async_trait]
impl KubeConfigLoader for FileKubeConfigLoader {
    type ConfigSource = String;

    async fn load(&self, source: &Self::ConfigSource) -> anyhow::Result<Config> {
        info!("Loading kubeconfig file: {:?}", source);
        let kubeconfig_string = tokio::fs::read_to_string(source).await?;
        parse_kubeconfig(&kubeconfig_string).await
    }
}

struct InClusterKubeConfigLoader;

impl ParameterLessConfigLoader for InClusterKubeConfigLoader {
    fn load(&self) -> anyhow::Result<Config> {
        info!("Loading in-cluster Kubernetes configuration");
        let config = Config::incluster()?;
        Ok(config)
    }
}
