use crate::services::backends::kubernetes::cluster_handle::ClusterHandle;
use crate::testing::{create_namespace, get_kubeconfig};
use test_context::AsyncTestContext;

pub struct TempNamespaceContext {
    pub namespace: String,
    pub cluster: ClusterHandle,
}

impl AsyncTestContext for TempNamespaceContext {
    async fn setup() -> Self {
        let config = get_kubeconfig().await.expect("Failed to create config");
        let cluster = ClusterHandle::new(config).expect("Failed to create Kubernetes client");
        let namespace = create_namespace(&cluster).await.expect("Failed to create namespace");
        TempNamespaceContext { namespace, cluster }
    }
}
