use crate::configuration::models::apply_settings::ApplySettings;
use crate::services::backends::kubernetes::apply_engine::apply_error::{ApplyError, WriteOperation};
use crate::services::backends::kubernetes::cluster_handle::ClusterHandle;
use crate::services::backends::kubernetes::manifest_decoder::UnstructuredObject;
use crate::services::backends::kubernetes::resource_resolver::{ResourceMapper, ResourceMapping};
use async_trait::async_trait;
use kube::api::{Api, PostParams};
use kube::core::DynamicObject;
use kube::Client;
use std::sync::Arc;

/// Access to arbitrary resource kinds of the cluster.
#[async_trait]
pub trait DynamicResourceManager: Send + Sync {
    /// Builds the kind mapping from the live discovery document
    async fn discover(&self) -> Result<ResourceMapper, ApplyError>;

    /// Returns `None` only when the object does not exist
    async fn get(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<UnstructuredObject>, ApplyError>;

    async fn create(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        object: &UnstructuredObject,
    ) -> Result<UnstructuredObject, ApplyError>;

    async fn replace(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        name: &str,
        object: &UnstructuredObject,
    ) -> Result<UnstructuredObject, ApplyError>;
}

#[async_trait]
impl<M> DynamicResourceManager for Arc<M>
where
    M: DynamicResourceManager + ?Sized,
{
    async fn discover(&self) -> Result<ResourceMapper, ApplyError> {
        self.as_ref().discover().await
    }

    async fn get(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<UnstructuredObject>, ApplyError> {
        self.as_ref().get(mapping, namespace, name).await
    }

    async fn create(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        object: &UnstructuredObject,
    ) -> Result<UnstructuredObject, ApplyError> {
        self.as_ref().create(mapping, namespace, object).await
    }

    async fn replace(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        name: &str,
        object: &UnstructuredObject,
    ) -> Result<UnstructuredObject, ApplyError> {
        self.as_ref().replace(mapping, namespace, name, object).await
    }
}

/// [`DynamicResourceManager`] talking to the API server through `Api<DynamicObject>`.
pub struct KubernetesDynamicResourceManager {
    client: Client,
    post_params: PostParams,
}

impl KubernetesDynamicResourceManager {
    pub fn new(cluster: &ClusterHandle, settings: &ApplySettings) -> Self {
        KubernetesDynamicResourceManager {
            client: cluster.client(),
            post_params: settings.into(),
        }
    }

    fn api(&self, mapping: &ResourceMapping, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(namespace) if mapping.is_namespaced() => {
                Api::namespaced_with(self.client.clone(), namespace, &mapping.api_resource)
            }
            _ => Api::all_with(self.client.clone(), &mapping.api_resource),
        }
    }
}

#[async_trait]
impl DynamicResourceManager for KubernetesDynamicResourceManager {
    async fn discover(&self) -> Result<ResourceMapper, ApplyError> {
        ResourceMapper::discover(self.client.clone()).await
    }

    async fn get(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<UnstructuredObject>, ApplyError> {
        self.api(mapping, namespace)
            .get_opt(name)
            .await
            .map_err(|source| ApplyError::Read {
                name: name.to_string(),
                source,
            })
    }

    async fn create(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        object: &UnstructuredObject,
    ) -> Result<UnstructuredObject, ApplyError> {
        self.api(mapping, namespace)
            .create(&self.post_params, object)
            .await
            .map_err(|source| ApplyError::Write {
                operation: WriteOperation::Create,
                name: object.metadata.name.clone().unwrap_or_default(),
                source,
            })
    }

    async fn replace(
        &self,
        mapping: &ResourceMapping,
        namespace: Option<&str>,
        name: &str,
        object: &UnstructuredObject,
    ) -> Result<UnstructuredObject, ApplyError> {
        self.api(mapping, namespace)
            .replace(name, &self.post_params, object)
            .await
            .map_err(|source| ApplyError::Write {
                operation: WriteOperation::Replace,
                name: name.to_string(),
                source,
            })
    }
}
