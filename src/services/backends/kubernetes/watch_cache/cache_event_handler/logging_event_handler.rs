use super::CacheEventHandler;
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use log::debug;
use std::sync::Arc;

pub struct LoggingEventHandler;

fn describe(metadata: &ObjectMeta) -> (&str, &str, &str) {
    (
        metadata.name.as_deref().unwrap_or_default(),
        metadata.namespace.as_deref().unwrap_or_default(),
        metadata.resource_version.as_deref().unwrap_or_default(),
    )
}

#[async_trait]
impl<R> CacheEventHandler<R> for LoggingEventHandler
where
    R: Resource + Send + Sync + 'static,
{
    async fn on_add(&self, object: &Arc<R>) {
        let (name, namespace, resource_version) = describe(object.meta());
        debug!(
            name = name,
            namespace = namespace,
            resource_version = resource_version;
            "Adding object {} to the cache", name);
    }

    async fn on_update(&self, old: &Arc<R>, new: &Arc<R>) {
        let (name, namespace, resource_version) = describe(new.meta());
        let previous_version = old.meta().resource_version.as_deref().unwrap_or_default();
        debug!(
            name = name,
            namespace = namespace,
            previous_version = previous_version,
            resource_version = resource_version;
            "Updating object {} in the cache", name);
    }

    async fn on_delete(&self, object: &Arc<R>) {
        let (name, namespace, _) = describe(object.meta());
        debug!(
            name = name,
            namespace = namespace;
            "Deleting object {} from the cache", name);
    }
}
