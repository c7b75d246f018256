pub mod composed_event_handler;
pub mod logging_event_handler;

use super::cache_event::CacheEvent;
use super::cache_map::CacheMap;
use async_trait::async_trait;
use kube::Resource;
use std::sync::Arc;

/// Receives the validated changes applied by the watch cache.
#[async_trait]
pub trait CacheEventHandler<R>: Send + Sync
where
    R: Resource + Send + Sync + 'static,
{
    async fn on_add(&self, object: &Arc<R>);

    async fn on_update(&self, old: &Arc<R>, new: &Arc<R>);

    async fn on_delete(&self, object: &Arc<R>);

    async fn handle(&self, event: &CacheEvent<R>) {
        match event {
            CacheEvent::Added(object) => self.on_add(object).await,
            CacheEvent::Updated { old, new } => self.on_update(old, new).await,
            CacheEvent::Deleted(object) => self.on_delete(object).await,
        }
    }
}

fn object_name<R: Resource>(object: &R) -> Option<String> {
    object.meta().name.clone()
}

#[async_trait]
impl<R> CacheEventHandler<R> for CacheMap<R>
where
    R: Resource + Send + Sync + 'static,
{
    async fn on_add(&self, object: &Arc<R>) {
        if let Some(name) = object_name(object.as_ref()) {
            self.upsert(name, object.clone());
        }
    }

    async fn on_update(&self, _old: &Arc<R>, new: &Arc<R>) {
        if let Some(name) = object_name(new.as_ref()) {
            self.upsert(name, new.clone());
        }
    }

    async fn on_delete(&self, object: &Arc<R>) {
        if let Some(name) = object.meta().name.as_deref() {
            self.remove(name);
        }
    }
}
