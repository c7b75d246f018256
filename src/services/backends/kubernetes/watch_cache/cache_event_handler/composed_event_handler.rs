
use super::CacheEventHandler;
use async_trait::async_trait;
use kube::Resource;
use std::sync::Arc;

/// Forwards every event to its handlers in registration order.
pub struct ComposedEventHandler<R>
where
    R: Resource + Send + Sync + 'static,
{
    handlers: Vec<Arc<dyn CacheEventHandler<R>>>,
}

impl<R> ComposedEventHandler<R>
where
    R: Resource + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn add_handler(mut self, handler: Arc<dyn CacheEventHandler<R>>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<R> Default for ComposedEventHandler<R>
where
    R: Resource + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> CacheEventHandler<R> for ComposedEventHandler<R>
where
    R: Resource + Send + Sync + 'static,
{
    async fn on_add(&self, object: &Arc<R>) {
        for handler in &self.handlers {
            handler.on_add(object).await;
        }
    }

    async fn on_update(&self, old: &Arc<R>, new: &Arc<R>) {
        for handler in &self.handlers {
            handler.on_update(old, new).await;
        }
    }

    async fn on_delete(&self, object: &Arc<R>) {
        for handler in &self.handlers {
            handler.on_delete(object).await;
        }
    }
}
