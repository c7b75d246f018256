use kube::Resource;
use std::sync::Arc;

/// A validated change of one cached object.
///
/// Produced at the subscription boundary, so every payload has a name and
/// belongs to the namespace of the cache.
#[derive(Debug)]
pub enum CacheEvent<R> {
    Added(Arc<R>),
    Updated { old: Arc<R>, new: Arc<R> },
    Deleted(Arc<R>),
}

impl<R> CacheEvent<R>
where
    R: Resource,
{
    /// Name of the object the event is about
    pub fn name(&self) -> &str {
        let object = match self {
            CacheEvent::Added(object) => object,
            CacheEvent::Updated { new, .. } => new,
            CacheEvent::Deleted(object) => object,
        };
        object.meta().name.as_deref().unwrap_or_default()
    }
}

impl<R> Clone for CacheEvent<R> {
    fn clone(&self) -> Self {
        match self {
            CacheEvent::Added(object) => CacheEvent::Added(object.clone()),
            CacheEvent::Updated { old, new } => CacheEvent::Updated {
                old: old.clone(),
                new: new.clone(),
            },
            CacheEvent::Deleted(object) => CacheEvent::Deleted(object.clone()),
        }
    }
}
