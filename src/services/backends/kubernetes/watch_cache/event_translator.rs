#[cfg(test)]
mod tests;

use super::cache_event::CacheEvent;
use super::cache_map::CacheMap;
use kube::Resource;
use kube::runtime::watcher;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of translating one raw watch event.
pub struct Translation<R> {
    pub events: Vec<CacheEvent<R>>,

    /// Set when the event completed a full listing of the namespace
    pub listing_completed: bool,
}

impl<R> Translation<R> {
    fn empty() -> Self {
        Translation {
            events: Vec::new(),
            listing_completed: false,
        }
    }

    fn single(event: CacheEvent<R>) -> Self {
        Translation {
            events: vec![event],
            listing_completed: false,
        }
    }
}

/// Turns raw watcher events into [`CacheEvent`]s.
///
/// Only the worker that owns the translator writes to the map, so the lookups used
/// to tell an addition from an update cannot race with a mutation.
pub struct EventTranslator<R> {
    namespace: String,
    map: Arc<CacheMap<R>>,
    listing: Option<HashMap<String, Arc<R>>>,
}

impl<R> EventTranslator<R>
where
    R: Resource,
{
    pub fn new(namespace: String, map: Arc<CacheMap<R>>) -> Self {
        EventTranslator {
            namespace,
            map,
            listing: None,
        }
    }

    pub fn translate(&mut self, event: watcher::Event<R>) -> Translation<R> {
        match event {
            watcher::Event::Init => {
                self.listing = Some(HashMap::new());
                Translation::empty()
            }
            watcher::Event::InitApply(object) => {
                if let Some((name, object)) = self.validate(object) {
                    self.listing.get_or_insert_with(HashMap::new).insert(name, object);
                }
                Translation::empty()
            }
            watcher::Event::InitDone => self.complete_listing(),
            watcher::Event::Apply(object) => match self.validate(object) {
                Some((name, object)) => match self.map.get(&name) {
                    Some(old) => Translation::single(CacheEvent::Updated { old, new: object }),
                    None => Translation::single(CacheEvent::Added(object)),
                },
                None => Translation::empty(),
            },
            watcher::Event::Delete(object) => match self.validate(object) {
                Some((_, object)) => Translation::single(CacheEvent::Deleted(object)),
                None => Translation::empty(),
            },
        }
    }

    /// Diffs the buffered listing against the map: listed names are added or
    /// updated, cached names missing from the listing are deleted.
    fn complete_listing(&mut self) -> Translation<R> {
        let mut listing = self.listing.take().unwrap_or_default();
        let mut events = Vec::with_capacity(listing.len());

        for name in self.map.names() {
            if listing.contains_key(&name) {
                continue;
            }
            if let Some(stale) = self.map.get(&name) {
                events.push(CacheEvent::Deleted(stale));
            }
        }

        for (name, object) in listing.drain() {
            match self.map.get(&name) {
                Some(old) => events.push(CacheEvent::Updated { old, new: object }),
                None => events.push(CacheEvent::Added(object)),
            }
        }

        Translation {
            events,
            listing_completed: true,
        }
    }

    fn validate(&self, object: R) -> Option<(String, Arc<R>)> {
        let metadata = object.meta();
        let Some(name) = metadata.name.clone() else {
            warn!("Dropping watch event for an object without a name");
            return None;
        };
        if metadata.namespace.as_deref() != Some(self.namespace.as_str()) {
            warn!(
                name = name.as_str(),
                namespace = metadata.namespace.as_deref().unwrap_or_default();
                "Dropping watch event for object {} outside of namespace {}", name, self.namespace);
            return None;
        }
        Some((name, Arc::new(object)))
    }
}
