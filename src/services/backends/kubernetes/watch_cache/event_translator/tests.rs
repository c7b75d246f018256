use super::EventTranslator;
use crate::services::backends::kubernetes::watch_cache::cache_event::CacheEvent;
use crate::services::backends::kubernetes::watch_cache::cache_map::CacheMap;
use crate::testing::watch_stream::pod;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher::Event;
use std::sync::Arc;

fn translator() -> (EventTranslator<Pod>, Arc<CacheMap<Pod>>) {
    let map = Arc::new(CacheMap::new());
    (EventTranslator::new("default".to_string(), map.clone()), map)
}

#[test]
fn test_listing_is_buffered_until_done() {
    let (mut translator, _) = translator();

    assert!(translator.translate(Event::Init).events.is_empty());
    assert!(translator.translate(Event::InitApply(pod("web-1", "default", "1"))).events.is_empty());
    assert!(translator.translate(Event::InitApply(pod("web-2", "default", "2"))).events.is_empty());

    let done = translator.translate(Event::InitDone);

    assert!(done.listing_completed);
    assert_eq!(done.events.len(), 2);
    assert!(done.events.iter().all(|event| matches!(event, CacheEvent::Added(_))));
}

#[test]
fn test_relist_updates_known_and_deletes_missing() {
    let (mut translator, map) = translator();
    map.upsert("web-1".to_string(), Arc::new(pod("web-1", "default", "1")));
    map.upsert("web-2".to_string(), Arc::new(pod("web-2", "default", "2")));

    translator.translate(Event::Init);
    translator.translate(Event::InitApply(pod("web-1", "default", "5")));
    translator.translate(Event::InitApply(pod("web-3", "default", "6")));
    let done = translator.translate(Event::InitDone);

    let mut described: Vec<String> = done
        .events
        .iter()
        .map(|event| match event {
            CacheEvent::Added(_) => format!("added {}", event.name()),
            CacheEvent::Updated { .. } => format!("updated {}", event.name()),
            CacheEvent::Deleted(_) => format!("deleted {}", event.name()),
        })
        .collect();
    described.sort();

    assert_eq!(described, vec!["added web-3", "deleted web-2", "updated web-1"]);
}

#[test]
fn test_apply_distinguishes_add_from_update() {
    let (mut translator, map) = translator();

    let added = translator.translate(Event::Apply(pod("web-1", "default", "1")));
    assert!(matches!(added.events.as_slice(), [CacheEvent::Added(_)]));
    assert!(!added.listing_completed);

    map.upsert("web-1".to_string(), Arc::new(pod("web-1", "default", "1")));
    let updated = translator.translate(Event::Apply(pod("web-1", "default", "2")));

    match updated.events.as_slice() {
        [CacheEvent::Updated { old, new }] => {
            assert_eq!(old.metadata.resource_version.as_deref(), Some("1"));
            assert_eq!(new.metadata.resource_version.as_deref(), Some("2"));
        }
        other => panic!("Unexpected events: {:?}", other),
    }
}

#[test]
fn test_invalid_objects_are_dropped() {
    let (mut translator, _) = translator();
    let mut unnamed = pod("web-1", "default", "1");
    unnamed.metadata.name = None;

    assert!(translator.translate(Event::Apply(unnamed)).events.is_empty());
    assert!(translator.translate(Event::Apply(pod("web-1", "kube-system", "1"))).events.is_empty());
    assert!(translator.translate(Event::Delete(pod("web-1", "kube-system", "1"))).events.is_empty());
}

#[test]
fn test_delete_is_translated_even_when_absent() {
    let (mut translator, _) = translator();

    let deleted = translator.translate(Event::Delete(pod("web-1", "default", "1")));

    assert!(matches!(deleted.events.as_slice(), [CacheEvent::Deleted(_)]));
}
