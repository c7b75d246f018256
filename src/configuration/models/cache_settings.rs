use crate::services::backends::kubernetes::watch_cache::WatchCacheConfig;
use duration_string::DurationString;
use serde::Deserialize;
use std::time::Duration;

/// Settings of the namespace-scoped pod cache.
#[derive(Debug, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub label_selector: Option<String>,

    /// Upper bound for the initial synchronization performed by `start`
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout: DurationString,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_sync_timeout() -> DurationString {
    DurationString::from(Duration::from_secs(30))
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            namespace: default_namespace(),
            label_selector: None,
            sync_timeout: default_sync_timeout(),
        }
    }
}

impl From<&CacheSettings> for WatchCacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        WatchCacheConfig {
            namespace: settings.namespace.clone(),
            label_selector: settings.label_selector.clone(),
            sync_timeout: settings.sync_timeout.clone().into(),
        }
    }
}
