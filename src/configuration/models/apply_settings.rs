use kube::api::PostParams;
use serde::Deserialize;

/// Settings of the manifest apply pipeline.
#[derive(Clone, Debug, Deserialize)]
pub struct ApplySettings {
    /// Namespace used for namespaced objects that do not declare one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    #[serde(default)]
    pub field_manager: Option<String>,

    #[serde(default)]
    pub dry_run: bool,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for ApplySettings {
    fn default() -> Self {
        ApplySettings {
            default_namespace: default_namespace(),
            field_manager: None,
            dry_run: false,
        }
    }
}

impl From<&ApplySettings> for PostParams {
    fn from(settings: &ApplySettings) -> Self {
        PostParams {
            dry_run: settings.dry_run,
            field_manager: settings.field_manager.clone(),
        }
    }
}
