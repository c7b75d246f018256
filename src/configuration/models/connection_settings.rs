use serde::Deserialize;

/// Where the cluster credentials come from.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionSource {
    /// Service account mounted into the pod
    InCluster,

    /// Kubeconfig file on disk
    Kubeconfig { path: String },

    /// Shell command printing a kubeconfig to stdout, e.g. `kind get kubeconfig`
    Command { command: String },

    /// Whatever `kube::Config::infer` finds in the environment
    Infer,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionSettings {
    pub source: ConnectionSource,
}
