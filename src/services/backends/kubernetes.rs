pub mod apply_engine;
pub mod cluster_handle;
pub mod kubeconfig_loader;
pub mod manifest_decoder;
pub mod resource_resolver;
pub mod watch_cache;
