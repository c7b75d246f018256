pub mod apply_settings;
pub mod cache_settings;
pub mod connection_settings;
