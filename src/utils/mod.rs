pub mod credentials;
pub mod toml_config;
