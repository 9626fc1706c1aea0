mod api;
mod environment;
mod error;
mod file;
mod registry;
mod service;

pub use api::{fill_path, ApiPaths, ResourcePaths};
pub use environment::{Environment, ServiceKind};
pub use error::{ConfigError, ConfigResult};
pub use file::load_file;
pub use registry::{
    load, set_base_config, set_courier_config, set_gatekeeper_config, set_producer_config,
    set_screen_writer_config, HarnessConfig, HttpSettings, RegistryBuilder,
};
pub use service::{set_base_service_config, Credentials, DbConfig, DbType, ServiceConfig};
