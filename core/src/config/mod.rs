mod load;
mod types;

pub use load::{get_cacatua_data_dir, load_default, load_from_path};
pub use types::{
    AppConfig, BackendConfig, HttpServerConfig, LoggingConfig, LogsConfig, PodmanConfig,
};
