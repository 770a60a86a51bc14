pub mod config_manager;

pub use config_manager::{AdapterConfig, ExtraInfo, DEFAULT_TARGETING_ENDPOINT};
