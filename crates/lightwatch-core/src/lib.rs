pub mod config;
pub mod error;
pub mod types;
pub mod wire;

pub use config::{LightwatchConfig, parse_duration};
pub use error::{ClientError, ClientResult, ConfigError};
pub use types::*;
