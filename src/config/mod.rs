//! Client configuration: settings structures, validation, and layered
//! loading from TOML files and `SYNDIC__*` environment variables.

mod error;
mod loader;
mod settings;

pub use error::ConfigError;
pub use loader::{load, load_with};
pub use settings::{ApiSettings, CacheSettings, OtpSettings, Settings};
