//! Country-scoped Firebase credentials.
//!
//! [`ConfigRegistry`] maps a [`Country`] to the [`CredentialBundle`] of each [`Platform`] and
//! tracks which country is currently selected.

mod defaults;
mod environment;
pub mod error;
mod logger;
mod registry;
mod types;

pub use defaults::DEFAULT_COUNTRY;
pub use environment::{CONFIGS_ENV, CONFIGS_PATH_ENV};
pub use error::{ConfigError, ConfigErrorCode, ConfigResult};
pub use registry::ConfigRegistry;
pub use types::{Country, CredentialBundle, Platform, PlatformCredentials};
