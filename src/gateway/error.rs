use std::fmt;

use crate::config::{ConfigError, ConfigErrorCode, Country};
use crate::gateway::sdk::SdkError;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    NotFound(ConfigError),
    InvalidConfig(ConfigError),
    AlreadyInitialized { active: Country, requested: Country },
    NotInitialized,
    InitializationInProgress { country: Country },
    Sdk(SdkError),
}

impl GatewayError {
    pub fn code_str(&self) -> &'static str {
        match self {
            GatewayError::NotFound(_) => "gateway/not-found",
            GatewayError::InvalidConfig(_) => "gateway/invalid-config",
            GatewayError::AlreadyInitialized { .. } => "gateway/already-initialized",
            GatewayError::NotInitialized => "gateway/not-initialized",
            GatewayError::InitializationInProgress { .. } => "gateway/initialization-in-progress",
            GatewayError::Sdk(_) => "gateway/sdk",
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::NotFound(err) | GatewayError::InvalidConfig(err) => write!(f, "{err}"),
            GatewayError::AlreadyInitialized { active, requested } => write!(
                f,
                "Firebase already initialized for {active}. Cannot change to {requested}. Restart the app to use a different country."
            ),
            GatewayError::NotInitialized => {
                write!(f, "Firebase not initialized. Select a country first.")
            }
            GatewayError::InitializationInProgress { country } => {
                write!(f, "Firebase initialization for {country} is already in progress")
            }
            GatewayError::Sdk(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::NotFound(err) | GatewayError::InvalidConfig(err) => Some(err),
            GatewayError::Sdk(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for GatewayError {
    fn from(err: ConfigError) -> Self {
        match err.code {
            ConfigErrorCode::NotFound => GatewayError::NotFound(err),
            ConfigErrorCode::InvalidConfig => GatewayError::InvalidConfig(err),
        }
    }
}

impl From<SdkError> for GatewayError {
    fn from(err: SdkError) -> Self {
        GatewayError::Sdk(err)
    }
}
