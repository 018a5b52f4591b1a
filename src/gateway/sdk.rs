//! Capability interface of the vendor analytics SDK.
//!
//! The gateway only ever talks to these two traits, so a native SDK binding, a REST client or
//! the bundled [`InMemorySdk`](crate::gateway::InMemorySdk) can stand behind it.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::CredentialBundle;

pub type EventParams = BTreeMap<String, Value>;

/// Error reported by the vendor SDK. The gateway passes it to callers unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdkError {
    code: String,
    message: String,
}

impl SdkError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SdkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for SdkError {}

pub type SdkResult<T> = Result<T, SdkError>;

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait AnalyticsSdk: Send + Sync {
    /// Bootstraps the SDK against the project described by `credentials`.
    async fn initialize_app(
        &self,
        credentials: &CredentialBundle,
    ) -> SdkResult<Arc<dyn AnalyticsHandle>>;
}

/// Analytics instance of an initialized app.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait AnalyticsHandle: Send + Sync {
    async fn log_event(&self, name: &str, params: &EventParams) -> SdkResult<()>;

    async fn set_user_property(&self, key: &str, value: &str) -> SdkResult<()>;

    async fn set_user_id(&self, id: &str) -> SdkResult<()>;

    async fn set_analytics_collection_enabled(&self, enabled: bool) -> SdkResult<()>;
}
