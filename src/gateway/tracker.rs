use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::gateway::api::AnalyticsGateway;
use crate::gateway::error::GatewayResult;
use crate::gateway::sdk::EventParams;

pub const TEST_BUTTON_EVENT: &str = "test_button_click";
pub const MAIN_TEST_BUTTON_ID: &str = "main_test_button";

/// Parameters of a `test_button_click` event, without the timestamp.
pub fn test_button_click_params(button_id: &str, click_count: u64) -> EventParams {
    EventParams::from([
        ("button_id".to_string(), Value::from(button_id)),
        ("click_count".to_string(), Value::from(click_count)),
    ])
}

/// Counts presses of a test button that were accepted by the SDK.
#[derive(Debug)]
pub struct ButtonClickTracker {
    button_id: String,
    clicks: AtomicU64,
}

impl Default for ButtonClickTracker {
    fn default() -> Self {
        Self::new(MAIN_TEST_BUTTON_ID)
    }
}

impl ButtonClickTracker {
    pub fn new(button_id: impl Into<String>) -> Self {
        Self {
            button_id: button_id.into(),
            clicks: AtomicU64::new(0),
        }
    }

    pub fn button_id(&self) -> &str {
        &self.button_id
    }

    pub fn clicks(&self) -> u64 {
        self.clicks.load(Ordering::SeqCst)
    }

    /// Logs one press and returns its click number. Overlapping presses get distinct numbers;
    /// a press the SDK rejects gives its number back.
    pub async fn fire(&self, gateway: &AnalyticsGateway) -> GatewayResult<u64> {
        let click_count = self.clicks.fetch_add(1, Ordering::SeqCst) + 1;
        let mut params = test_button_click_params(&self.button_id, click_count);
        params.insert(
            "timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        if let Err(err) = gateway.log_event(TEST_BUTTON_EVENT, params).await {
            self.clicks.fetch_sub(1, Ordering::SeqCst);
            return Err(err);
        }
        Ok(click_count)
    }
}
