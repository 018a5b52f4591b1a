//! One-shot analytics SDK initialization for the selected country.
//!
//! [`AnalyticsGateway`] resolves credentials through a [`ConfigRegistry`](crate::config::ConfigRegistry),
//! bootstraps an [`AnalyticsSdk`] once and forwards events and user attributes to the
//! resulting [`AnalyticsHandle`].

mod api;
pub mod error;
mod logger;
mod memory;
mod sdk;
mod tracker;

pub use api::{AnalyticsGateway, GatewayStatus};
pub use error::{GatewayError, GatewayResult};
pub use memory::{AnalyticsEvent, InMemoryHandle, InMemorySdk};
pub use sdk::{AnalyticsHandle, AnalyticsSdk, EventParams, SdkError, SdkResult};
pub use tracker::{
    test_button_click_params, ButtonClickTracker, MAIN_TEST_BUTTON_ID, TEST_BUTTON_EVENT,
};
