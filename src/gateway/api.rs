use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{ConfigRegistry, Country};
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::logger::LOGGER;
use crate::gateway::sdk::{AnalyticsHandle, AnalyticsSdk, EventParams};

/// Owns the one-time SDK initialization for a single country and forwards analytics calls to
/// the resulting handle.
///
/// Once ready, the gateway stays bound to its country for the rest of its lifetime; asking for
/// a different country fails with [`GatewayError::AlreadyInitialized`].
pub struct AnalyticsGateway {
    registry: Arc<ConfigRegistry>,
    sdk: Arc<dyn AnalyticsSdk>,
    state: Mutex<GatewayState>,
}

enum GatewayState {
    Uninitialized,
    Initializing {
        country: Country,
    },
    Ready {
        country: Country,
        handle: Arc<dyn AnalyticsHandle>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayStatus {
    Uninitialized,
    Initializing(Country),
    Ready(Country),
}

/// Reverts `Initializing` to `Uninitialized` when an initialization attempt ends without
/// reaching `Ready`, including when its future is dropped mid-flight.
struct PendingInitialization<'a> {
    state: &'a Mutex<GatewayState>,
}

impl Drop for PendingInitialization<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, GatewayState::Initializing { .. }) {
            *state = GatewayState::Uninitialized;
        }
    }
}

impl AnalyticsGateway {
    pub fn new(registry: Arc<ConfigRegistry>, sdk: Arc<dyn AnalyticsSdk>) -> Self {
        Self {
            registry,
            sdk,
            state: Mutex::new(GatewayState::Uninitialized),
        }
    }

    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    /// Initializes the SDK with the credentials of `country` for the registry's platform.
    ///
    /// Repeating the call for the ready country is a no-op. A call made while another
    /// initialization is still awaiting the SDK fails with
    /// [`GatewayError::InitializationInProgress`] and never bootstraps a second time.
    pub async fn initialize(&self, country: Country) -> GatewayResult<()> {
        let rejection = {
            let mut state = self.state.lock().unwrap();
            let rejection = match &*state {
                GatewayState::Ready { country: active, .. } if *active == country => Some(Ok(())),
                GatewayState::Ready { country: active, .. } => {
                    Some(Err(GatewayError::AlreadyInitialized {
                        active: *active,
                        requested: country,
                    }))
                }
                GatewayState::Initializing { country: pending } => {
                    Some(Err(GatewayError::InitializationInProgress { country: *pending }))
                }
                GatewayState::Uninitialized => None,
            };
            if rejection.is_none() {
                *state = GatewayState::Initializing { country };
            }
            rejection
        };

        match rejection {
            Some(Ok(())) => {
                LOGGER.info(format!("Firebase already initialized for {country}"));
                return Ok(());
            }
            Some(Err(err @ GatewayError::InitializationInProgress { .. })) => {
                LOGGER.warn(format!("Rejected initialization for {country}: {err}"));
                return Err(err);
            }
            Some(Err(err)) => {
                LOGGER.error(format!("Error initializing Firebase: {err}"));
                return Err(err);
            }
            None => {}
        }

        let _pending = PendingInitialization { state: &self.state };
        match self.bootstrap(country).await {
            Ok(()) => {
                LOGGER.info(format!("Firebase initialized successfully for {country}"));
                Ok(())
            }
            Err(err) => {
                LOGGER.error(format!("Error initializing Firebase: {err}"));
                Err(err)
            }
        }
    }

    async fn bootstrap(&self, country: Country) -> GatewayResult<()> {
        let credentials = self
            .registry
            .resolve_platform_config(country, self.registry.platform())?;
        let handle = self.sdk.initialize_app(&credentials).await?;
        *self.state.lock().unwrap() = GatewayState::Ready { country, handle };
        self.registry.set_country(country);
        Ok(())
    }

    pub async fn log_event(&self, name: &str, params: EventParams) -> GatewayResult<()> {
        let (country, handle) = self.ready_handle()?;
        match handle.log_event(name, &params).await {
            Ok(()) => {
                LOGGER.info(format!("Event logged: {name} for country: {country}"));
                Ok(())
            }
            Err(err) => {
                LOGGER.error(format!("Error logging event: {err}"));
                Err(GatewayError::Sdk(err))
            }
        }
    }

    pub async fn set_user_property(&self, key: &str, value: &str) -> GatewayResult<()> {
        let (_, handle) = self.ready_handle()?;
        handle.set_user_property(key, value).await.map_err(|err| {
            LOGGER.error(format!("Error setting user property: {err}"));
            GatewayError::Sdk(err)
        })
    }

    pub async fn set_user_id(&self, id: &str) -> GatewayResult<()> {
        let (_, handle) = self.ready_handle()?;
        handle.set_user_id(id).await.map_err(|err| {
            LOGGER.error(format!("Error setting user ID: {err}"));
            GatewayError::Sdk(err)
        })
    }

    pub async fn set_analytics_collection_enabled(&self, enabled: bool) -> GatewayResult<()> {
        let (_, handle) = self.ready_handle()?;
        handle
            .set_analytics_collection_enabled(enabled)
            .await
            .map_err(|err| {
                LOGGER.error(format!("Error toggling analytics collection: {err}"));
                GatewayError::Sdk(err)
            })
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock().unwrap(), GatewayState::Ready { .. })
    }

    pub fn active_country(&self) -> Option<Country> {
        match &*self.state.lock().unwrap() {
            GatewayState::Ready { country, .. } => Some(*country),
            _ => None,
        }
    }

    pub fn status(&self) -> GatewayStatus {
        match &*self.state.lock().unwrap() {
            GatewayState::Uninitialized => GatewayStatus::Uninitialized,
            GatewayState::Initializing { country } => GatewayStatus::Initializing(*country),
            GatewayState::Ready { country, .. } => GatewayStatus::Ready(*country),
        }
    }

    fn ready_handle(&self) -> GatewayResult<(Country, Arc<dyn AnalyticsHandle>)> {
        match &*self.state.lock().unwrap() {
            GatewayState::Ready { country, handle } => Ok((*country, Arc::clone(handle))),
            _ => Err(GatewayError::NotInitialized),
        }
    }
}

impl fmt::Debug for AnalyticsGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsGateway")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use crate::gateway::memory::{AnalyticsEvent, InMemorySdk};
    use crate::gateway::sdk::SdkError;
    use crate::logger::{self, LogCallbackParams};
    use crate::test_support::GatedSdk;
    use futures::FutureExt;
    use serde_json::json;

    fn gateway_with(sdk: Arc<dyn AnalyticsSdk>) -> AnalyticsGateway {
        let registry = ConfigRegistry::new().with_platform(Platform::Android);
        AnalyticsGateway::new(Arc::new(registry), sdk)
    }

    fn in_memory_gateway() -> (AnalyticsGateway, InMemorySdk) {
        let sdk = InMemorySdk::new();
        (gateway_with(Arc::new(sdk.clone())), sdk)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn starts_uninitialized() {
        let (gateway, sdk) = in_memory_gateway();
        assert!(!gateway.is_ready());
        assert_eq!(gateway.active_country(), None);
        assert_eq!(gateway.status(), GatewayStatus::Uninitialized);
        assert_eq!(sdk.bootstrap_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn initialize_uses_country_credentials_for_platform() {
        let (gateway, sdk) = in_memory_gateway();
        gateway.initialize(Country::India).await.unwrap();

        assert!(gateway.is_ready());
        assert_eq!(gateway.active_country(), Some(Country::India));
        assert_eq!(gateway.registry().current_country(), Country::India);
        let used = sdk.bootstrapped_credentials();
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].app_id, "1:541877482123:android:235b8cd0c423c432c35a8e");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn initialize_same_country_twice_is_idempotent() {
        let (gateway, sdk) = in_memory_gateway();
        gateway.initialize(Country::Us).await.unwrap();
        gateway.initialize(Country::Us).await.unwrap();

        assert_eq!(gateway.active_country(), Some(Country::Us));
        assert_eq!(sdk.bootstrap_count(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn switching_country_after_ready_is_rejected() {
        let (gateway, sdk) = in_memory_gateway();
        gateway.initialize(Country::India).await.unwrap();

        let err = gateway.initialize(Country::Uk).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::AlreadyInitialized {
                active: Country::India,
                requested: Country::Uk,
            }
        );
        assert_eq!(err.code_str(), "gateway/already-initialized");
        assert_eq!(gateway.active_country(), Some(Country::India));
        assert_eq!(sdk.bootstrap_count(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unknown_country_fails_without_bootstrap() {
        let sdk = InMemorySdk::new();
        let registry = ConfigRegistry::from_entries(
            Country::India,
            ConfigRegistry::new()
                .all_country_configs()
                .into_iter()
                .filter(|(country, _)| *country == Country::India),
        )
        .unwrap();
        let gateway = AnalyticsGateway::new(Arc::new(registry), Arc::new(sdk.clone()));

        let err = gateway.initialize(Country::Us).await.unwrap_err();
        assert_eq!(err.code_str(), "gateway/not-found");
        assert_eq!(gateway.status(), GatewayStatus::Uninitialized);
        assert_eq!(sdk.bootstrap_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_bootstrap_reverts_and_allows_retry() {
        let (gateway, sdk) = in_memory_gateway();
        let sdk_error = SdkError::new("app/invalid-api-key", "API key not valid");
        sdk.fail_next_bootstrap(sdk_error.clone());

        let err = gateway.initialize(Country::India).await.unwrap_err();
        assert_eq!(err, GatewayError::Sdk(sdk_error));
        assert_eq!(gateway.status(), GatewayStatus::Uninitialized);
        assert_eq!(gateway.registry().current_country(), Country::India);

        gateway.initialize(Country::Uk).await.unwrap();
        assert_eq!(gateway.active_country(), Some(Country::Uk));
        assert_eq!(sdk.bootstrap_count(), 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn operations_require_ready_gateway() {
        let (gateway, _sdk) = in_memory_gateway();

        let err = gateway
            .log_event("test_button_click", EventParams::new())
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::NotInitialized);
        assert_eq!(
            gateway.set_user_property("tier", "gold").await.unwrap_err(),
            GatewayError::NotInitialized
        );
        assert_eq!(
            gateway.set_user_id("user-1").await.unwrap_err(),
            GatewayError::NotInitialized
        );
        assert_eq!(
            gateway
                .set_analytics_collection_enabled(true)
                .await
                .unwrap_err(),
            GatewayError::NotInitialized
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn log_event_forwards_params_unchanged() {
        let (gateway, sdk) = in_memory_gateway();
        gateway.initialize(Country::India).await.unwrap();

        let params = EventParams::from([
            ("button_id".to_string(), json!("main_test_button")),
            ("click_count".to_string(), json!(1)),
        ]);
        gateway
            .log_event("test_button_click", params.clone())
            .await
            .unwrap();

        let handle = sdk.last_handle().unwrap();
        assert_eq!(
            handle.recorded_events(),
            vec![AnalyticsEvent {
                name: "test_button_click".into(),
                params,
            }]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn user_attributes_are_forwarded() {
        let (gateway, sdk) = in_memory_gateway();
        gateway.initialize(Country::India).await.unwrap();
        gateway.set_user_property("plan", "free").await.unwrap();
        gateway.set_user_id("user-7").await.unwrap();
        gateway.set_analytics_collection_enabled(false).await.unwrap();

        let handle = sdk.last_handle().unwrap();
        assert_eq!(handle.user_properties().get("plan").map(String::as_str), Some("free"));
        assert_eq!(handle.user_id().as_deref(), Some("user-7"));
        assert!(!handle.collection_enabled());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sdk_errors_surface_unchanged() {
        let (gateway, sdk) = in_memory_gateway();
        gateway.initialize(Country::India).await.unwrap();

        let sdk_error = SdkError::new("analytics/network", "offline");
        sdk.fail_next_call(sdk_error.clone());
        let err = gateway
            .log_event("test_button_click", EventParams::new())
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Sdk(sdk_error));
        assert!(gateway.is_ready());
        assert!(sdk.last_handle().unwrap().recorded_events().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_initialize_bootstraps_once() {
        let sdk = GatedSdk::new();
        let gateway = gateway_with(Arc::new(sdk.clone()));

        let first = gateway.initialize(Country::India);
        let second = async {
            let result = gateway.initialize(Country::India).await;
            sdk.release();
            result
        };
        let (first, second) = futures::join!(first, second);

        first.unwrap();
        assert_eq!(
            second.unwrap_err(),
            GatewayError::InitializationInProgress {
                country: Country::India
            }
        );
        assert_eq!(sdk.attempts(), 1);
        assert_eq!(gateway.active_country(), Some(Country::India));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn dropping_pending_initialize_reverts_state() {
        let sdk = GatedSdk::new();
        let gateway = gateway_with(Arc::new(sdk.clone()));

        let mut pending = Box::pin(gateway.initialize(Country::Uk));
        assert!((&mut pending).now_or_never().is_none());
        assert_eq!(gateway.status(), GatewayStatus::Initializing(Country::Uk));

        drop(pending);
        assert_eq!(gateway.status(), GatewayStatus::Uninitialized);

        sdk.release();
        gateway.initialize(Country::Uk).await.unwrap();
        assert_eq!(sdk.attempts(), 2);
        assert!(gateway.is_ready());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn log_callbacks_can_read_gateway_state() {
        let _guard = logger::TEST_GUARD.lock().unwrap();
        let gateway = Arc::new(gateway_with(Arc::new(InMemorySdk::new())));

        let observed = Arc::new(Mutex::new(Vec::new()));
        let observed_cb = Arc::clone(&observed);
        let weak_gateway = Arc::downgrade(&gateway);
        logger::set_user_log_handler(
            Some(Arc::new(move |params: LogCallbackParams| {
                if params.logger_type != LOGGER.name() {
                    return;
                }
                if let Some(gateway) = weak_gateway.upgrade() {
                    observed_cb.lock().unwrap().push(gateway.status());
                }
            })),
            None,
        );

        gateway.initialize(Country::India).await.unwrap();
        gateway.initialize(Country::India).await.unwrap();
        let err = gateway.initialize(Country::Uk).await.unwrap_err();
        logger::set_user_log_handler(None, None);

        assert_eq!(
            err,
            GatewayError::AlreadyInitialized {
                active: Country::India,
                requested: Country::Uk,
            }
        );
        assert_eq!(
            observed.lock().unwrap().as_slice(),
            &[GatewayStatus::Ready(Country::India); 3]
        );
    }
}
