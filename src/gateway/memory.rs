use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::CredentialBundle;
use crate::gateway::sdk::{AnalyticsHandle, AnalyticsSdk, EventParams, SdkError, SdkResult};

#[derive(Clone, Debug, PartialEq)]
pub struct AnalyticsEvent {
    pub name: String,
    pub params: EventParams,
}

/// SDK stand-in that keeps every forwarded call in memory.
///
/// Failures can be scripted with [`fail_next_bootstrap`](Self::fail_next_bootstrap) and
/// [`fail_next_call`](Self::fail_next_call); each scripted error is consumed by one call.
#[derive(Clone, Default)]
pub struct InMemorySdk {
    inner: Arc<InMemorySdkInner>,
}

#[derive(Default)]
struct InMemorySdkInner {
    bootstraps: Mutex<Vec<CredentialBundle>>,
    handles: Mutex<Vec<Arc<InMemoryHandle>>>,
    next_bootstrap_failure: Mutex<Option<SdkError>>,
    next_call_failure: Arc<Mutex<Option<SdkError>>>,
}

impl InMemorySdk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bootstrap_count(&self) -> usize {
        self.inner.bootstraps.lock().unwrap().len()
    }

    /// Credentials of every bootstrap attempt, failed ones included.
    pub fn bootstrapped_credentials(&self) -> Vec<CredentialBundle> {
        self.inner.bootstraps.lock().unwrap().clone()
    }

    pub fn last_handle(&self) -> Option<Arc<InMemoryHandle>> {
        self.inner.handles.lock().unwrap().last().cloned()
    }

    pub fn fail_next_bootstrap(&self, error: SdkError) {
        *self.inner.next_bootstrap_failure.lock().unwrap() = Some(error);
    }

    /// Makes the next forwarded call on any handle of this SDK fail with `error`.
    pub fn fail_next_call(&self, error: SdkError) {
        *self.inner.next_call_failure.lock().unwrap() = Some(error);
    }
}

impl fmt::Debug for InMemorySdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySdk")
            .field("bootstrap_count", &self.bootstrap_count())
            .finish()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl AnalyticsSdk for InMemorySdk {
    async fn initialize_app(
        &self,
        credentials: &CredentialBundle,
    ) -> SdkResult<Arc<dyn AnalyticsHandle>> {
        self.inner
            .bootstraps
            .lock()
            .unwrap()
            .push(credentials.clone());

        if let Some(error) = self.inner.next_bootstrap_failure.lock().unwrap().take() {
            return Err(error);
        }

        let handle = Arc::new(InMemoryHandle::new(
            credentials.clone(),
            Arc::clone(&self.inner.next_call_failure),
        ));
        self.inner.handles.lock().unwrap().push(Arc::clone(&handle));
        Ok(handle)
    }
}

pub struct InMemoryHandle {
    credentials: CredentialBundle,
    app_instance_id: String,
    events: Mutex<Vec<AnalyticsEvent>>,
    user_properties: Mutex<BTreeMap<String, String>>,
    user_id: Mutex<Option<String>>,
    collection_enabled: AtomicBool,
    next_call_failure: Arc<Mutex<Option<SdkError>>>,
}

impl InMemoryHandle {
    fn new(credentials: CredentialBundle, next_call_failure: Arc<Mutex<Option<SdkError>>>) -> Self {
        Self {
            credentials,
            app_instance_id: generate_app_instance_id(),
            events: Mutex::new(Vec::new()),
            user_properties: Mutex::new(BTreeMap::new()),
            user_id: Mutex::new(None),
            collection_enabled: AtomicBool::new(true),
            next_call_failure,
        }
    }

    pub fn credentials(&self) -> &CredentialBundle {
        &self.credentials
    }

    pub fn app_instance_id(&self) -> &str {
        &self.app_instance_id
    }

    pub fn recorded_events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn user_properties(&self) -> BTreeMap<String, String> {
        self.user_properties.lock().unwrap().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.lock().unwrap().clone()
    }

    pub fn collection_enabled(&self) -> bool {
        self.collection_enabled.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> SdkResult<()> {
        match self.next_call_failure.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for InMemoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryHandle")
            .field("app_id", &self.credentials.app_id)
            .field("app_instance_id", &self.app_instance_id)
            .finish()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl AnalyticsHandle for InMemoryHandle {
    async fn log_event(&self, name: &str, params: &EventParams) -> SdkResult<()> {
        self.take_failure()?;
        self.events.lock().unwrap().push(AnalyticsEvent {
            name: name.to_string(),
            params: params.clone(),
        });
        Ok(())
    }

    async fn set_user_property(&self, key: &str, value: &str) -> SdkResult<()> {
        self.take_failure()?;
        self.user_properties
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_user_id(&self, id: &str) -> SdkResult<()> {
        self.take_failure()?;
        *self.user_id.lock().unwrap() = Some(id.to_string());
        Ok(())
    }

    async fn set_analytics_collection_enabled(&self, enabled: bool) -> SdkResult<()> {
        self.take_failure()?;
        self.collection_enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

fn generate_app_instance_id() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(32)
        .collect()
}
