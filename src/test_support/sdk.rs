use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::config::CredentialBundle;
use crate::gateway::{
    AnalyticsEvent, AnalyticsHandle, AnalyticsSdk, EventParams, InMemorySdk, SdkResult,
};

/// SDK whose bootstrap stays pending until [`GatedSdk::release`] is called, so tests can observe
/// the gateway while an initialization is in flight.
#[derive(Clone)]
pub struct GatedSdk {
    inner: InMemorySdk,
    gate: Arc<Semaphore>,
    attempts: Arc<AtomicUsize>,
}

impl GatedSdk {
    pub fn new() -> Self {
        Self {
            inner: InMemorySdk::new(),
            gate: Arc::new(Semaphore::new(0)),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Lets one pending or future bootstrap through.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Bootstrap calls received, including those still waiting at the gate.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticsSdk for GatedSdk {
    async fn initialize_app(
        &self,
        credentials: &CredentialBundle,
    ) -> SdkResult<Arc<dyn AnalyticsHandle>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await.expect("gate semaphore closed");
        permit.forget();
        self.inner.initialize_app(credentials).await
    }
}

/// SDK whose handles yield to the executor before every call, so calls issued together
/// interleave at their await points.
#[derive(Clone, Default)]
pub struct YieldingSdk {
    inner: InMemorySdk,
}

impl YieldingSdk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_events(&self) -> Vec<AnalyticsEvent> {
        self.inner
            .last_handle()
            .map(|handle| handle.recorded_events())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnalyticsSdk for YieldingSdk {
    async fn initialize_app(
        &self,
        credentials: &CredentialBundle,
    ) -> SdkResult<Arc<dyn AnalyticsHandle>> {
        let inner = self.inner.initialize_app(credentials).await?;
        Ok(Arc::new(YieldingHandle { inner }))
    }
}

struct YieldingHandle {
    inner: Arc<dyn AnalyticsHandle>,
}

#[async_trait]
impl AnalyticsHandle for YieldingHandle {
    async fn log_event(&self, name: &str, params: &EventParams) -> SdkResult<()> {
        tokio::task::yield_now().await;
        self.inner.log_event(name, params).await
    }

    async fn set_user_property(&self, key: &str, value: &str) -> SdkResult<()> {
        tokio::task::yield_now().await;
        self.inner.set_user_property(key, value).await
    }

    async fn set_user_id(&self, id: &str) -> SdkResult<()> {
        tokio::task::yield_now().await;
        self.inner.set_user_id(id).await
    }

    async fn set_analytics_collection_enabled(&self, enabled: bool) -> SdkResult<()> {
        tokio::task::yield_now().await;
        self.inner.set_analytics_collection_enabled(enabled).await
    }
}
