//! Picks a country, initializes analytics against the in-memory SDK and presses the test button
//! a few times. Set `FIREBASE_COUNTRY_CONFIGS` or `FIREBASE_COUNTRY_CONFIGS_PATH` to use your
//! own credential table, and pass a country name (`INDIA`, `US`, `UK`) as the first argument.

use std::sync::Arc;

use firebase_country_sdk::config::{ConfigRegistry, Country};
use firebase_country_sdk::gateway::{AnalyticsGateway, ButtonClickTracker, InMemorySdk};
use firebase_country_sdk::logger::set_log_level;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    set_log_level("debug")?;

    let registry = Arc::new(ConfigRegistry::from_env()?);
    println!(
        "Available countries: {}",
        registry
            .list_countries()
            .iter()
            .map(Country::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let country = match std::env::args().nth(1) {
        Some(raw) => raw.parse::<Country>()?,
        None => registry.current_country(),
    };

    let sdk = InMemorySdk::new();
    let gateway = AnalyticsGateway::new(Arc::clone(&registry), Arc::new(sdk.clone()));
    gateway.initialize(country).await?;
    gateway.set_analytics_collection_enabled(true).await?;

    let tracker = ButtonClickTracker::default();
    for _ in 0..3 {
        let total = tracker.fire(&gateway).await?;
        println!("Firebase event logged successfully! Total events: {total}");
    }

    if let Some(handle) = sdk.last_handle() {
        for event in handle.recorded_events() {
            println!("Recorded event: {} {:?}", event.name, event.params);
        }
    }

    Ok(())
}
