use std::fmt;
use std::sync::Mutex;

use crate::config::defaults::{builtin_countries, DEFAULT_COUNTRY};
use crate::config::error::{invalid_config, not_found, ConfigResult};
use crate::config::logger::LOGGER;
use crate::config::types::{Country, CredentialBundle, Platform, PlatformCredentials};

/// Country → per-platform credential table plus the currently selected country.
pub struct ConfigRegistry {
    default_country: Country,
    platform: Platform,
    state: Mutex<RegistryState>,
}

struct RegistryState {
    countries: Vec<(Country, PlatformCredentials)>,
    current: Option<Country>,
}

impl RegistryState {
    fn find(&self, country: Country) -> Option<&PlatformCredentials> {
        self.countries
            .iter()
            .find(|(key, _)| *key == country)
            .map(|(_, creds)| creds)
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRegistry {
    /// Registry backed by the built-in table with `INDIA` as the default country.
    pub fn new() -> Self {
        Self::build(DEFAULT_COUNTRY, builtin_countries())
    }

    /// Registry backed by a custom table. The default country must be part of `entries`.
    ///
    /// Later duplicates of a country replace earlier ones but keep the first position.
    pub fn from_entries<I>(default_country: Country, entries: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (Country, PlatformCredentials)>,
    {
        let mut countries: Vec<(Country, PlatformCredentials)> = Vec::new();
        for (country, creds) in entries {
            match countries.iter_mut().find(|(key, _)| *key == country) {
                Some(slot) => slot.1 = creds,
                None => countries.push((country, creds)),
            }
        }
        if !countries.iter().any(|(key, _)| *key == default_country) {
            return Err(invalid_config(format!(
                "Default country {default_country} has no credentials in the registry"
            )));
        }
        Ok(Self::build(default_country, countries))
    }

    fn build(default_country: Country, countries: Vec<(Country, PlatformCredentials)>) -> Self {
        Self {
            default_country,
            platform: Platform::current(),
            state: Mutex::new(RegistryState {
                countries,
                current: None,
            }),
        }
    }

    /// Overrides the platform used by [`resolve_current_platform_config`](Self::resolve_current_platform_config).
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn default_country(&self) -> Country {
        self.default_country
    }

    /// Records `country` as the current selection. Whether the country has credentials is only
    /// checked when a config is resolved.
    pub fn set_country(&self, country: Country) {
        self.state.lock().unwrap().current = Some(country);
        LOGGER.info(format!("Firebase country set to: {country}"));
    }

    pub fn current_country(&self) -> Country {
        self.state
            .lock()
            .unwrap()
            .current
            .unwrap_or(self.default_country)
    }

    pub fn resolve_platform_config(
        &self,
        country: Country,
        platform: Platform,
    ) -> ConfigResult<CredentialBundle> {
        let state = self.state.lock().unwrap();
        let creds = state
            .find(country)
            .ok_or_else(|| not_found(format!("No Firebase configuration for country {country}")))?;
        creds.get(platform).cloned().ok_or_else(|| {
            not_found(format!(
                "No Firebase configuration for platform {platform} in country {country}"
            ))
        })
    }

    pub fn resolve_current_platform_config(&self) -> ConfigResult<CredentialBundle> {
        self.resolve_platform_config(self.current_country(), self.platform)
    }

    pub fn country_config(&self, country: Country) -> ConfigResult<PlatformCredentials> {
        self.state
            .lock()
            .unwrap()
            .find(country)
            .cloned()
            .ok_or_else(|| not_found(format!("No Firebase configuration for country {country}")))
    }

    pub fn all_country_configs(&self) -> Vec<(Country, PlatformCredentials)> {
        self.state.lock().unwrap().countries.clone()
    }

    /// Countries in table order, suitable for a country picker.
    pub fn list_countries(&self) -> Vec<Country> {
        self.state
            .lock()
            .unwrap()
            .countries
            .iter()
            .map(|(country, _)| *country)
            .collect()
    }

    /// Replaces the whole bundle set of `country`, appending it when absent.
    pub fn upsert_country(&self, country: Country, credentials: PlatformCredentials) {
        let mut state = self.state.lock().unwrap();
        match state.countries.iter_mut().find(|(key, _)| *key == country) {
            Some(slot) => slot.1 = credentials,
            None => state.countries.push((country, credentials)),
        }
        drop(state);
        LOGGER.info(format!("Configuration updated for country: {country}"));
    }
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("default_country", &self.default_country)
            .field("platform", &self.platform)
            .field("countries", &self.list_countries())
            .finish()
    }
}
