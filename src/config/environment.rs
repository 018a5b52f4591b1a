//! Loading the credential table from the process environment.
//!
//! `FIREBASE_COUNTRY_CONFIGS` holds the JSON document inline; `FIREBASE_COUNTRY_CONFIGS_PATH`
//! names a file containing it. The inline variable wins when both are set.

use std::env;
use std::fs;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::defaults::DEFAULT_COUNTRY;
use crate::config::error::{invalid_config, ConfigResult};
use crate::config::logger::LOGGER;
use crate::config::registry::ConfigRegistry;
use crate::config::types::{Country, PlatformCredentials};

pub const CONFIGS_ENV: &str = "FIREBASE_COUNTRY_CONFIGS";
pub const CONFIGS_PATH_ENV: &str = "FIREBASE_COUNTRY_CONFIGS_PATH";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryDocument {
    #[serde(default)]
    default_country: Option<String>,
    countries: Map<String, Value>,
}

impl ConfigRegistry {
    /// Parses a registry document:
    ///
    /// ```json
    /// {
    ///   "defaultCountry": "INDIA",
    ///   "countries": {
    ///     "INDIA": { "ios": { "apiKey": "..." }, "android": { "apiKey": "..." } }
    ///   }
    /// }
    /// ```
    ///
    /// `defaultCountry` falls back to `INDIA`. Country order in the document becomes the
    /// registry order.
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let document: RegistryDocument = serde_json::from_str(raw)
            .map_err(|err| invalid_config(format!("Malformed country configuration: {err}")))?;

        let default_country = match document.default_country.as_deref() {
            Some(name) => name.parse::<Country>()?,
            None => DEFAULT_COUNTRY,
        };

        let mut entries = Vec::with_capacity(document.countries.len());
        for (key, value) in document.countries {
            let country = key.parse::<Country>()?;
            let credentials: PlatformCredentials = serde_json::from_value(value).map_err(|err| {
                invalid_config(format!("Invalid credentials for country {country}: {err}"))
            })?;
            entries.push((country, credentials));
        }

        Self::from_entries(default_country, entries)
    }

    /// Builds the registry from the environment, or from the built-in table when neither
    /// variable is set.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_sources(env::var(CONFIGS_ENV).ok(), env::var(CONFIGS_PATH_ENV).ok())
    }

    fn from_sources(inline: Option<String>, path: Option<String>) -> ConfigResult<Self> {
        if let Some(raw) = inline.filter(|raw| !raw.trim().is_empty()) {
            LOGGER.debug(format!("Loading country configuration from {CONFIGS_ENV}"));
            return Self::from_json(&raw);
        }

        if let Some(path) = path.filter(|path| !path.trim().is_empty()) {
            LOGGER.debug(format!("Loading country configuration from {path}"));
            let raw = fs::read_to_string(&path).map_err(|err| {
                invalid_config(format!("Unable to read country configuration {path}: {err}"))
            })?;
            return Self::from_json(&raw);
        }

        Ok(Self::new())
    }
}
