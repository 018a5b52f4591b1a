use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::error::{invalid_config, ConfigError};

/// Configuration partition key selecting which backend project the app talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Country {
    #[default]
    #[serde(rename = "INDIA")]
    India,
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "UK")]
    Uk,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::India, Country::Us, Country::Uk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Country::India => "INDIA",
            Country::Us => "US",
            Country::Uk => "UK",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Country {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Country::ALL
            .into_iter()
            .find(|country| country.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| invalid_config(format!("Unknown country '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Platform tag of the running binary. Anything that is not an iOS target resolves to
    /// android credentials.
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Android
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers needed to address one Firebase project from one platform.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBundle {
    pub api_key: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    #[serde(rename = "databaseURL", default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

/// Credential bundles of a single country, keyed by platform.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformCredentials {
    bundles: BTreeMap<Platform, CredentialBundle>,
}

impl PlatformCredentials {
    pub fn new(ios: CredentialBundle, android: CredentialBundle) -> Self {
        Self::default()
            .with_platform(Platform::Ios, ios)
            .with_platform(Platform::Android, android)
    }

    pub fn with_platform(mut self, platform: Platform, bundle: CredentialBundle) -> Self {
        self.bundles.insert(platform, bundle);
        self
    }

    pub fn get(&self, platform: Platform) -> Option<&CredentialBundle> {
        self.bundles.get(&platform)
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.bundles.keys().copied()
    }
}
