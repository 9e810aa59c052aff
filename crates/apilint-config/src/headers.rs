//! HTTP header injection rules
//!
//! Registry requests get an `Authorization` header when the caller hands in
//! a valid token for a region. Without one nothing is injected; that is never
//! an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// Header every registry rule sets
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Registry region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
        }
    }

    /// URL patterns of the registry endpoints serving this region
    ///
    /// `us` still answers on the historical domain as well.
    pub fn registry_patterns(self) -> &'static [&'static str] {
        match self {
            Region::Us => &[
                "https://api.apilint.dev/registry/**",
                "https://api.apilint.io/registry/**",
            ],
            Region::Eu => &["https://api.eu.apilint.dev/registry/**"],
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            other => Err(format!("Unsupported region '{other}' (expected \"us\" or \"eu\")")),
        }
    }
}

/// Authentication context supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    pub region: Region,
    pub token: String,
    /// `None` means the token does not expire
    pub expires_at: Option<SystemTime>,
}

impl RegistryAuth {
    pub fn new(region: Region, token: impl Into<String>) -> Self {
        Self {
            region,
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        !self.token.is_empty() && self.expires_at.is_none_or(|expiry| expiry > now)
    }
}

/// One header injection rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRule {
    /// URL glob the rule applies to
    pub matches: String,
    /// Header name
    pub name: String,
    /// Environment variable to read the value from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Maps a region and token to registry header rules
pub struct RegionHeaderResolver;

impl RegionHeaderResolver {
    /// Header rules for `auth`, checked against the current time
    pub fn resolve(auth: Option<&RegistryAuth>) -> Vec<HeaderRule> {
        Self::resolve_at(auth, SystemTime::now())
    }

    pub fn resolve_at(auth: Option<&RegistryAuth>, now: SystemTime) -> Vec<HeaderRule> {
        let Some(auth) = auth.filter(|auth| auth.is_valid_at(now)) else {
            return Vec::new();
        };

        auth.region
            .registry_patterns()
            .iter()
            .map(|pattern| HeaderRule {
                matches: pattern.to_string(),
                name: AUTHORIZATION_HEADER.to_string(),
                env_variable: None,
                value: Some(auth.token.clone()),
            })
            .collect()
    }

    /// Header rules declared in a document under `resolve.http.headers`;
    /// malformed entries are skipped
    pub fn declared(document: &Value) -> Vec<HeaderRule> {
        document
            .pointer("/resolve/http/headers")
            .and_then(Value::as_array)
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|header| serde_json::from_value(header.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
