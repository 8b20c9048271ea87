//! License data models and API request/response types.
//!
//! This module defines:
//! - `License`: the persisted license record
//! - `LicenseSettings`: the fields an upsert replaces
//! - `UpsertLicenseRequest`: request body for `POST /api/license`
//! - `LicenseView`: one entry of the `GET /api/licenses` response

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Daily limit given to licenses created without an explicit one.
pub const DEFAULT_DAILY_LIMIT: i64 = 50;

/// Whether a license is subject to the daily quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    Limited,
    Unlimited,
}

impl LicenseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseType::Limited => "limited",
            LicenseType::Unlimited => "unlimited",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names neither license type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown license type: {0}")]
pub struct UnknownLicenseType(pub String);

impl FromStr for LicenseType {
    type Err = UnknownLicenseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "limited" => Ok(LicenseType::Limited),
            "unlimited" => Ok(LicenseType::Unlimited),
            other => Err(UnknownLicenseType(other.to_string())),
        }
    }
}

/// Requests consumed by a license on one calendar day.
///
/// `date` is a Solar Hijri day key (`YYYY-MM-DD`). It is absent until the
/// license serves its first limited request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub count: i64,
}

/// A license record.
///
/// # Invariants
///
/// - `key` is unique across the store and never changes
/// - `usage` is only touched by the quota accountant, never by upserts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub key: String,
    pub license_type: LicenseType,

    /// Disabled licenses are rejected regardless of type.
    pub enabled: bool,

    /// Only meaningful for `LicenseType::Limited`.
    pub daily_limit: i64,

    pub usage: Usage,
}

impl License {
    /// A fresh record as created by the first upsert of `key`.
    pub fn new(key: impl Into<String>, settings: LicenseSettings) -> Self {
        Self {
            key: key.into(),
            license_type: settings.license_type,
            enabled: settings.enabled,
            daily_limit: settings.daily_limit,
            usage: Usage::default(),
        }
    }

    /// Overwrite the administrable fields, leaving usage alone.
    pub fn apply(&mut self, settings: LicenseSettings) {
        self.license_type = settings.license_type;
        self.enabled = settings.enabled;
        self.daily_limit = settings.daily_limit;
    }
}

/// The fields replaced by an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicenseSettings {
    pub license_type: LicenseType,
    pub enabled: bool,
    pub daily_limit: i64,
}

/// Request body for creating or updating a license.
///
/// # JSON Example
///
/// ```json
/// {
///   "key": "abc123",
///   "type": "limited",
///   "enabled": true,
///   "dailyLimit": 100
/// }
/// ```
///
/// `type` is kept as a raw string so an unknown value can be answered with
/// the same 400 as a missing key.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertLicenseRequest {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default, rename = "type")]
    pub license_type: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_daily_limit")]
    pub daily_limit: i64,
}

fn default_enabled() -> bool {
    true
}

fn default_daily_limit() -> i64 {
    DEFAULT_DAILY_LIMIT
}

impl UpsertLicenseRequest {
    /// Split into the key and the settings to store, or `None` when the key
    /// is empty or the type is not one of the two known values.
    pub fn validate(self) -> Option<(String, LicenseSettings)> {
        let key = self.key.filter(|key| !key.is_empty())?;
        let license_type = self.license_type?.parse().ok()?;

        Some((
            key,
            LicenseSettings {
                license_type,
                enabled: self.enabled,
                daily_limit: self.daily_limit,
            },
        ))
    }
}

/// One entry of the license listing, keyed by license key in the response.
///
/// ```json
/// {
///   "type": "limited",
///   "enabled": true,
///   "dailyLimit": 50,
///   "usage": { "date": "1403-07-01", "count": 3 }
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseView {
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    pub enabled: bool,
    pub daily_limit: i64,
    pub usage: Usage,
}

impl From<License> for LicenseView {
    fn from(license: License) -> Self {
        Self {
            license_type: license.license_type,
            enabled: license.enabled,
            daily_limit: license.daily_limit,
            usage: license.usage,
        }
    }
}
