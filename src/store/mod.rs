//! License persistence.
//!
//! Handlers and the license gate only see the [`LicenseStore`] trait. Two
//! implementations exist: [`PgLicenseStore`] for deployments and
//! [`MemoryLicenseStore`] for local runs without a database and for tests.

mod memory;
mod postgres;

pub use memory::MemoryLicenseStore;
pub use postgres::PgLicenseStore;

use async_trait::async_trait;

use crate::models::license::{License, LicenseSettings};

/// Errors raised by a license store. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database could not be reached or the query failed.
    #[error("license store unavailable: {0}")]
    Unavailable(String),

    /// A stored row cannot be turned into a `License`.
    #[error("stored license {key} is corrupt: {reason}")]
    CorruptRecord { key: String, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[async_trait]
pub trait LicenseStore: Send + Sync + 'static {
    async fn find_by_key(&self, key: &str) -> Result<Option<License>, StoreError>;

    /// Create `key` with `settings`, or replace the settings of an existing
    /// record. Usage is never modified.
    async fn upsert(&self, key: &str, settings: LicenseSettings) -> Result<License, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_by_key(&self, key: &str) -> Result<bool, StoreError>;

    async fn list_all(&self) -> Result<Vec<License>, StoreError>;

    /// Persist the usage counter of `license`, as mutated by the quota
    /// accountant. Other fields are left as stored.
    async fn save(&self, license: &License) -> Result<(), StoreError>;

    /// Cheap connectivity check for health probes.
    async fn ping(&self) -> Result<(), StoreError>;
}
