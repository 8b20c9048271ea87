use async_trait::async_trait;

use super::{LicenseStore, StoreError};
use crate::db::DbPool;
use crate::models::license::{License, LicenseSettings, LicenseType, UnknownLicenseType, Usage};

/// Row of the `licenses` table.
///
/// # Database Table
///
/// - `key`: license key, primary key
/// - `license_type`: `limited` or `unlimited` (CHECK constraint)
/// - `enabled`, `daily_limit`: administrable settings
/// - `usage_date`, `usage_count`: quota counter for one Solar Hijri day
#[derive(Debug, sqlx::FromRow)]
struct LicenseRow {
    key: String,
    license_type: String,
    enabled: bool,
    daily_limit: i64,
    usage_date: Option<String>,
    usage_count: i64,
}

impl TryFrom<LicenseRow> for License {
    type Error = StoreError;

    fn try_from(row: LicenseRow) -> Result<Self, Self::Error> {
        let license_type = row
            .license_type
            .parse::<LicenseType>()
            .map_err(|err: UnknownLicenseType| StoreError::CorruptRecord {
                key: row.key.clone(),
                reason: err.to_string(),
            })?;

        Ok(License {
            key: row.key,
            license_type,
            enabled: row.enabled,
            daily_limit: row.daily_limit,
            usage: Usage {
                date: row.usage_date,
                count: row.usage_count,
            },
        })
    }
}

/// License store backed by the PostgreSQL `licenses` table.
#[derive(Debug, Clone)]
pub struct PgLicenseStore {
    pool: DbPool,
}

impl PgLicenseStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LicenseStore for PgLicenseStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<License>, StoreError> {
        let row = sqlx::query_as::<_, LicenseRow>(
            "SELECT key, license_type, enabled, daily_limit, usage_date, usage_count
             FROM licenses
             WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(License::try_from).transpose()
    }

    async fn upsert(&self, key: &str, settings: LicenseSettings) -> Result<License, StoreError> {
        // ON CONFLICT only touches the settings so the usage counter survives
        let row = sqlx::query_as::<_, LicenseRow>(
            r#"
            INSERT INTO licenses (key, license_type, enabled, daily_limit)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET license_type = EXCLUDED.license_type,
                enabled = EXCLUDED.enabled,
                daily_limit = EXCLUDED.daily_limit
            RETURNING key, license_type, enabled, daily_limit, usage_date, usage_count
            "#,
        )
        .bind(key)
        .bind(settings.license_type.as_str())
        .bind(settings.enabled)
        .bind(settings.daily_limit)
        .fetch_one(&self.pool)
        .await?;

        License::try_from(row)
    }

    async fn delete_by_key(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM licenses WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<License>, StoreError> {
        let rows = sqlx::query_as::<_, LicenseRow>(
            "SELECT key, license_type, enabled, daily_limit, usage_date, usage_count
             FROM licenses
             ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(License::try_from).collect()
    }

    async fn save(&self, license: &License) -> Result<(), StoreError> {
        sqlx::query("UPDATE licenses SET usage_date = $2, usage_count = $3 WHERE key = $1")
            .bind(&license.key)
            .bind(license.usage.date.as_deref())
            .bind(license.usage.count)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
