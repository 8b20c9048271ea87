use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{LicenseStore, StoreError};
use crate::models::license::{License, LicenseSettings};

/// In-process license store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryLicenseStore {
    licenses: RwLock<HashMap<String, License>>,
}

impl MemoryLicenseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LicenseStore for MemoryLicenseStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<License>, StoreError> {
        Ok(self.licenses.read().await.get(key).cloned())
    }

    async fn upsert(&self, key: &str, settings: LicenseSettings) -> Result<License, StoreError> {
        let mut licenses = self.licenses.write().await;
        let license = licenses
            .entry(key.to_string())
            .and_modify(|existing| existing.apply(settings))
            .or_insert_with(|| License::new(key, settings));

        Ok(license.clone())
    }

    async fn delete_by_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.licenses.write().await.remove(key).is_some())
    }

    async fn list_all(&self) -> Result<Vec<License>, StoreError> {
        let mut licenses: Vec<License> = self.licenses.read().await.values().cloned().collect();
        licenses.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(licenses)
    }

    async fn save(&self, license: &License) -> Result<(), StoreError> {
        // Same as an UPDATE matching no row: a deleted license stays deleted
        if let Some(stored) = self.licenses.write().await.get_mut(&license.key) {
            stored.usage = license.usage.clone();
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::license::{LicenseType, Usage};

    fn limited(daily_limit: i64) -> LicenseSettings {
        LicenseSettings {
            license_type: LicenseType::Limited,
            enabled: true,
            daily_limit,
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_replaces_settings() {
        let store = MemoryLicenseStore::new();

        let created = store.upsert("k1", limited(5)).await.unwrap();
        assert_eq!(created.daily_limit, 5);
        assert_eq!(created.usage, Usage::default());

        let updated = store
            .upsert(
                "k1",
                LicenseSettings {
                    license_type: LicenseType::Unlimited,
                    enabled: false,
                    daily_limit: 9,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.license_type, LicenseType::Unlimited);
        assert!(!updated.enabled);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_leaves_usage_untouched() {
        let store = MemoryLicenseStore::new();
        let mut license = store.upsert("k1", limited(5)).await.unwrap();

        license.usage = Usage {
            date: Some("1403-01-01".to_string()),
            count: 3,
        };
        store.save(&license).await.unwrap();
        store.upsert("k1", limited(7)).await.unwrap();

        let stored = store.find_by_key("k1").await.unwrap().unwrap();
        assert_eq!(stored.daily_limit, 7);
        assert_eq!(stored.usage.count, 3);
        assert_eq!(stored.usage.date.as_deref(), Some("1403-01-01"));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_record_was_removed() {
        let store = MemoryLicenseStore::new();
        store.upsert("k1", limited(5)).await.unwrap();

        assert!(store.delete_by_key("k1").await.unwrap());
        assert!(!store.delete_by_key("k1").await.unwrap());
        assert!(store.find_by_key("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_does_not_resurrect_deleted_license() {
        let store = MemoryLicenseStore::new();
        let license = store.upsert("k1", limited(5)).await.unwrap();
        store.delete_by_key("k1").await.unwrap();

        store.save(&license).await.unwrap();
        assert!(store.find_by_key("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_sorted_by_key() {
        let store = MemoryLicenseStore::new();
        for key in ["b", "c", "a"] {
            store.upsert(key, limited(1)).await.unwrap();
        }

        let keys: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|license| license.key)
            .collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }
}
