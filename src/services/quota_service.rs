//! Quota service - daily request accounting for limited licenses.
//!
//! # Rules
//!
//! 1. Usage recorded for another day (or never): restart the counter at 1
//!    and admit. A new day always admits its first request, even when the
//!    limit is 0.
//! 2. Counter already at or above `daily_limit`: deny, nothing is written.
//! 3. Otherwise: increment and admit.
//!
//! # Concurrency
//!
//! The read-modify-write is not serialized. Two requests for the same key
//! can both read an under-limit counter and both be admitted, so the limit
//! is enforced best-effort.

use crate::{
    models::license::{License, Usage},
    store::{LicenseStore, StoreError},
};

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Admitted,
    Denied,
}

/// Apply the quota rules to `license` in place.
///
/// `license.usage` is only modified when the request is admitted.
pub fn consume(license: &mut License, today: &str) -> QuotaDecision {
    if license.usage.date.as_deref() != Some(today) {
        license.usage = Usage {
            date: Some(today.to_string()),
            count: 1,
        };
        return QuotaDecision::Admitted;
    }

    if license.usage.count >= license.daily_limit {
        return QuotaDecision::Denied;
    }

    license.usage.count += 1;
    QuotaDecision::Admitted
}

/// Decide whether `license` may make one more request `today`, persisting
/// the new counter when it may.
///
/// # Errors
///
/// - `StoreError`: the updated counter could not be saved
pub async fn check_and_consume(
    store: &dyn LicenseStore,
    license: &mut License,
    today: &str,
) -> Result<QuotaDecision, StoreError> {
    let decision = consume(license, today);

    if decision == QuotaDecision::Admitted {
        store.save(license).await?;
    }

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::license::{LicenseSettings, LicenseType};
    use crate::store::MemoryLicenseStore;

    const TODAY: &str = "1403-07-01";
    const YESTERDAY: &str = "1403-06-31";

    fn limited(daily_limit: i64) -> License {
        License::new(
            "k1",
            LicenseSettings {
                license_type: LicenseType::Limited,
                enabled: true,
                daily_limit,
            },
        )
    }

    #[test]
    fn admits_exactly_daily_limit_requests() {
        let mut license = limited(3);

        for expected in 1..=3 {
            assert_eq!(consume(&mut license, TODAY), QuotaDecision::Admitted);
            assert_eq!(license.usage.count, expected);
        }

        assert_eq!(consume(&mut license, TODAY), QuotaDecision::Denied);
        assert_eq!(license.usage.count, 3);
    }

    #[test]
    fn rollover_admits_exhausted_license() {
        let mut license = limited(2);
        license.usage = Usage {
            date: Some(YESTERDAY.to_string()),
            count: 2,
        };

        assert_eq!(consume(&mut license, TODAY), QuotaDecision::Admitted);
        assert_eq!(license.usage.date.as_deref(), Some(TODAY));
        assert_eq!(license.usage.count, 1);
    }

    #[test]
    fn zero_limit_admits_only_first_request_of_the_day() {
        let mut license = limited(0);

        assert_eq!(consume(&mut license, TODAY), QuotaDecision::Admitted);
        assert_eq!(license.usage.count, 1);
        assert_eq!(consume(&mut license, TODAY), QuotaDecision::Denied);
    }

    #[tokio::test]
    async fn persists_only_admitted_requests() {
        let store = MemoryLicenseStore::new();
        let mut license = store
            .upsert(
                "k1",
                LicenseSettings {
                    license_type: LicenseType::Limited,
                    enabled: true,
                    daily_limit: 1,
                },
            )
            .await
            .unwrap();

        let first = check_and_consume(&store, &mut license, TODAY).await.unwrap();
        assert_eq!(first, QuotaDecision::Admitted);

        // Tamper with the in-memory copy: a denial must not write it back
        license.usage.count = 5;
        let second = check_and_consume(&store, &mut license, TODAY).await.unwrap();
        assert_eq!(second, QuotaDecision::Denied);

        let stored = store.find_by_key("k1").await.unwrap().unwrap();
        assert_eq!(stored.usage.count, 1);
        assert_eq!(stored.usage.date.as_deref(), Some(TODAY));
    }
}
