use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::YearMonth;

pub type MonthKey = (i64, YearMonth);

/// One async mutex per (employee, month). Reconciliation and projection for
/// the same key are serialized in-process so concurrent upserts of the same
/// daily rows cannot interleave.
///
/// The registry holds only weak handles. A mutex lives as long as a guard or
/// a waiter holds it, so an entry is never dropped while in use.
static MONTH_LOCKS: Lazy<StdMutex<HashMap<MonthKey, Weak<Mutex<()>>>>> =
    Lazy::new(|| StdMutex::new(HashMap::new()));

fn mutex_for(key: MonthKey) -> Arc<Mutex<()>> {
    let mut registry = MONTH_LOCKS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(mutex) = registry.get(&key).and_then(Weak::upgrade) {
        return mutex;
    }

    registry.retain(|_, weak| weak.strong_count() > 0);
    let mutex = Arc::new(Mutex::new(()));
    registry.insert(key, Arc::downgrade(&mutex));
    mutex
}

/// Waits for exclusive access to one employee's month.
pub async fn lock(employee_id: i64, month: YearMonth) -> OwnedMutexGuard<()> {
    mutex_for((employee_id, month)).lock_owned().await
}

/// Locks several keys, always in ascending order so two callers with
/// overlapping sets cannot deadlock.
pub async fn lock_all(mut keys: Vec<MonthKey>) -> Vec<OwnedMutexGuard<()>> {
    keys.sort();
    keys.dedup();

    let mut guards = Vec::with_capacity(keys.len());
    for key in keys {
        guards.push(mutex_for(key).lock_owned().await);
    }

    tracing::debug!(count = guards.len(), "Month locks acquired");
    guards
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month() -> YearMonth {
        YearMonth::new(1999, 1).unwrap()
    }

    #[tokio::test]
    async fn same_key_is_exclusive_until_released() {
        let guard = lock(-101, month()).await;
        let mutex = mutex_for((-101, month()));
        assert!(mutex.try_lock().is_err());

        drop(guard);
        assert!(mutex.try_lock().is_ok());
    }

    #[tokio::test]
    async fn different_keys_do_not_block_each_other() {
        let _a = lock(-102, month()).await;
        let b = mutex_for((-103, month()));
        assert!(b.try_lock().is_ok());
    }

    #[tokio::test]
    async fn lock_all_collapses_duplicates() {
        let guards = lock_all(vec![(-105, month()), (-104, month()), (-105, month())]).await;
        assert_eq!(guards.len(), 2);
        assert!(mutex_for((-104, month())).try_lock().is_err());
        assert!(mutex_for((-105, month())).try_lock().is_err());
    }

    #[tokio::test]
    async fn held_lock_survives_registry_churn() {
        let _held = lock(-9_999_999, month()).await;

        for id in 0..150_000i64 {
            let _ = mutex_for((-10_000_000 - id, month()));
        }

        assert!(mutex_for((-9_999_999, month())).try_lock().is_err());
    }

    #[tokio::test]
    async fn released_keys_are_pruned() {
        drop(lock(-106, month()).await);
        let _ = mutex_for((-107, month()));

        let registry = MONTH_LOCKS.lock().unwrap();
        assert!(!registry.contains_key(&(-106, month())));
    }
}
