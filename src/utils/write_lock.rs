use once_cell::sync::Lazy;
use tokio::sync::{Mutex, MutexGuard};

/// SQLite takes one writer at a time. Write units queue here before opening
/// their transaction, so a deferred transaction never has to upgrade its
/// read lock against another writer of this process.
///
/// Order: month locks first, then this one.
static STORE_WRITER: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub async fn acquire() -> MutexGuard<'static, ()> {
    STORE_WRITER.lock().await
}
