use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// Mutual-exclusion scope keyed by attempt id.
///
/// Every read-modify-write of a single attempt document (answer upsert,
/// submit plus lateness adjustment, timeout finalization, manual regrade)
/// runs under this lock so aggregate fields are never derived from a stale
/// read.
#[derive(Clone, Default)]
pub struct AttemptLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AttemptLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, attempt_id: Uuid) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().expect("attempt lock map poisoned");
            map.entry(attempt_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }
}
