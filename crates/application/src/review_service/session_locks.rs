use std::collections::HashMap;
use std::sync::Arc;

use recert_core::TenantId;
use recert_domain::SessionId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-session write locks.
///
/// Mutations of one session are serialized; distinct sessions never contend
/// beyond the short registry lookup. Entries live only while a writer holds
/// or waits for them.
#[derive(Debug, Default)]
pub(super) struct SessionLocks {
    locks: Mutex<HashMap<(TenantId, SessionId), Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub(super) async fn acquire(
        &self,
        tenant_id: TenantId,
        session_id: &SessionId,
    ) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry((tenant_id, session_id.clone()))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    /// Releases the guard and drops the entry once no other writer waits on it.
    pub(super) async fn release(
        &self,
        tenant_id: TenantId,
        session_id: &SessionId,
        guard: OwnedMutexGuard<()>,
    ) {
        drop(guard);

        let mut locks = self.locks.lock().await;
        let key = (tenant_id, session_id.clone());
        // Waiters clone the Arc under the registry lock, so a count of one is final.
        if locks
            .get(&key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&key);
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
