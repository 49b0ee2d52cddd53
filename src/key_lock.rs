use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Identity of one mutable balance: a (location, stock variant) pair.
///
/// The ordering is what gives multi-key workflows a canonical lock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BalanceKey {
    pub location_id: Uuid,
    pub variant_id: Uuid,
}

impl BalanceKey {
    pub fn new(location_id: Uuid, variant_id: Uuid) -> Self {
        Self {
            location_id,
            variant_id,
        }
    }
}

/// Registry of per-key async mutexes serializing balance-mutating
/// operations. At most one in-flight mutation per (location, variant);
/// disjoint keys proceed independently.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<BalanceKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: BalanceKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquires the lock for a single key.
    pub async fn acquire(&self, key: BalanceKey) -> OwnedMutexGuard<()> {
        self.lock_for(key).lock_owned().await
    }

    /// Acquires the locks for every distinct key of a workflow.
    ///
    /// Keys are deduplicated and locked in sorted order; two workflows
    /// touching overlapping key sets cannot deadlock.
    pub async fn acquire_all(&self, keys: &[BalanceKey]) -> Vec<OwnedMutexGuard<()>> {
        let mut ordered: Vec<BalanceKey> = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            guards.push(self.lock_for(key).lock_owned().await);
        }
        guards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_operations_serialize() {
        let locks = Arc::new(KeyLocks::new());
        let key = BalanceKey::new(Uuid::new_v4(), Uuid::new_v4());
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let in_flight = in_flight.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire(key).await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst);
                assert_eq!(now, 0, "two holders inside the same key lock");
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn overlapping_key_sets_do_not_deadlock() {
        let locks = Arc::new(KeyLocks::new());
        let location = Uuid::new_v4();
        let a = BalanceKey::new(location, Uuid::new_v4());
        let b = BalanceKey::new(location, Uuid::new_v4());

        let forward = {
            let locks = locks.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let _guards = locks.acquire_all(&[a, b]).await;
                }
            })
        };
        let backward = {
            let locks = locks.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let _guards = locks.acquire_all(&[b, a]).await;
                }
            })
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            forward.await.unwrap();
            backward.await.unwrap();
        })
        .await
        .expect("lock ordering should prevent deadlock");
    }

    #[tokio::test]
    async fn duplicate_keys_are_deduplicated() {
        let locks = KeyLocks::new();
        let key = BalanceKey::new(Uuid::new_v4(), Uuid::new_v4());
        let guards = locks.acquire_all(&[key, key, key]).await;
        assert_eq!(guards.len(), 1);
    }
}
