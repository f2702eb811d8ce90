use crate::{
    domain::{TransactionRecord, TransactionType, UserBalance, UserId},
    ports::{
        balance::{self, BalanceStorePort},
        history::{self, HistoryLogPort},
    },
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use uuid::Uuid;

/// In-memory balance table
#[derive(Clone, Debug, Default)]
pub struct MemoryBalanceStore {
    balances: Arc<Mutex<HashMap<UserId, UserBalance>>>,
    latency: Option<Duration>,
}

impl MemoryBalanceStore {
    /// Delay every call by `latency` before touching the table
    ///
    /// The table itself stays atomic per call, this only widens the window between calls.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait::async_trait]
impl BalanceStorePort for MemoryBalanceStore {
    async fn read(&self, user_id: UserId) -> Result<UserBalance, balance::Error> {
        throttle(self.latency).await;
        let balance = self
            .balances
            .lock()?
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserBalance::empty(user_id));

        Ok(balance)
    }

    async fn write(&self, user_id: UserId, points: u64) -> Result<UserBalance, balance::Error> {
        throttle(self.latency).await;
        let balance = UserBalance {
            user_id,
            points,
            updated_at: Some(Utc::now()),
        };
        self.balances.lock()?.insert(user_id, balance.clone());

        Ok(balance)
    }

    async fn restore(&self, previous: UserBalance) -> Result<(), balance::Error> {
        throttle(self.latency).await;
        let mut balances = self.balances.lock()?;
        match previous.updated_at {
            None => {
                balances.remove(&previous.user_id);
            }
            Some(_) => {
                balances.insert(previous.user_id, previous);
            }
        }

        Ok(())
    }
}

/// In-memory history table
#[derive(Clone, Debug, Default)]
pub struct MemoryHistoryLog {
    records: Arc<Mutex<HashMap<UserId, Vec<TransactionRecord>>>>,
    latency: Option<Duration>,
}

impl MemoryHistoryLog {
    /// Delay every call by `latency` before touching the table
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait::async_trait]
impl HistoryLogPort for MemoryHistoryLog {
    async fn append(
        &self,
        user_id: UserId,
        points_after: u64,
        kind: TransactionType,
        amount: u64,
        occurred_at: DateTime<Utc>,
    ) -> Result<TransactionRecord, history::Error> {
        throttle(self.latency).await;
        let record = TransactionRecord {
            record_id: Uuid::new_v4(),
            user_id,
            points_after,
            kind,
            amount,
            occurred_at,
        };
        self.records
            .lock()?
            .entry(user_id)
            .or_default()
            .push(record.clone());

        Ok(record)
    }

    async fn list_all(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, history::Error> {
        throttle(self.latency).await;
        let records = self
            .records
            .lock()?
            .get(&user_id)
            .cloned()
            .unwrap_or_default();

        Ok(records)
    }
}

async fn throttle(latency: Option<Duration>) {
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for balance::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Unavailable(Box::new(ErasedPoisonError(err.to_string())))
    }
}

impl<T> From<PoisonError<T>> for history::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Unavailable(Box::new(ErasedPoisonError(err.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[tokio::test]
    async fn test_read_unknown_user() {
        let store = MemoryBalanceStore::default();

        let res = store.read(42).await;

        assert_that!(res).is_ok().is_equal_to(UserBalance::empty(42));
    }

    #[tokio::test]
    async fn test_write_retrieve() {
        let store = MemoryBalanceStore::default();
        // Store a balance
        let res = store.write(1, 5).await;
        assert_that!(res).is_ok().matches(|stored| {
            stored.user_id == 1 && stored.points == 5 && stored.updated_at.is_some()
        });
        // Reading it back should return the same value
        let stored = store.write(1, 7).await.expect("write should succeed");
        let res = store.read(1).await;
        assert_that!(res).is_ok().is_equal_to(stored);
    }

    #[tokio::test]
    async fn test_restore_empty_removes_entry() {
        let store = MemoryBalanceStore::default();
        store.write(2, 40).await.expect("write should succeed");

        let res = store.restore(UserBalance::empty(2)).await;

        assert_that!(res).is_ok();
        assert_that!(store.read(2).await).is_ok().is_equal_to(UserBalance::empty(2));
        assert_that!(store.balances.lock().unwrap().contains_key(&2)).is_false();
    }

    #[tokio::test]
    async fn test_restore_keeps_timestamp() {
        let store = MemoryBalanceStore::default();
        let previous = store.write(2, 40).await.expect("write should succeed");
        store.write(2, 90).await.expect("write should succeed");

        let res = store.restore(previous.clone()).await;

        assert_that!(res).is_ok();
        assert_that!(store.read(2).await).is_ok().is_equal_to(previous);
    }

    #[tokio::test]
    async fn test_clones_share_table() {
        let store = MemoryBalanceStore::default();
        let other = store.clone().with_latency(Duration::from_millis(1));

        other.write(3, 30).await.expect("write should succeed");

        let res = store.read(3).await;
        assert_that!(res).is_ok().matches(|balance| balance.points == 30);
    }

    #[tokio::test]
    async fn test_append_keeps_insertion_order() {
        let log = MemoryHistoryLog::default();
        let now = Utc::now();
        log.append(1, 100, TransactionType::Charge, 100, now)
            .await
            .expect("append should succeed");
        log.append(2, 7, TransactionType::Charge, 7, now)
            .await
            .expect("append should succeed");
        log.append(1, 40, TransactionType::Use, 60, now)
            .await
            .expect("append should succeed");

        let res = log.list_all(1).await.expect("list should succeed");

        let points: Vec<u64> = res.iter().map(|record| record.points_after).collect();
        assert_that!(points).is_equal_to(vec![100, 40]);
        assert_that!(res[1].kind).is_equal_to(TransactionType::Use);
        assert_that!(res[0].record_id).is_not_equal_to(res[1].record_id);
    }

    #[tokio::test]
    async fn test_list_unknown_user() {
        let log = MemoryHistoryLog::default();

        let res = log.list_all(9).await;

        assert_that!(res).is_ok().is_empty();
    }

    #[tokio::test]
    async fn test_poisoned_table() {
        let store = MemoryBalanceStore::default();
        let balances = store.balances.clone();
        // Poison the mutex by panicking while holding it
        let _ = std::thread::spawn(move || {
            let _guard = balances.lock().unwrap();
            panic!("poison");
        })
        .join();

        let res = store.read(1).await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, balance::Error::Unavailable(_)));
    }
}
