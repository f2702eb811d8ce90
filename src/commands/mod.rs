use std::sync::Arc;

use chrono::Utc;
use tokio::{sync::OwnedMutexGuard, task::JoinError};
use tracing::Instrument;

use crate::{
    config::LedgerConfig,
    domain::{transition, TransactionRecord, TransactionType, Transition, UserBalance, UserId},
    ports::{balance::BalanceStorePort, history::HistoryLogPort},
};

pub mod charge;
pub mod get_balance;
pub mod get_history;
pub mod locks;
pub mod use_points;

use locks::KeyLocks;

/// Point ledger over a balance store and a history log
///
/// Every mutation runs as one critical section per user: read the balance, validate, write the
/// balance, append the history record. Mutations on different users run in parallel. Clones share
/// the stores and the lock table.
pub struct PointLedger<B, H> {
    balances: Arc<B>,
    history: Arc<H>,
    locks: Arc<KeyLocks<UserId>>,
    config: LedgerConfig,
}

impl<B, H> Clone for PointLedger<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: self.balances.clone(),
            history: self.history.clone(),
            locks: self.locks.clone(),
            config: self.config.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Charging would push the balance above the maximum
    #[error("balance of {current_points} plus {amount} exceeds the maximum of {max_points}")]
    MaxBalanceExceeded {
        current_points: u64,
        amount: u64,
        max_points: u64,
    },
    /// Using would drive the balance negative
    #[error("insufficient balance: {amount} requested, {current_points} available")]
    InsufficientBalance { current_points: u64, amount: u64 },
    #[error("invalid amount: {0}")]
    InvalidAmount(u64),

    #[error("balance store error: {0}")]
    BalanceStore(#[from] crate::ports::balance::Error),
    #[error("history log error: {0}")]
    HistoryLog(#[from] crate::ports::history::Error),

    /// The runtime shut down before the mutation finished
    #[error("mutation interrupted: {0}")]
    Interrupted(JoinError),
}

/// Category of an [`Error`], for callers that map errors to responses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    MaxBalanceExceeded,
    InsufficientBalance,
    InvalidAmount,
    /// A storage collaborator failed; the request may not have been evaluated
    StorageUnavailable,
    Interrupted,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MaxBalanceExceeded { .. } => ErrorKind::MaxBalanceExceeded,
            Error::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Error::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Error::BalanceStore(_) | Error::HistoryLog(_) => ErrorKind::StorageUnavailable,
            Error::Interrupted(_) => ErrorKind::Interrupted,
        }
    }
}

impl<B, H> PointLedger<B, H>
where
    B: BalanceStorePort + 'static,
    H: HistoryLogPort + 'static,
{
    pub fn new(balances: Arc<B>, history: Arc<H>) -> Self {
        Self::with_config(balances, history, LedgerConfig::default())
    }

    pub fn with_config(balances: Arc<B>, history: Arc<H>, config: LedgerConfig) -> Self {
        Self {
            balances,
            history,
            locks: Arc::new(KeyLocks::default()),
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Current balance, or a zero balance for users that never transacted
    pub async fn get_balance(&self, user_id: UserId) -> Result<UserBalance, Error> {
        let _guard = self.read_guard(user_id).await;
        Ok(self.balances.read(user_id).await?)
    }

    /// All transactions of a user, oldest first
    pub async fn get_history(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, Error> {
        let _guard = self.read_guard(user_id).await;
        Ok(self.history.list_all(user_id).await?)
    }

    /// Add `amount` points to the balance of `user_id`
    pub async fn charge(&self, user_id: UserId, amount: u64) -> Result<UserBalance, Error> {
        self.apply(user_id, TransactionType::Charge, amount).await
    }

    /// Spend `amount` points from the balance of `user_id`
    pub async fn use_points(&self, user_id: UserId, amount: u64) -> Result<UserBalance, Error> {
        self.apply(user_id, TransactionType::Use, amount).await
    }

    async fn read_guard(&self, user_id: UserId) -> Option<OwnedMutexGuard<()>> {
        if self.config.strict_reads {
            Some(self.locks.lock(&user_id).await)
        } else {
            None
        }
    }

    /// Run one mutation to completion
    ///
    /// The critical section runs on its own task, so dropping the returned future cannot stop a
    /// mutation between the balance write and the history append.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn apply(
        &self,
        user_id: UserId,
        kind: TransactionType,
        amount: u64,
    ) -> Result<UserBalance, Error> {
        let ledger = self.clone();
        let task = tokio::spawn(
            async move { ledger.apply_exclusive(user_id, kind, amount).await }.in_current_span(),
        );
        let res = match task.await {
            Ok(res) => res,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(Error::Interrupted(err)),
        };

        match &res {
            Ok(balance) => tracing::debug!(points = balance.points, "transaction applied"),
            Err(err @ (Error::BalanceStore(_) | Error::HistoryLog(_) | Error::Interrupted(_))) => {
                tracing::warn!(error = %err, "transaction failed")
            }
            Err(err) => tracing::info!(error = %err, "transaction rejected"),
        }

        res
    }

    async fn apply_exclusive(
        &self,
        user_id: UserId,
        kind: TransactionType,
        amount: u64,
    ) -> Result<UserBalance, Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount(amount));
        }

        let _guard = self.locks.lock(&user_id).await;

        let current = self.balances.read(user_id).await?;
        let points = match transition(current.points, kind, amount, self.config.max_points) {
            Transition::Accepted(points) => points,
            Transition::AboveMaximum => {
                return Err(Error::MaxBalanceExceeded {
                    current_points: current.points,
                    amount,
                    max_points: self.config.max_points,
                })
            }
            Transition::BelowZero => {
                return Err(Error::InsufficientBalance {
                    current_points: current.points,
                    amount,
                })
            }
        };

        let updated = self.balances.write(user_id, points).await?;
        let occurred_at = updated.updated_at.unwrap_or_else(Utc::now);
        if let Err(err) = self
            .history
            .append(user_id, updated.points, kind, amount, occurred_at)
            .await
        {
            self.restore(current).await;
            return Err(err.into());
        }

        Ok(updated)
    }

    /// Put back the balance read at the start of a mutation whose record could not be appended
    ///
    /// Must run while the user's lock is still held.
    async fn restore(&self, previous: UserBalance) {
        let (user_id, points) = (previous.user_id, previous.points);
        if let Err(err) = self.balances.restore(previous).await {
            tracing::error!(
                user_id,
                points,
                error = %err,
                "failed to restore balance after history append failure"
            );
        }
    }
}
