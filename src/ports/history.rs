use chrono::{DateTime, Utc};

use crate::domain::{TransactionRecord, TransactionType, UserId};

/// Append-only log of transaction records
#[mockall::automock]
#[async_trait::async_trait]
pub trait HistoryLogPort: Send + Sync {
    /// Insert a new record after all previous records for the same user
    async fn append(
        &self,
        user_id: UserId,
        points_after: u64,
        kind: TransactionType,
        amount: u64,
        occurred_at: DateTime<Utc>,
    ) -> Result<TransactionRecord, Error>;
    /// All records for a user, oldest first
    async fn list_all(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("history log unavailable: {0}")]
    Unavailable(Box<dyn std::error::Error + Send + Sync>),
}
