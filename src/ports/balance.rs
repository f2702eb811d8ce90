use crate::domain::{UserBalance, UserId};

/// Store holding the current balance of every user
///
/// Each call is atomic on its own, but nothing orders two calls against each other. Callers that
/// read then write must provide their own exclusion.
#[mockall::automock]
#[async_trait::async_trait]
pub trait BalanceStorePort: Send + Sync {
    /// Current balance, or an empty balance for unknown users
    async fn read(&self, user_id: UserId) -> Result<UserBalance, Error>;
    /// Upsert the balance and return the stored value with its new timestamp
    async fn write(&self, user_id: UserId, points: u64) -> Result<UserBalance, Error>;
    /// Put back a balance exactly as returned by an earlier `read`, timestamp included
    ///
    /// Restoring an empty balance (`updated_at` is `None`) removes the stored value.
    async fn restore(&self, previous: UserBalance) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("balance store unavailable: {0}")]
    Unavailable(Box<dyn std::error::Error + Send + Sync>),
}
