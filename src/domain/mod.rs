use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a balance holder
pub type UserId = u64;

/// Highest balance a user may hold
pub const MAX_POINTS: u64 = 1_000_000_000;

/// Current point balance of a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    pub user_id: UserId,

    /// Current amount of points
    pub points: u64,

    /// Time of the last write
    ///
    /// This is `None` for users that never transacted.
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserBalance {
    /// Zero balance for a user without any stored value
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            points: 0,
            updated_at: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Points added to the balance
    Charge,
    /// Points spent from the balance
    Use,
}

impl TransactionType {
    /// Signed difference this transaction applies for `amount`
    pub fn signed_delta(&self, amount: u64) -> i128 {
        match self {
            TransactionType::Charge => i128::from(amount),
            TransactionType::Use => -i128::from(amount),
        }
    }
}

/// Outcome of applying a transaction to a balance
#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    /// The new balance respects every bound
    Accepted(u64),
    /// The new balance would exceed the maximum
    AboveMaximum,
    /// The new balance would be negative
    BelowZero,
}

/// Compute the balance after applying `kind` for `amount` to `current`.
///
/// `max_points` is the inclusive upper bound.
pub fn transition(current: u64, kind: TransactionType, amount: u64, max_points: u64) -> Transition {
    let next = i128::from(current) + kind.signed_delta(amount);
    if next < 0 {
        Transition::BelowZero
    } else if next > i128::from(max_points) {
        Transition::AboveMaximum
    } else {
        // Bounded by `max_points`, so this always fits
        Transition::Accepted(next as u64)
    }
}

/// Immutable history entry for a single successful mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub record_id: Uuid,
    pub user_id: UserId,
    /// Balance right after this transaction was applied
    pub points_after: u64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Requested amount
    pub amount: u64,
    pub occurred_at: DateTime<Utc>,
}
