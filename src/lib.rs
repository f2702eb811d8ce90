//! Per-user point balances with an append-only transaction history.
//!
//! The crate follows a ports and adapters layout: [`ports`] defines the storage collaborators,
//! [`adapters`] provides in-memory implementations of them, and [`commands`] holds the ledger
//! itself, exposed as [`tower::Service`] implementations.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;

pub use commands::{Error, ErrorKind, PointLedger};
pub use config::LedgerConfig;
pub use domain::{TransactionRecord, TransactionType, UserBalance, UserId, MAX_POINTS};
