//! Error types for ledger operations.
//!
//! Every variant carries a stable numeric code that clients see unchanged.

use thiserror::Error;
use tracing::warn;

use crate::auth::{CredentialError, WhitelistError};
use crate::storage::DatabaseError;

/// Result type alias using [`LedgerError`].
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Match {0} not found")]
    MatchNotFound(i64),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Name pair is not on the whitelist")]
    NotWhitelisted,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("User not found")]
    UserNotFound,

    #[error("A bet on match {match_id} already exists")]
    DuplicateBet { match_id: i64 },

    #[error("Insufficient funds: stake {stake}, balance {balance}")]
    InsufficientFunds { stake: i64, balance: i64 },

    #[error("Password reset not allowed")]
    ResetNotAllowed,

    #[error("Betting is closed for match {0}")]
    BettingClosed(i64),

    #[error("Daily reward for {day} already claimed")]
    AlreadyClaimed { day: String },

    #[error("No bet on match {match_id}")]
    BetNotFound { match_id: i64 },

    #[error("Match {match_id} already has result {posted}")]
    ResultAlreadyPosted { match_id: i64, posted: i64 },
}

impl LedgerError {
    /// Stable numeric code for this failure kind.
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 1,
            Self::MatchNotFound(_) => 2,
            Self::StoreUnavailable(_) => 3,
            Self::NotWhitelisted => 6,
            Self::IncorrectPassword => 8,
            Self::UserNotFound => 9,
            Self::DuplicateBet { .. } => 10,
            Self::InsufficientFunds { .. } => 11,
            Self::ResetNotAllowed => 12,
            Self::BettingClosed(_) => 13,
            Self::AlreadyClaimed { .. } => 14,
            Self::BetNotFound { .. } => 15,
            Self::ResultAlreadyPosted { .. } => 16,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<DatabaseError> for LedgerError {
    fn from(e: DatabaseError) -> Self {
        warn!(error = %e, "Ledger store failure");
        Self::StoreUnavailable(e.to_string())
    }
}

impl From<CredentialError> for LedgerError {
    fn from(e: CredentialError) -> Self {
        warn!(error = %e, "Credential failure");
        Self::StoreUnavailable(e.to_string())
    }
}

impl From<WhitelistError> for LedgerError {
    fn from(e: WhitelistError) -> Self {
        match e {
            WhitelistError::InvalidName(name) => Self::InvalidInput(format!("invalid name {name:?}")),
            other => {
                warn!(error = %other, "Whitelist failure");
                Self::StoreUnavailable(other.to_string())
            }
        }
    }
}
