//! `Wagerbook` Ledger Library
//!
//! The wagering ledger behind the tournament betting service:
//! - `SQLite` storage for users, matches, bets and reward grants
//! - Bet placement, result settlement and daily rewards
//! - Name-pair whitelist and password credentials
//! - Standings, histories and balance reconciliation

pub mod auth;
pub mod engine;
pub mod error;
pub mod storage;

pub use engine::{Ledger, LedgerSettings};
pub use error::{LedgerError, Result};
