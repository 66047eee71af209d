//! `SQLite` storage for the Wagerbook ledger.
//!
//! Owns every persisted row: users, matches, bets and reward grants. Each
//! entity has its own query module; multi-step mutations run inside a single
//! transaction that opens with a write.

mod db;
mod models;
mod queries_bets;
mod queries_matches;
mod queries_rewards;
mod queries_users;


pub use db::{DatabaseError, LedgerDatabase};
pub use models::*;
pub use queries_bets::{NewBet, Placement, Settlement};
pub use queries_rewards::NewGrant;
pub use queries_users::{DerivedAccount, NewUser};
