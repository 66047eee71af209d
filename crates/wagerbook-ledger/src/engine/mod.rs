//! The ledger service.
//!
//! [`Ledger`] owns the store handle plus the injected collaborators (clock,
//! whitelist, credential verifier) and exposes every ledger operation. Each
//! operation pre-checks its inputs to classify the common failures, then relies
//! on the store's guarded transactions for the final word, so two requests
//! racing on the same key can never both succeed.

mod accounts;
mod placement;
mod reconcile;
mod resolver;
mod rewards;
mod views;


use std::sync::Arc;

use wagerbook_core::config::LedgerConfig;
use wagerbook_core::{Clock, Money};

use crate::auth::{CredentialVerifier, Whitelist};
use crate::storage::LedgerDatabase;

pub use accounts::Authorization;
pub use reconcile::{AccountRepair, ReconcileReport};
pub use resolver::SettlementSummary;
pub use views::Profile;

/// Money rules and toggles the ledger runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSettings {
    pub initial_balance: Money,
    pub daily_reward: Money,
    pub whitelist_enabled: bool,
    pub leaderboard_limit: u32,
}

impl LedgerSettings {
    pub const fn from_config(config: &LedgerConfig, whitelist_enabled: bool) -> Self {
        Self {
            initial_balance: Money::from_units(config.initial_balance),
            daily_reward: Money::from_units(config.daily_reward),
            whitelist_enabled,
            leaderboard_limit: config.leaderboard_limit,
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default(), false)
    }
}

/// Handle to the ledger. Cheap to clone; clones share the pool and collaborators.
#[derive(Clone)]
pub struct Ledger {
    db: LedgerDatabase,
    settings: LedgerSettings,
    clock: Arc<dyn Clock>,
    whitelist: Arc<dyn Whitelist>,
    credentials: Arc<dyn CredentialVerifier>,
}

impl Ledger {
    pub fn new(
        db: LedgerDatabase,
        settings: LedgerSettings,
        clock: Arc<dyn Clock>,
        whitelist: Arc<dyn Whitelist>,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            db,
            settings,
            clock,
            whitelist,
            credentials,
        }
    }

    pub const fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub const fn database(&self) -> &LedgerDatabase {
        &self.db
    }

    /// Current time from the injected clock, in Unix seconds.
    fn unix_now(&self) -> i64 {
        self.clock.now().timestamp()
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
