//! Balance reconciliation.
//!
//! A user's balance must equal their grants, minus every stake, plus the
//! payouts of won bets. `bet_count` and `win_count` follow from the bet rows
//! the same way. The reconciler rewrites users that drifted from this.

use serde::Serialize;
use tracing::{info, instrument, warn};
use wagerbook_core::Money;

use super::Ledger;
use crate::error::Result;
use crate::storage::DerivedAccount;

/// One corrected user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRepair {
    pub user_id: i64,
    pub balance_before: Money,
    pub balance_after: Money,
    pub bet_count_before: i64,
    pub bet_count_after: i64,
    pub win_count_before: i64,
    pub win_count_after: i64,
}

impl From<&DerivedAccount> for AccountRepair {
    fn from(a: &DerivedAccount) -> Self {
        Self {
            user_id: a.user_id,
            balance_before: a.balance,
            balance_after: a.derived_balance,
            bet_count_before: a.bet_count,
            bet_count_after: a.derived_bet_count,
            win_count_before: a.win_count,
            win_count_after: a.derived_win_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub checked: usize,
    pub repairs: Vec<AccountRepair>,
    /// Users that drifted but were not rewritten: they changed while being
    /// checked, or their derived balance is negative.
    pub skipped: Vec<i64>,
}

impl Ledger {
    #[instrument(skip(self), fields(op = "Reconcile"))]
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let accounts = self.db.derived_accounts().await?;
        let mut report = ReconcileReport {
            checked: accounts.len(),
            ..ReconcileReport::default()
        };

        for account in accounts.iter().filter(|a| !a.is_consistent()) {
            if account.derived_balance.is_negative() {
                warn!(
                    user_id = account.user_id,
                    derived = %account.derived_balance,
                    "Derived balance is negative, leaving account untouched"
                );
                report.skipped.push(account.user_id);
                continue;
            }

            if self.db.repair_account(account).await? {
                warn!(
                    user_id = account.user_id,
                    before = %account.balance,
                    after = %account.derived_balance,
                    "Account repaired"
                );
                report.repairs.push(AccountRepair::from(account));
            } else {
                report.skipped.push(account.user_id);
            }
        }

        info!(
            checked = report.checked,
            repaired = report.repairs.len(),
            skipped = report.skipped.len(),
            "Reconciliation complete"
        );
        Ok(report)
    }
}
