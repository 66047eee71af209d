//! Daily reward claims.

use tracing::{info, instrument};
use wagerbook_core::clock::{day_key, timestamp_key};

use super::Ledger;
use crate::error::{LedgerError, Result};
use crate::storage::{DatabaseError, NewGrant, RewardGrant, grant_kind};

impl Ledger {
    /// Credit today's reward to a user, at most once per local calendar day.
    #[instrument(skip(self), fields(op = "ClaimDailyReward"))]
    pub async fn claim_daily_reward(&self, user_id: i64) -> Result<RewardGrant> {
        let now = self.clock.now();
        let day = day_key(now.date_naive());

        if self.db.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UserNotFound);
        }
        if self.db.grant_for_day(user_id, &day).await?.is_some() {
            return Err(LedgerError::AlreadyClaimed { day });
        }

        let granted_at = timestamp_key(now);
        let outcome = self
            .db
            .grant_reward(&NewGrant {
                user_id,
                reward_day: &day,
                amount: self.settings.daily_reward,
                kind: grant_kind::DAILY,
                granted_at: &granted_at,
            })
            .await;

        match outcome {
            Ok(grant) => {
                info!(user_id, day = %grant.reward_day, amount = %grant.amount, "Daily reward granted");
                Ok(grant)
            }
            Err(e) if e.is_conflict() => Err(LedgerError::AlreadyClaimed { day }),
            Err(DatabaseError::NotFound(_)) => Err(LedgerError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }
}
