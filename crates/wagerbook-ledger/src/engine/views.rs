//! Read-only projections: standings, histories, profile.

use serde::Serialize;
use wagerbook_core::clock::day_key;

use super::Ledger;
use crate::error::{LedgerError, Result};
use crate::storage::{Bet, RewardGrant, Standing, User};

/// Largest leaderboard a caller may ask for.
const MAX_LEADERBOARD: u32 = 1000;

/// A user's summary page.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    /// Dense rank by balance over all users.
    pub rank: i64,
    pub today: String,
    pub can_claim_today: bool,
}

impl Ledger {
    async fn require_user(&self, user_id: i64) -> Result<User> {
        self.db
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound)
    }

    /// Richest bettors first. Users who never bet are left out.
    pub async fn leaderboard(&self, limit: Option<u32>) -> Result<Vec<Standing>> {
        let limit = limit.unwrap_or(self.settings.leaderboard_limit);
        if limit == 0 || limit > MAX_LEADERBOARD {
            return Err(LedgerError::invalid(format!(
                "limit must be between 1 and {MAX_LEADERBOARD}"
            )));
        }
        Ok(self.db.leaderboard(limit).await?)
    }

    pub async fn bet_history(&self, user_id: i64) -> Result<Vec<Bet>> {
        self.require_user(user_id).await?;
        Ok(self.db.bets_for_user(user_id).await?)
    }

    pub async fn reward_history(&self, user_id: i64) -> Result<Vec<RewardGrant>> {
        self.require_user(user_id).await?;
        Ok(self.db.grants_for_user(user_id).await?)
    }

    pub async fn user_rank(&self, user_id: i64) -> Result<i64> {
        self.db
            .user_rank(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound)
    }

    pub async fn profile(&self, user_id: i64) -> Result<Profile> {
        let user = self.require_user(user_id).await?;
        let rank = self.user_rank(user_id).await?;
        let today = day_key(self.clock.today());
        let can_claim_today = self.db.grant_for_day(user_id, &today).await?.is_none();

        Ok(Profile {
            user,
            rank,
            today,
            can_claim_today,
        })
    }
}
