//! Bet queries for the ledger store.
//!
//! Placement and settlement each touch a bet row and a user row; both run as
//! one transaction whose first statement is the guarded write, so `SQLite`
//! takes the write lock before anything is read.

use wagerbook_core::Money;

use super::db::{DatabaseError, LedgerDatabase};
use super::models::{Bet, BetStatus, MatchResult};

/// Parameters for placing a bet.
pub struct NewBet {
    pub user_id: i64,
    pub match_id: i64,
    /// Whole units.
    pub stake: i64,
    pub predicted: MatchResult,
    /// Unix seconds.
    pub placed_at: i64,
}

/// Outcome of [`LedgerDatabase::place_bet`] that is not a storage failure.
#[derive(Debug)]
pub enum Placement {
    Placed(Bet),
    /// The match is missing, closed for betting, or already decided.
    MatchClosed,
    /// The balance cannot cover the stake.
    Unfunded,
}

/// Resolution of one pending bet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub user_id: i64,
    pub match_id: i64,
    pub status: BetStatus,
    pub payout: Money,
}

impl Settlement {
    /// Resolve `bet` against a decisive `result`.
    pub fn resolve(bet: &Bet, result: MatchResult) -> Self {
        if bet.predicted == result {
            Self {
                user_id: bet.user_id,
                match_id: bet.match_id,
                status: BetStatus::Won,
                payout: Money::payout(bet.stake, bet.odds),
            }
        } else {
            Self {
                user_id: bet.user_id,
                match_id: bet.match_id,
                status: BetStatus::Lost,
                payout: Money::ZERO,
            }
        }
    }
}

impl LedgerDatabase {
    /// Record a pending bet and debit its stake.
    ///
    /// The bet row is inserted only if the match is open, with the odds for
    /// the predicted outcome copied from the match in the same statement. The
    /// debit only applies if the balance covers the stake. Either guard failing
    /// rolls the whole placement back. A second bet on the same match fails
    /// with [`DatabaseError::Conflict`].
    pub async fn place_bet(&self, bet: &NewBet) -> Result<Placement, DatabaseError> {
        let stake = Money::from_units(bet.stake);
        let mut tx = self.pool().begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO bets (user_id, match_id, stake, predicted, odds, status, payout, placed_at) \
             SELECT ?, id, ?, ?, CASE ? WHEN 1 THEN home_win_odds WHEN 2 THEN away_win_odds ELSE draw_odds END, 0, 0, ? \
             FROM matches WHERE id = ? AND betting_disabled = 0 AND result = 0",
        )
        .bind(bet.user_id)
        .bind(bet.stake)
        .bind(i64::from(bet.predicted))
        .bind(i64::from(bet.predicted))
        .bind(bet.placed_at)
        .bind(bet.match_id)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Ok(Placement::MatchClosed);
        }

        let debited = sqlx::query(
            "UPDATE users SET balance = balance - ?, bet_count = bet_count + 1 WHERE id = ? AND balance >= ?",
        )
        .bind(stake)
        .bind(bet.user_id)
        .bind(stake)
        .execute(&mut *tx)
        .await?;
        if debited.rows_affected() == 0 {
            return Ok(Placement::Unfunded);
        }

        let row = sqlx::query_as::<_, Bet>("SELECT * FROM bets WHERE user_id = ? AND match_id = ?")
            .bind(bet.user_id)
            .bind(bet.match_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Placement::Placed(row))
    }

    /// Get the bet a user placed on a match, if any.
    pub async fn find_bet(&self, user_id: i64, match_id: i64) -> Result<Option<Bet>, DatabaseError> {
        let row = sqlx::query_as::<_, Bet>("SELECT * FROM bets WHERE user_id = ? AND match_id = ?")
            .bind(user_id)
            .bind(match_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// All bets of a user, oldest first.
    pub async fn bets_for_user(&self, user_id: i64) -> Result<Vec<Bet>, DatabaseError> {
        let rows = sqlx::query_as::<_, Bet>(
            "SELECT * FROM bets WHERE user_id = ? ORDER BY placed_at ASC, match_id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Bets on a match that have not been settled yet.
    pub async fn pending_bets_for_match(&self, match_id: i64) -> Result<Vec<Bet>, DatabaseError> {
        let rows = sqlx::query_as::<_, Bet>(
            "SELECT * FROM bets WHERE match_id = ? AND status = ? ORDER BY placed_at ASC, user_id ASC",
        )
        .bind(match_id)
        .bind(i64::from(BetStatus::Pending))
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Apply a settlement to a still-pending bet and credit any payout.
    ///
    /// Returns `false` without touching the balance when the bet has already
    /// left `Pending`, which makes repeated settlement a no-op.
    pub async fn apply_settlement(
        &self,
        settlement: &Settlement,
        settled_at: i64,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query(
            "UPDATE bets SET status = ?, payout = ?, settled_at = ? WHERE user_id = ? AND match_id = ? AND status = ?",
        )
        .bind(i64::from(settlement.status))
        .bind(settlement.payout)
        .bind(settled_at)
        .bind(settlement.user_id)
        .bind(settlement.match_id)
        .bind(i64::from(BetStatus::Pending))
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        if settlement.status == BetStatus::Won {
            let credited = sqlx::query(
                "UPDATE users SET balance = balance + ?, win_count = win_count + 1 WHERE id = ?",
            )
            .bind(settlement.payout)
            .bind(settlement.user_id)
            .execute(&mut *tx)
            .await?;
            if credited.rows_affected() == 0 {
                return Err(DatabaseError::NotFound(format!(
                    "User {} for winning bet on match {}",
                    settlement.user_id, settlement.match_id
                )));
            }
        }

        tx.commit().await?;
        Ok(true)
    }
}
