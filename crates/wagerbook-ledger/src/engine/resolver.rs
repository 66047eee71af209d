//! Match schedule management and result settlement.

use serde::Serialize;
use tracing::{info, instrument, warn};
use wagerbook_core::Money;

use super::Ledger;
use crate::error::{LedgerError, Result};
use crate::storage::{BetStatus, Match, MatchFields, MatchResult, MatchStage, Settlement};

/// What posting a result did to the bets of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettlementSummary {
    pub match_id: i64,
    pub result: MatchResult,
    /// Bets moved out of `Pending` by this call.
    pub settled: usize,
    pub won: usize,
    pub lost: usize,
    pub paid_out: Money,
}

impl Ledger {
    /// Add a match to the schedule.
    ///
    /// A match with the same kick-off time and teams is not duplicated; the
    /// existing one is returned with `false`.
    #[instrument(skip(self, fields), fields(op = "CreateMatch"))]
    pub async fn create_match(&self, fields: &MatchFields) -> Result<(Match, bool)> {
        fields.validate().map_err(LedgerError::InvalidInput)?;

        let (fixture, created) = self.db.create_match(fields, self.unix_now()).await?;
        if created {
            info!(
                match_id = fixture.id,
                home = %fixture.home_team,
                away = %fixture.away_team,
                scheduled_at = %fixture.scheduled_at,
                "Match created"
            );
        }
        Ok((fixture, created))
    }

    pub async fn get_match(&self, match_id: i64) -> Result<Match> {
        self.db
            .find_match(match_id)
            .await?
            .ok_or(LedgerError::MatchNotFound(match_id))
    }

    /// Matches in kick-off order. Hidden matches are left out unless asked for.
    pub async fn list_matches(
        &self,
        stage: Option<MatchStage>,
        include_hidden: bool,
    ) -> Result<Vec<Match>> {
        let mut matches = self.db.list_matches(stage).await?;
        if !include_hidden {
            matches.retain(|m| m.display_enabled);
        }
        Ok(matches)
    }

    /// Edit a match that has no result yet (odds, kick-off, flags).
    #[instrument(skip(self, fields), fields(op = "AmendMatch"))]
    pub async fn amend_match(&self, match_id: i64, fields: &MatchFields) -> Result<Match> {
        fields.validate().map_err(LedgerError::InvalidInput)?;
        let current = self.get_match(match_id).await?;

        if !self
            .db
            .update_match(match_id, fields, MatchResult::NotStarted, self.unix_now())
            .await?
        {
            let posted = self.get_match(match_id).await.map_or(current.result, |m| m.result);
            return Err(LedgerError::ResultAlreadyPosted {
                match_id,
                posted: i64::from(posted),
            });
        }

        info!(match_id, "Match amended");
        self.get_match(match_id).await
    }

    /// Open or close betting on a match.
    #[instrument(skip(self), fields(op = "CloseBetting"))]
    pub async fn set_betting_closed(&self, match_id: i64, closed: bool) -> Result<Match> {
        if !self
            .db
            .set_betting_disabled(match_id, closed, self.unix_now())
            .await?
        {
            return Err(LedgerError::MatchNotFound(match_id));
        }
        info!(match_id, closed, "Betting toggled");
        self.get_match(match_id).await
    }

    /// Post the result of a match and settle every pending bet on it.
    ///
    /// `fields`, when given, replace the stored match fields in the same write
    /// that records the result. Re-posting the same result settles only bets
    /// that are still pending; posting a different decisive result is refused.
    #[instrument(skip(self, fields), fields(op = "PostResult"))]
    pub async fn post_result(
        &self,
        match_id: i64,
        result: MatchResult,
        fields: Option<&MatchFields>,
    ) -> Result<SettlementSummary> {
        let current = self.get_match(match_id).await?;
        if !result.is_decisive() {
            return Err(LedgerError::invalid(
                "result must be a home win, an away win or a draw",
            ));
        }
        if current.result.is_decisive() && current.result != result {
            return Err(LedgerError::ResultAlreadyPosted {
                match_id,
                posted: i64::from(current.result),
            });
        }

        let fields = match fields {
            Some(f) => {
                f.validate().map_err(LedgerError::InvalidInput)?;
                f.clone()
            }
            None => MatchFields::from(&current),
        };

        if !self
            .db
            .update_match(match_id, &fields, result, self.unix_now())
            .await?
        {
            // Lost a race against a different result.
            let posted = self.get_match(match_id).await?.result;
            return Err(LedgerError::ResultAlreadyPosted {
                match_id,
                posted: i64::from(posted),
            });
        }

        let summary = self.settle(match_id, result).await?;
        info!(
            match_id,
            result = ?result,
            settled = summary.settled,
            won = summary.won,
            lost = summary.lost,
            paid_out = %summary.paid_out,
            "Result posted"
        );
        Ok(summary)
    }

    async fn settle(&self, match_id: i64, result: MatchResult) -> Result<SettlementSummary> {
        let mut summary = SettlementSummary {
            match_id,
            result,
            settled: 0,
            won: 0,
            lost: 0,
            paid_out: Money::ZERO,
        };

        for bet in self.db.pending_bets_for_match(match_id).await? {
            let settlement = Settlement::resolve(&bet, result);
            if !self.db.apply_settlement(&settlement, self.unix_now()).await? {
                warn!(user_id = bet.user_id, match_id, "Bet already settled, skipping");
                continue;
            }

            summary.settled += 1;
            match settlement.status {
                BetStatus::Won => {
                    summary.won += 1;
                    summary.paid_out += settlement.payout;
                }
                BetStatus::Lost => summary.lost += 1,
                BetStatus::Pending => {}
            }
        }

        Ok(summary)
    }
}
