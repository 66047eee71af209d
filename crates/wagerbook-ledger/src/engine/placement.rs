//! Bet placement.

use tracing::{info, instrument};

use super::Ledger;
use crate::error::{LedgerError, Result};
use crate::storage::{Bet, MatchResult, NewBet, Placement};

impl Ledger {
    /// Place a bet of `stake` whole units on `predicted` for a match.
    ///
    /// Failures are classified in a fixed order: bad input, unknown match,
    /// closed betting, an existing bet, unknown user, then insufficient
    /// funds. The insert and the debit commit together or not at all.
    #[instrument(skip(self), fields(op = "PlaceBet"))]
    pub async fn place_bet(
        &self,
        user_id: i64,
        match_id: i64,
        stake: i64,
        predicted: MatchResult,
    ) -> Result<Bet> {
        if stake <= 0 {
            return Err(LedgerError::invalid(format!(
                "stake must be a positive whole amount, got {stake}"
            )));
        }
        if !predicted.is_decisive() {
            return Err(LedgerError::invalid(
                "prediction must be a home win, an away win or a draw",
            ));
        }

        let fixture = self
            .db
            .find_match(match_id)
            .await?
            .ok_or(LedgerError::MatchNotFound(match_id))?;
        if !fixture.accepts_bets() {
            return Err(LedgerError::BettingClosed(match_id));
        }

        if self.db.find_bet(user_id, match_id).await?.is_some() {
            return Err(LedgerError::DuplicateBet { match_id });
        }

        let user = self
            .db
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound)?;
        let available = user.balance.whole_units();
        if stake > available {
            return Err(LedgerError::InsufficientFunds {
                stake,
                balance: available,
            });
        }

        let outcome = self
            .db
            .place_bet(&NewBet {
                user_id,
                match_id,
                stake,
                predicted,
                placed_at: self.unix_now(),
            })
            .await;

        match outcome {
            Ok(Placement::Placed(bet)) => {
                info!(
                    user_id,
                    match_id,
                    stake,
                    odds = bet.odds,
                    predicted = ?predicted,
                    "Bet placed"
                );
                Ok(bet)
            }
            Ok(Placement::MatchClosed) => Err(LedgerError::BettingClosed(match_id)),
            Ok(Placement::Unfunded) => {
                let balance = self.db.get_user(user_id).await?.balance.whole_units();
                Err(LedgerError::InsufficientFunds { stake, balance })
            }
            Err(e) if e.is_conflict() => Err(LedgerError::DuplicateBet { match_id }),
            Err(e) => Err(e.into()),
        }
    }

    /// The bet a user placed on a match.
    pub async fn bet(&self, user_id: i64, match_id: i64) -> Result<Bet> {
        self.db
            .find_bet(user_id, match_id)
            .await?
            .ok_or(LedgerError::BetNotFound { match_id })
    }
}
