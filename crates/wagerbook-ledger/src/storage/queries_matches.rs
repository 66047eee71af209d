//! Match (schedule) queries for the ledger store.

use super::db::{DatabaseError, LedgerDatabase};
use super::models::{Match, MatchFields, MatchResult, MatchStage};

impl LedgerDatabase {
    /// Insert a match unless one with the same kick-off time and teams exists.
    /// `now` is Unix seconds and stamps `updated_at`.
    ///
    /// Returns the match and whether it was newly created.
    pub async fn create_match(
        &self,
        fields: &MatchFields,
        now: i64,
    ) -> Result<(Match, bool), DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO matches (home_team, away_team, home_win_odds, away_win_odds, draw_odds, scheduled_at, group_label, stage, result, betting_disabled, display_enabled, updated_at) \
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ? \
             WHERE NOT EXISTS (SELECT 1 FROM matches WHERE scheduled_at = ? AND home_team = ? AND away_team = ?)",
        )
        .bind(&fields.home_team)
        .bind(&fields.away_team)
        .bind(fields.home_win_odds)
        .bind(fields.away_win_odds)
        .bind(fields.draw_odds)
        .bind(&fields.scheduled_at)
        .bind(&fields.group_label)
        .bind(i64::from(fields.stage))
        .bind(fields.betting_disabled)
        .bind(fields.display_enabled)
        .bind(now)
        .bind(&fields.scheduled_at)
        .bind(&fields.home_team)
        .bind(&fields.away_team)
        .execute(self.pool())
        .await?;

        let created = result.rows_affected() > 0;
        let row = sqlx::query_as::<_, Match>(
            "SELECT * FROM matches WHERE scheduled_at = ? AND home_team = ? AND away_team = ? ORDER BY id LIMIT 1",
        )
        .bind(&fields.scheduled_at)
        .bind(&fields.home_team)
        .bind(&fields.away_team)
        .fetch_one(self.pool())
        .await?;

        Ok((row, created))
    }

    /// Get a match by ID.
    pub async fn get_match(&self, id: i64) -> Result<Match, DatabaseError> {
        self.find_match(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Match {id}")))
    }

    pub async fn find_match(&self, id: i64) -> Result<Option<Match>, DatabaseError> {
        let row = sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// List matches in kick-off order, optionally restricted to one stage.
    pub async fn list_matches(&self, stage: Option<MatchStage>) -> Result<Vec<Match>, DatabaseError> {
        let rows = if let Some(stage) = stage {
            sqlx::query_as::<_, Match>(
                "SELECT * FROM matches WHERE stage = ? ORDER BY scheduled_at ASC, id ASC",
            )
            .bind(i64::from(stage))
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as::<_, Match>("SELECT * FROM matches ORDER BY scheduled_at ASC, id ASC")
                .fetch_all(self.pool())
                .await?
        };

        Ok(rows)
    }

    /// Overwrite a match's fields and result.
    ///
    /// The write only applies while the stored result is still `NotStarted` or
    /// already equals `result`, so a posted outcome can never be swapped for a
    /// different one. Returns `false` when no row matched.
    pub async fn update_match(
        &self,
        id: i64,
        fields: &MatchFields,
        result: MatchResult,
        now: i64,
    ) -> Result<bool, DatabaseError> {
        let outcome = sqlx::query(
            "UPDATE matches SET home_team = ?, away_team = ?, home_win_odds = ?, away_win_odds = ?, draw_odds = ?, \
             scheduled_at = ?, group_label = ?, stage = ?, result = ?, betting_disabled = ?, display_enabled = ?, updated_at = ? \
             WHERE id = ? AND (result = 0 OR result = ?)",
        )
        .bind(&fields.home_team)
        .bind(&fields.away_team)
        .bind(fields.home_win_odds)
        .bind(fields.away_win_odds)
        .bind(fields.draw_odds)
        .bind(&fields.scheduled_at)
        .bind(&fields.group_label)
        .bind(i64::from(fields.stage))
        .bind(i64::from(result))
        .bind(fields.betting_disabled)
        .bind(fields.display_enabled)
        .bind(now)
        .bind(id)
        .bind(i64::from(result))
        .execute(self.pool())
        .await?;

        Ok(outcome.rows_affected() > 0)
    }

    /// Close or reopen betting on a match.
    pub async fn set_betting_disabled(
        &self,
        id: i64,
        disabled: bool,
        now: i64,
    ) -> Result<bool, DatabaseError> {
        let outcome =
            sqlx::query("UPDATE matches SET betting_disabled = ?, updated_at = ? WHERE id = ?")
                .bind(disabled)
                .bind(now)
                .bind(id)
                .execute(self.pool())
                .await?;

        Ok(outcome.rows_affected() > 0)
    }
}
