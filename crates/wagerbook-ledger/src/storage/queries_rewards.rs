//! Reward grant queries for the ledger store.

use wagerbook_core::Money;

use super::db::{DatabaseError, LedgerDatabase};
use super::models::RewardGrant;

/// Parameters for a reward grant.
pub struct NewGrant<'a> {
    pub user_id: i64,
    /// Local calendar day, `YYYY-MM-DD`.
    pub reward_day: &'a str,
    pub amount: Money,
    pub kind: &'a str,
    pub granted_at: &'a str,
}

impl LedgerDatabase {
    /// Book a grant and credit it to the user in one transaction.
    ///
    /// The `(user_id, reward_day)` unique key makes this at-most-once per day:
    /// a second grant for the same day fails with [`DatabaseError::Conflict`]
    /// and leaves the balance untouched.
    pub async fn grant_reward(&self, grant: &NewGrant<'_>) -> Result<RewardGrant, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO reward_grants (user_id, reward_day, amount, kind, granted_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(grant.user_id)
        .bind(grant.reward_day)
        .bind(grant.amount)
        .bind(grant.kind)
        .bind(grant.granted_at)
        .execute(&mut *tx)
        .await?;
        let id = inserted.last_insert_rowid();

        let credited = sqlx::query("UPDATE users SET balance = balance + ? WHERE id = ?")
            .bind(grant.amount)
            .bind(grant.user_id)
            .execute(&mut *tx)
            .await?;
        if credited.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {}", grant.user_id)));
        }

        let row = sqlx::query_as::<_, RewardGrant>("SELECT * FROM reward_grants WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// The grant a user received on a given day, if any.
    pub async fn grant_for_day(
        &self,
        user_id: i64,
        reward_day: &str,
    ) -> Result<Option<RewardGrant>, DatabaseError> {
        let row = sqlx::query_as::<_, RewardGrant>(
            "SELECT * FROM reward_grants WHERE user_id = ? AND reward_day = ?",
        )
        .bind(user_id)
        .bind(reward_day)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// All grants of a user, oldest first.
    pub async fn grants_for_user(&self, user_id: i64) -> Result<Vec<RewardGrant>, DatabaseError> {
        let rows = sqlx::query_as::<_, RewardGrant>(
            "SELECT * FROM reward_grants WHERE user_id = ? ORDER BY reward_day ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
