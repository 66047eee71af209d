//! User queries for the ledger store.

use wagerbook_core::Money;

use super::db::{DatabaseError, LedgerDatabase};
use super::models::{Standing, User, grant_kind};

/// Parameters for registering a user.
pub struct NewUser<'a> {
    pub chinese_name: &'a str,
    pub english_name: &'a str,
    pub password_hash: &'a str,
    pub initial_balance: Money,
    /// Local day the signup grant is booked under.
    pub reward_day: &'a str,
    /// Local timestamp of the first login.
    pub login_at: &'a str,
    /// Unix seconds.
    pub created_at: i64,
}

/// Balance and counters a user should have according to their bets and grants.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DerivedAccount {
    pub user_id: i64,
    pub balance: Money,
    pub derived_balance: Money,
    pub bet_count: i64,
    pub derived_bet_count: i64,
    pub win_count: i64,
    pub derived_win_count: i64,
}

impl DerivedAccount {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.derived_balance
            && self.bet_count == self.derived_bet_count
            && self.win_count == self.derived_win_count
    }
}

impl LedgerDatabase {
    /// Create a user together with the signup grant that funds their balance.
    ///
    /// Both rows are written in one transaction; a name pair that already
    /// exists fails with [`DatabaseError::Conflict`].
    pub async fn create_user(&self, params: &NewUser<'_>) -> Result<User, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            "INSERT INTO users (chinese_name, english_name, password_hash, balance, last_login_at, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(params.chinese_name)
        .bind(params.english_name)
        .bind(params.password_hash)
        .bind(params.initial_balance)
        .bind(params.login_at)
        .bind(params.created_at)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        sqlx::query(
            "INSERT INTO reward_grants (user_id, reward_day, amount, kind, granted_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(params.reward_day)
        .bind(params.initial_balance)
        .bind(grant_kind::SIGNUP)
        .bind(params.login_at)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: i64) -> Result<User, DatabaseError> {
        self.find_user(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    /// Look a user up by their name pair.
    pub async fn find_user_by_names(
        &self,
        chinese_name: &str,
        english_name: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE chinese_name = ? AND english_name = ?",
        )
        .bind(chinese_name)
        .bind(english_name)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    /// Stamp a successful login. When `new_password_hash` is given the stored
    /// credential is replaced and the reset permission is consumed.
    pub async fn record_login(
        &self,
        id: i64,
        login_at: &str,
        new_password_hash: Option<&str>,
    ) -> Result<User, DatabaseError> {
        if let Some(hash) = new_password_hash {
            sqlx::query(
                "UPDATE users SET last_login_at = ?, password_hash = ?, reset_password_allowed = 0 WHERE id = ?",
            )
            .bind(login_at)
            .bind(hash)
            .bind(id)
            .execute(self.pool())
            .await?;
        } else {
            sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
                .bind(login_at)
                .bind(id)
                .execute(self.pool())
                .await?;
        }

        self.get_user(id).await
    }

    /// Replace the password of a user whose reset permission is set, consuming
    /// the permission. Returns `false` if the permission was not set.
    pub async fn reset_password(&self, id: i64, password_hash: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, reset_password_allowed = 0 WHERE id = ? AND reset_password_allowed = 1",
        )
        .bind(password_hash)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Allow or forbid the next login to overwrite the stored password.
    pub async fn set_reset_password_allowed(
        &self,
        id: i64,
        allowed: bool,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET reset_password_allowed = ? WHERE id = ?")
            .bind(allowed)
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Standings
    // =========================================================================

    /// Top `limit` users by balance among those who have placed a bet.
    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<Standing>, DatabaseError> {
        let rows = sqlx::query_as::<_, Standing>(
            "SELECT id AS user_id, chinese_name, english_name, balance, win_count, bet_count FROM users WHERE bet_count > 0 ORDER BY balance DESC, id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Dense rank of a user by balance across all users (1 = richest).
    pub async fn user_rank(&self, id: i64) -> Result<Option<i64>, DatabaseError> {
        let rank: Option<i64> = sqlx::query_scalar(
            "SELECT (SELECT COUNT(DISTINCT o.balance) FROM users o WHERE o.balance > u.balance) + 1 FROM users u WHERE u.id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(rank)
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Recompute every user's balance and counters from the ledger rows:
    /// grants credited, stakes debited, winning payouts credited.
    pub async fn derived_accounts(&self) -> Result<Vec<DerivedAccount>, DatabaseError> {
        let rows = sqlx::query_as::<_, DerivedAccount>(
            "SELECT u.id AS user_id, u.balance, u.bet_count, u.win_count, \
                (SELECT COALESCE(SUM(g.amount), 0) FROM reward_grants g WHERE g.user_id = u.id) \
                - (SELECT COALESCE(SUM(b.stake), 0) FROM bets b WHERE b.user_id = u.id) * 100 \
                + (SELECT COALESCE(SUM(b.payout), 0) FROM bets b WHERE b.user_id = u.id AND b.status = 1) \
                    AS derived_balance, \
                (SELECT COUNT(*) FROM bets b WHERE b.user_id = u.id) AS derived_bet_count, \
                (SELECT COUNT(*) FROM bets b WHERE b.user_id = u.id AND b.status = 1) AS derived_win_count \
             FROM users u ORDER BY u.id",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Overwrite a user's balance and counters with reconciled values, but only
    /// if they still hold the values the reconciliation was computed from.
    pub async fn repair_account(&self, account: &DerivedAccount) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET balance = ?, bet_count = ?, win_count = ? WHERE id = ? AND balance = ? AND bet_count = ? AND win_count = ?",
        )
        .bind(account.derived_balance)
        .bind(account.derived_bet_count)
        .bind(account.derived_win_count)
        .bind(account.user_id)
        .bind(account.balance)
        .bind(account.bet_count)
        .bind(account.win_count)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
