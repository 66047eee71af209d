//! Database connection and initialization.

pub use wagerbook_core::db::DatabaseError;

wagerbook_core::define_database!(LedgerDatabase, "Ledger database migrations complete");

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_works() {
        let db = LedgerDatabase::open_in_memory().await;
        assert!(db.is_ok());
    }

    #[tokio::test]
    async fn open_file_runs_migrations() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let db = LedgerDatabase::open(&dir.path().join("ledger.db"))
            .await
            .unwrap_or_else(|e| panic!("open: {e}"));
        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'matches', 'bets', 'reward_grants')",
        )
        .fetch_one(db.pool())
        .await
        .unwrap_or_else(|e| panic!("query: {e}"));
        assert_eq!(tables.0, 4);
    }
}
