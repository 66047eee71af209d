//! `Wagerbook` HTTP server.
//!
//! Thin axum surface over the ledger; see [`routes::build_router`].

pub mod routes;
