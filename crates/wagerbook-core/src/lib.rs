//! `Wagerbook` Core Library
//!
//! Shared functionality for `Wagerbook` components:
//! - `SQLite` pool helpers and the shared `DatabaseError`
//! - Configuration resolution (defaults, settings file, environment)
//! - Fixed-point money and the injectable clock
//! - Tracing initialisation

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod money;
pub mod tracing_init;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use money::Money;
