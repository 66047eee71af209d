//! Error types for `Wagerbook` core library.

use thiserror::Error;

/// Result type alias using `Wagerbook` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `Wagerbook` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
