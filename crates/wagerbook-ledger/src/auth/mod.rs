//! Who may use the ledger: name-pair whitelist and password credentials.

pub mod password;
pub mod whitelist;

pub use password::{Argon2Credentials, CredentialError, CredentialVerifier};
pub use whitelist::{RosterWhitelist, Whitelist, WhitelistError};
