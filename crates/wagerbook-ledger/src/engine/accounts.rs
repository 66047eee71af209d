//! Registration, login and password resets.
//!
//! Users are identified by their name pair. The first successful
//! authorization of an unknown pair registers it and books the signup grant
//! for the current day.

use serde::Serialize;
use tracing::{info, instrument, warn};
use wagerbook_core::clock::{day_key, timestamp_key};

use super::Ledger;
use crate::error::{LedgerError, Result};
use crate::storage::{NewUser, User};

/// Outcome of [`Ledger::authorize`].
#[derive(Debug, Clone, Serialize)]
pub struct Authorization {
    pub user: User,
    /// The call created the account.
    pub first_login: bool,
}

fn clean_names<'a>(chinese_name: &'a str, english_name: &'a str) -> Result<(&'a str, &'a str)> {
    let chinese_name = chinese_name.trim();
    let english_name = english_name.trim();
    if chinese_name.is_empty() || english_name.is_empty() {
        return Err(LedgerError::invalid("both names are required"));
    }
    Ok((chinese_name, english_name))
}

impl Ledger {
    fn check_whitelist(&self, chinese_name: &str, english_name: &str) -> Result<()> {
        if self.settings.whitelist_enabled
            && !self.whitelist.is_authorized(chinese_name, english_name)
        {
            warn!(chinese_name, english_name, "Name pair not whitelisted");
            return Err(LedgerError::NotWhitelisted);
        }
        Ok(())
    }

    async fn user_by_names(&self, chinese_name: &str, english_name: &str) -> Result<User> {
        self.db
            .find_user_by_names(chinese_name, english_name)
            .await?
            .ok_or(LedgerError::UserNotFound)
    }

    /// Log in, registering the name pair on first use.
    ///
    /// A wrong password for an existing user is accepted only while that
    /// user's reset permission is set; it then becomes the new password.
    #[instrument(skip(self, password), fields(op = "Authorize"))]
    pub async fn authorize(
        &self,
        chinese_name: &str,
        english_name: &str,
        password: &str,
    ) -> Result<Authorization> {
        let (chinese_name, english_name) = clean_names(chinese_name, english_name)?;
        if password.is_empty() {
            return Err(LedgerError::invalid("password is required"));
        }
        self.check_whitelist(chinese_name, english_name)?;

        let now = self.clock.now();
        let login_at = timestamp_key(now);

        if let Some(user) = self
            .db
            .find_user_by_names(chinese_name, english_name)
            .await?
        {
            return self.login(user, password, &login_at).await;
        }

        let hash = self.credentials.hash(password)?;
        let reward_day = day_key(now.date_naive());
        let created = self
            .db
            .create_user(&NewUser {
                chinese_name,
                english_name,
                password_hash: &hash,
                initial_balance: self.settings.initial_balance,
                reward_day: &reward_day,
                login_at: &login_at,
                created_at: now.timestamp(),
            })
            .await;

        match created {
            Ok(user) => {
                info!(user_id = user.id, chinese_name, english_name, "User registered");
                Ok(Authorization {
                    user,
                    first_login: true,
                })
            }
            // Registered concurrently; treat as a login.
            Err(e) if e.is_conflict() => {
                let user = self.user_by_names(chinese_name, english_name).await?;
                self.login(user, password, &login_at).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn login(&self, user: User, password: &str, login_at: &str) -> Result<Authorization> {
        let new_hash = if self.credentials.verify(password, &user.password_hash)? {
            None
        } else if user.reset_password_allowed {
            Some(self.credentials.hash(password)?)
        } else {
            warn!(user_id = user.id, "Failed login attempt");
            return Err(LedgerError::IncorrectPassword);
        };

        let reset = new_hash.is_some();
        let user = self
            .db
            .record_login(user.id, login_at, new_hash.as_deref())
            .await?;
        info!(user_id = user.id, password_reset = reset, "User logged in");

        Ok(Authorization {
            user,
            first_login: false,
        })
    }

    /// Replace a password, consuming the user's reset permission.
    #[instrument(skip(self, password), fields(op = "ResetPassword"))]
    pub async fn reset_password(
        &self,
        chinese_name: &str,
        english_name: &str,
        password: &str,
    ) -> Result<()> {
        let (chinese_name, english_name) = clean_names(chinese_name, english_name)?;
        if password.is_empty() {
            return Err(LedgerError::invalid("password is required"));
        }
        self.check_whitelist(chinese_name, english_name)?;

        let user = self.user_by_names(chinese_name, english_name).await?;
        if !user.reset_password_allowed {
            return Err(LedgerError::ResetNotAllowed);
        }

        let hash = self.credentials.hash(password)?;
        if !self.db.reset_password(user.id, &hash).await? {
            return Err(LedgerError::ResetNotAllowed);
        }

        info!(user_id = user.id, "Password reset");
        Ok(())
    }

    /// Let the user's next login or reset overwrite their password.
    #[instrument(skip(self), fields(op = "GrantResetPassword"))]
    pub async fn grant_reset_password(&self, chinese_name: &str, english_name: &str) -> Result<User> {
        let (chinese_name, english_name) = clean_names(chinese_name, english_name)?;
        let user = self.user_by_names(chinese_name, english_name).await?;

        if !self.db.set_reset_password_allowed(user.id, true).await? {
            return Err(LedgerError::UserNotFound);
        }

        info!(user_id = user.id, "Password reset granted");
        Ok(self.db.get_user(user.id).await?)
    }

    /// Admit a new name pair to the whitelist.
    #[instrument(skip(self), fields(op = "AddWhitelistEntry"))]
    pub fn add_whitelist_entry(&self, chinese_name: &str, english_name: &str) -> Result<()> {
        let (chinese_name, english_name) = clean_names(chinese_name, english_name)?;
        self.whitelist.add(chinese_name, english_name)?;
        Ok(())
    }
}
