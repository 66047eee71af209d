//! Data models for Wagerbook ledger storage.

use serde::{Deserialize, Serialize};
use wagerbook_core::Money;

/// A column held a value outside its enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: i64,
}

macro_rules! int_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            $($variant = $value),+
        }

        impl TryFrom<i64> for $name {
            type Error = UnknownVariant;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant { kind: stringify!($name), value }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(v: $name) -> Self {
                v as Self
            }
        }
    };
}

int_enum! {
    /// Tournament stage of a match.
    MatchStage {
        GroupStage = 0,
        RoundOf16 = 1,
        QuarterFinal = 2,
        SemiFinal = 3,
        ThirdPlace = 4,
        Final = 5,
    }
}

int_enum! {
    /// Outcome of a match, also used as the prediction of a bet.
    MatchResult {
        NotStarted = 0,
        HomeWin = 1,
        AwayWin = 2,
        Draw = 3,
    }
}

int_enum! {
    /// Settlement state of a bet.
    BetStatus {
        Pending = 0,
        Won = 1,
        Lost = 2,
    }
}

impl MatchResult {
    /// Whether this is a final outcome that bets can be settled against.
    pub const fn is_decisive(self) -> bool {
        !matches!(self, Self::NotStarted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub chinese_name: String,
    pub english_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub balance: Money,
    pub win_count: i64,
    pub bet_count: i64,
    pub reset_password_allowed: bool,
    pub last_login_at: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: i64,
    pub home_team: String,
    pub away_team: String,
    pub home_win_odds: f64,
    pub away_win_odds: f64,
    pub draw_odds: f64,
    pub scheduled_at: String,
    pub group_label: String,
    #[sqlx(try_from = "i64")]
    pub stage: MatchStage,
    #[sqlx(try_from = "i64")]
    pub result: MatchResult,
    pub betting_disabled: bool,
    pub display_enabled: bool,
    pub updated_at: i64,
}

impl Match {
    /// Current odds for a predicted outcome. `NotStarted` has no odds.
    pub const fn odds_for(&self, prediction: MatchResult) -> Option<f64> {
        match prediction {
            MatchResult::HomeWin => Some(self.home_win_odds),
            MatchResult::AwayWin => Some(self.away_win_odds),
            MatchResult::Draw => Some(self.draw_odds),
            MatchResult::NotStarted => None,
        }
    }

    /// Bets are accepted only while betting is enabled and no result is in.
    pub const fn accepts_bets(&self) -> bool {
        !self.betting_disabled && !self.result.is_decisive()
    }
}

/// Editable fields of a match, used for both creation and result posting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchFields {
    pub home_team: String,
    pub away_team: String,
    pub home_win_odds: f64,
    pub away_win_odds: f64,
    pub draw_odds: f64,
    pub scheduled_at: String,
    #[serde(default)]
    pub group_label: String,
    pub stage: MatchStage,
    #[serde(default)]
    pub betting_disabled: bool,
    #[serde(default = "default_display")]
    pub display_enabled: bool,
}

const fn default_display() -> bool {
    true
}

impl From<&Match> for MatchFields {
    fn from(m: &Match) -> Self {
        Self {
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            home_win_odds: m.home_win_odds,
            away_win_odds: m.away_win_odds,
            draw_odds: m.draw_odds,
            scheduled_at: m.scheduled_at.clone(),
            group_label: m.group_label.clone(),
            stage: m.stage,
            betting_disabled: m.betting_disabled,
            display_enabled: m.display_enabled,
        }
    }
}

impl MatchFields {
    /// Reject fields no match can carry.
    pub fn validate(&self) -> Result<(), String> {
        if self.home_team.trim().is_empty() || self.away_team.trim().is_empty() {
            return Err("team names must not be empty".into());
        }
        if self.home_team == self.away_team {
            return Err("a team cannot play itself".into());
        }
        for (name, odds) in [
            ("home_win_odds", self.home_win_odds),
            ("away_win_odds", self.away_win_odds),
            ("draw_odds", self.draw_odds),
        ] {
            if !odds.is_finite() || odds <= 0.0 {
                return Err(format!("{name} must be a positive number, got {odds}"));
            }
        }
        if self.scheduled_at.trim().is_empty() {
            return Err("scheduled_at must not be empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bet {
    pub user_id: i64,
    pub match_id: i64,
    /// Whole units.
    pub stake: i64,
    #[sqlx(try_from = "i64")]
    pub predicted: MatchResult,
    pub odds: f64,
    #[sqlx(try_from = "i64")]
    pub status: BetStatus,
    pub payout: Money,
    pub placed_at: i64,
    pub settled_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RewardGrant {
    pub id: i64,
    pub user_id: i64,
    pub reward_day: String,
    pub amount: Money,
    pub kind: String,
    pub granted_at: String,
}

/// Leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Standing {
    pub user_id: i64,
    pub chinese_name: String,
    pub english_name: String,
    pub balance: Money,
    pub win_count: i64,
    pub bet_count: i64,
}

/// Grant kinds recorded in `reward_grants.kind`.
pub mod grant_kind {
    pub const SIGNUP: &str = "signup";
    pub const DAILY: &str = "daily";
}
