//! Simulation configuration loaded from environment variables.
//!
//! Values come from the process environment (after `.env` is loaded) with
//! command-line flags taking precedence.

use bracketeer::TournamentKind;
use std::time::Duration;

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub tournament: TournamentSettings,
    pub reward: RewardSettings,
    pub throttle: ThrottleSettings,
    /// Seed for bracket shuffles and scores; OS entropy when absent
    pub seed: Option<u64>,
}

/// Shape of the simulated tournament
#[derive(Debug, Clone)]
pub struct TournamentSettings {
    pub kind: TournamentKind,
    /// Number of entrants that try to register
    pub participants: u32,
    pub max_teams: Option<u32>,
    pub max_players: Option<u32>,
    /// Time between creation and the start date
    pub registration_window: Duration,
}

/// Currency reward paid to the champion
#[derive(Debug, Clone)]
pub struct RewardSettings {
    pub amount: i64,
    pub fee_percent: u32,
}

/// Per-user registration throttle
#[derive(Debug, Clone)]
pub struct ThrottleSettings {
    /// Attempts allowed per user within one window
    pub max_attempts: usize,
    pub window: Duration,
    /// Most users tracked at once
    pub capacity: usize,
}

impl SimConfig {
    /// Load configuration from environment variables
    ///
    /// Command-line overrides win over the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or a value is out of range
    pub fn from_env(
        kind_override: Option<String>,
        participants_override: Option<u32>,
        seed_override: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let kind = match kind_override.or_else(|| std::env::var("SIM_TOURNAMENT_TYPE").ok()) {
            Some(raw) => parse_kind(&raw)?,
            None => TournamentKind::Solo,
        };

        let participants = match participants_override {
            Some(participants) => participants,
            None => parse_env_or("SIM_PARTICIPANTS", 11)?,
        };

        let seed = match seed_override {
            Some(seed) => Some(seed),
            None => parse_env("SIM_SEED")?,
        };

        let config = Self {
            tournament: TournamentSettings {
                kind,
                participants,
                max_teams: parse_env("SIM_MAX_TEAMS")?,
                max_players: parse_env("SIM_MAX_PLAYERS")?,
                registration_window: Duration::from_millis(parse_env_or(
                    "SIM_REGISTRATION_MILLIS",
                    500,
                )?),
            },
            reward: RewardSettings {
                amount: parse_env_or("SIM_REWARD_AMOUNT", 1_000)?,
                fee_percent: parse_env_or("SIM_FEE_PERCENT", 5)?,
            },
            throttle: ThrottleSettings {
                max_attempts: parse_env_or("REGISTRATION_THROTTLE_MAX", 3)?,
                window: Duration::from_secs(parse_env_or(
                    "REGISTRATION_THROTTLE_WINDOW_SECS",
                    60,
                )?),
                capacity: parse_env_or("REGISTRATION_THROTTLE_CAPACITY", 10_000)?,
            },
            seed,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if any value is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tournament.participants < 2 {
            return Err(ConfigError::Invalid {
                var: "SIM_PARTICIPANTS".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if self.tournament.max_teams == Some(0) {
            return Err(ConfigError::Invalid {
                var: "SIM_MAX_TEAMS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.tournament.max_players == Some(0) {
            return Err(ConfigError::Invalid {
                var: "SIM_MAX_PLAYERS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.reward.amount <= 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_REWARD_AMOUNT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.reward.fee_percent > 100 {
            return Err(ConfigError::Invalid {
                var: "SIM_FEE_PERCENT".to_string(),
                reason: "Must be at most 100".to_string(),
            });
        }

        if self.throttle.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "REGISTRATION_THROTTLE_MAX".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.throttle.window.is_zero() {
            return Err(ConfigError::Invalid {
                var: "REGISTRATION_THROTTLE_WINDOW_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.throttle.capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "REGISTRATION_THROTTLE_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_kind(raw: &str) -> Result<TournamentKind, ConfigError> {
    match raw.to_lowercase().as_str() {
        "team" => Ok(TournamentKind::Team),
        "solo" => Ok(TournamentKind::Solo),
        "mixed" => Ok(TournamentKind::Mixed),
        _ => Err(ConfigError::Invalid {
            var: "SIM_TOURNAMENT_TYPE".to_string(),
            reason: format!("'{raw}' is not one of team, solo, mixed"),
        }),
    }
}

/// Helper to parse an environment variable that may be unset
///
/// A set but malformed value is an error rather than a silent default.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    Ok(parse_env(key)?.unwrap_or(default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{raw}' is not a valid value"),
    })
}
