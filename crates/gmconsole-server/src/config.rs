//! Configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::autofight::Pacing;
use crate::error::AppError;

/// Where dice rolls come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiceBackend {
    /// Local pseudo-random generator.
    Local,
    /// random.org true randomness.
    RandomOrg { api_key: String },
}

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub telnet_port: u16,
    /// First line a telnet session must send.
    pub shared_secret: String,
    pub content_dir: PathBuf,
    /// Players whose sheets are loaded from `players/<name>.json`.
    pub players: Vec<String>,
    pub dice: DiceBackend,
    /// Per-connection outbound queue capacity.
    pub queue_capacity: usize,
    pub pacing: Pacing,
    /// Read commands from stdin.
    pub console: bool,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let shared_secret = lookup("SHARED_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Config("SHARED_SECRET environment variable must be set".to_string()))?;

        let dice = match lookup("DICE_BACKEND").as_deref().unwrap_or("local") {
            "local" => DiceBackend::Local,
            "random-org" => DiceBackend::RandomOrg {
                api_key: lookup("RANDOM_ORG_API_KEY").ok_or_else(|| {
                    AppError::Config("RANDOM_ORG_API_KEY is required for the random-org backend".to_string())
                })?,
            },
            other => {
                return Err(AppError::Config(format!(
                    "DICE_BACKEND must be local or random-org, got {other}"
                )));
            }
        };

        let queue_capacity: usize = parsed(&lookup, "QUEUE_CAPACITY", 256)?;
        if queue_capacity == 0 {
            return Err(AppError::Config("QUEUE_CAPACITY must be at least 1".to_string()));
        }

        let players = lookup("PLAYERS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 8080)?,
            telnet_port: parsed(&lookup, "TELNET_PORT", 2323)?,
            shared_secret,
            content_dir: PathBuf::from(lookup("CONTENT_DIR").unwrap_or_else(|| "content".to_string())),
            players,
            dice,
            queue_capacity,
            pacing: Pacing {
                attack: Duration::from_millis(parsed(&lookup, "AUTOFIGHT_ATTACK_MS", 1_000)?),
                turn: Duration::from_millis(parsed(&lookup, "AUTOFIGHT_TURN_MS", 100)?),
            },
            console: parsed_flag(&lookup, "CONSOLE", true)?,
        })
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
    }
}

fn parsed_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool, AppError> {
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "on" | "yes") => Ok(true),
        Some("0" | "false" | "off" | "no") => Ok(false),
        Some(other) => Err(AppError::Config(format!("{key} must be on or off, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("SHARED_SECRET", "hunter2")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.telnet_port, 2323);
        assert_eq!(config.dice, DiceBackend::Local);
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.pacing, Pacing::default());
        assert!(config.console);
        assert!(config.players.is_empty());
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        assert!(matches!(config(&[]), Err(AppError::Config(_))));
        assert!(matches!(config(&[("SHARED_SECRET", "  ")]), Err(AppError::Config(_))));
    }

    #[test]
    fn test_players_list_is_trimmed() {
        let config = config(&[("SHARED_SECRET", "s"), ("PLAYERS", "sam, kim,,")]).unwrap();
        assert_eq!(config.players, vec!["sam", "kim"]);
    }

    #[test]
    fn test_random_org_requires_key() {
        assert!(config(&[("SHARED_SECRET", "s"), ("DICE_BACKEND", "random-org")]).is_err());
        let config = config(&[
            ("SHARED_SECRET", "s"),
            ("DICE_BACKEND", "random-org"),
            ("RANDOM_ORG_API_KEY", "k"),
        ])
        .unwrap();
        assert_eq!(
            config.dice,
            DiceBackend::RandomOrg {
                api_key: "k".to_owned()
            }
        );
    }

    #[test]
    fn test_bad_numbers_are_errors() {
        assert!(config(&[("SHARED_SECRET", "s"), ("PORT", "eighty")]).is_err());
        assert!(config(&[("SHARED_SECRET", "s"), ("QUEUE_CAPACITY", "0")]).is_err());
        assert!(config(&[("SHARED_SECRET", "s"), ("CONSOLE", "maybe")]).is_err());
    }

    #[test]
    fn test_pacing_and_console_overrides() {
        let config = config(&[
            ("SHARED_SECRET", "s"),
            ("AUTOFIGHT_ATTACK_MS", "0"),
            ("AUTOFIGHT_TURN_MS", "5"),
            ("CONSOLE", "off"),
        ])
        .unwrap();
        assert_eq!(config.pacing.attack, Duration::ZERO);
        assert_eq!(config.pacing.turn, Duration::from_millis(5));
        assert!(!config.console);
    }
}
