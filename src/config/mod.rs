//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Supabase project URL
    pub supabase_url: String,
    /// Supabase service role key (bypasses RLS - server only!)
    pub supabase_service_role_key: String,
    /// Supabase JWT secret for token verification
    pub supabase_jwt_secret: String,

    /// Allowed client origin for CORS
    pub client_origin: String,

    /// Room simulation tunables
    pub game: GameConfig,
}

/// Tunables for the room lifecycle
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Countdown value announced with `game_starting`
    pub countdown_secs: u32,
    /// Pause between `game_starting` and the first served ball
    pub start_delay: Duration,
    /// Pause between the final tick and `game_ended`
    pub end_grace: Duration,
    /// Per-tick probability of a power-up spawn attempt
    pub power_up_spawn_chance: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 3,
            start_delay: Duration::from_millis(500),
            end_grace: Duration::from_millis(1000),
            power_up_spawn_chance: 0.007,
        }
    }
}

impl GameConfig {
    /// Load game tunables, keeping defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let spawn_chance: f64 =
            parse_or("GAME_POWER_UP_SPAWN_CHANCE", defaults.power_up_spawn_chance)?;
        if !(0.0..=1.0).contains(&spawn_chance) {
            return Err(ConfigError::Invalid("GAME_POWER_UP_SPAWN_CHANCE"));
        }

        Ok(Self {
            countdown_secs: parse_or("GAME_COUNTDOWN_SECS", defaults.countdown_secs)?,
            start_delay: Duration::from_millis(parse_or(
                "GAME_START_DELAY_MS",
                defaults.start_delay.as_millis() as u64,
            )?),
            end_grace: Duration::from_millis(parse_or(
                "GAME_END_GRACE_MS",
                defaults.end_grace.as_millis() as u64,
            )?),
            power_up_spawn_chance: spawn_chance,
        })
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Render provides PORT env var, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            supabase_url: env::var("SUPABASE_URL")
                .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .map_err(|_| ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?,
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?,

            client_origin: env::var("CLIENT_ORIGIN")
                .map_err(|_| ConfigError::Missing("CLIENT_ORIGIN"))?,

            game: GameConfig::from_env()?,
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_defaults_match_lifecycle_timings() {
        let game = GameConfig::default();
        assert_eq!(game.countdown_secs, 3);
        assert_eq!(game.start_delay, Duration::from_millis(500));
        assert_eq!(game.end_grace, Duration::from_secs(1));
    }

    #[test]
    fn unset_variable_keeps_default() {
        let value: u32 = parse_or("PONG_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
