//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::world::types::RawIntent;

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Base websocket URL of the data store host
    pub server_url: String,
    /// Database module the client subscribes to
    pub module_name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Display name sent with `enter_game` once the subscription is live
    pub player_name: String,
    /// Input transmissions per second
    pub send_rate: u32,
    /// Host loop frames per second
    pub frame_rate: u32,
    /// Exponential follow rate for the camera
    pub camera_follow_speed: f32,

    /// Where the auth token is kept between runs; `None` disables persistence
    pub token_path: Option<PathBuf>,
    /// Scripted input replacing device input (headless runs)
    pub test_input: Option<RawIntent>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3000".to_string(),
            module_name: "justmaple".to_string(),
            log_level: "info".to_string(),
            player_name: "3Blave".to_string(),
            send_rate: 20,
            frame_rate: 60,
            camera_follow_speed: 5.0,
            token_path: Some(PathBuf::from(".maple_token")),
            test_input: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let send_rate = parse_var("MAPLE_SEND_RATE", defaults.send_rate)?;
        if send_rate == 0 {
            return Err(ConfigError::Invalid("MAPLE_SEND_RATE"));
        }
        let frame_rate = parse_var("MAPLE_FRAME_RATE", defaults.frame_rate)?;
        if frame_rate == 0 {
            return Err(ConfigError::Invalid("MAPLE_FRAME_RATE"));
        }

        let test_input = match env::var("MAPLE_TEST_INPUT") {
            Ok(raw) => Some(
                parse_test_input(&raw).ok_or(ConfigError::Invalid("MAPLE_TEST_INPUT"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            server_url: env::var("MAPLE_SERVER_URL").unwrap_or(defaults.server_url),
            module_name: env::var("MAPLE_MODULE_NAME").unwrap_or(defaults.module_name),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            player_name: env::var("MAPLE_PLAYER_NAME").unwrap_or(defaults.player_name),
            send_rate,
            frame_rate,
            camera_follow_speed: parse_var(
                "MAPLE_CAMERA_FOLLOW_SPEED",
                defaults.camera_follow_speed,
            )?,
            token_path: match env::var("MAPLE_TOKEN_PATH") {
                Ok(path) if path.trim().is_empty() => None,
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => defaults.token_path,
            },
            test_input,
        })
    }

    /// Websocket endpoint of the module's subscription stream
    pub fn subscribe_url(&self) -> String {
        format!(
            "{}/v1/database/{}/subscribe",
            self.server_url.trim_end_matches('/'),
            self.module_name
        )
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Parses `"<horizontal>,<jump>"`, e.g. `"0.5,1"`.
fn parse_test_input(raw: &str) -> Option<RawIntent> {
    let (horizontal, jump) = raw.split_once(',')?;
    let horizontal: f32 = horizontal.trim().parse().ok()?;
    let jump_held = match jump.trim() {
        "1" | "true" => true,
        "0" | "false" => false,
        _ => return None,
    };
    Some(RawIntent {
        horizontal,
        jump_held,
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
