//! Server configuration loaded from environment variables.
//!
//! Every setting comes from the environment, or from a `.env` file loaded
//! through `dotenvy`:
//!
//! | variable                   | default          |
//! |----------------------------|------------------|
//! | `DOMINO_LISTEN_ADDR`       | `127.0.0.1:3001` |
//! | `DOMINO_TARGET_SCORE`      | `1`              |
//! | `DOMINO_HAND_SIZE`         | `6`              |
//! | `DOMINO_STRICT_PASS`       | `false`          |
//! | `DOMINO_IDLE_TIMEOUT_SECS` | `0` (off)        |
//! | `DOMINO_ROOM_CHANNEL_SIZE` | `64`             |

use std::net::SocketAddr;
use std::time::Duration;

use domino_engine::MatchConfig;
use domino_room::RoomConfig;

use crate::DominoError;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 0;

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to accept WebSocket connections on.
    pub listen_addr: SocketAddr,

    /// Close a connection that sends nothing, not even a WebSocket ping,
    /// for this long. `None` (the default) never times out: a player who
    /// stays connected keeps their seat however long the others take.
    pub idle_timeout: Option<Duration>,

    /// Settings for every room, including the match rules.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            idle_timeout: None,
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the process environment, after applying
    /// an optional `.env` file.
    ///
    /// # Errors
    ///
    /// [`DominoError::Config`] if `DOMINO_LISTEN_ADDR` doesn't parse as a
    /// socket address, [`DominoError::Engine`] if the match rules can't be
    /// dealt (hand size or target score).
    pub fn from_env() -> Result<Self, DominoError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unset or unparseable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DominoError> {
        let raw_addr = lookup("DOMINO_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse()
            .map_err(|e| DominoError::Config(format!("DOMINO_LISTEN_ADDR={raw_addr}: {e}")))?;

        let defaults = MatchConfig::default();
        let match_config = MatchConfig {
            target_score: parse_var(&lookup, "DOMINO_TARGET_SCORE", defaults.target_score),
            hand_size: parse_var(&lookup, "DOMINO_HAND_SIZE", defaults.hand_size),
            strict_pass: parse_bool(&lookup, "DOMINO_STRICT_PASS", defaults.strict_pass),
        };
        match_config.validate()?;

        let idle_secs = parse_var(&lookup, "DOMINO_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS);
        let room = RoomConfig {
            channel_size: parse_var(&lookup, "DOMINO_ROOM_CHANNEL_SIZE", RoomConfig::default().channel_size),
            match_config,
            ..RoomConfig::default()
        };

        Ok(Self {
            listen_addr,
            idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
            room,
        })
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid value, using default");
            default
        }),
        None => default,
    }
}

/// Parses a boolean. Accepts `true`/`1`/`yes` and `false`/`0`/`no`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes") => true,
        Some("false" | "0" | "no") => false,
        _ => default,
    }
}
