//! Room configuration.

use domino_engine::{MatchConfig, SEATS};
use serde::{Deserialize, Serialize};

/// Players per room. Fixed: partnership dominoes needs exactly four.
pub const ROOM_CAPACITY: usize = SEATS;

/// Settings shared by every room a coordinator creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Longest accepted player name or room id, in characters.
    pub max_name_len: usize,

    /// Bound of each room actor's command channel. When it fills up,
    /// callers wait.
    pub channel_size: usize,

    /// Rules for the match each room runs.
    pub match_config: MatchConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_name_len: 24,
            channel_size: 64,
            match_config: MatchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.max_name_len, 24);
        assert_eq!(config.channel_size, 64);
        assert_eq!(config.match_config, MatchConfig::default());
        assert_eq!(ROOM_CAPACITY, 4);
    }
}
