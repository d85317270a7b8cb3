//! Match rules that vary between tables.

use serde::{Deserialize, Serialize};

use crate::{EngineError, FULL_SET_SIZE, SEATS};

/// House rules for a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Points a team needs to win the match. Each round is worth one point.
    pub target_score: u32,

    /// Tiles dealt to each seat. Whatever is left over goes to standby.
    pub hand_size: usize,

    /// When `true`, a pass is rejected if the mover holds a playable tile.
    /// When `false`, the server trusts the client's decision to pass.
    pub strict_pass: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            target_score: 1,
            hand_size: 6,
            strict_pass: false,
        }
    }
}

impl MatchConfig {
    /// Checks that the hand size can be dealt and the target is reachable.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidHandSize`] for a hand size of zero or
    /// one that needs more than 28 tiles in total, and
    /// [`EngineError::InvalidTargetScore`] for a target of zero.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.target_score == 0 {
            return Err(EngineError::InvalidTargetScore);
        }
        if self.hand_size == 0 || self.hand_size * SEATS > FULL_SET_SIZE {
            return Err(EngineError::InvalidHandSize(self.hand_size));
        }
        Ok(())
    }
}
