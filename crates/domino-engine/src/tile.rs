//! Domino tiles.
//!
//! A [`Tile`] is the identity of a piece: an unordered pair of pip values.
//! A [`PlacedTile`] is a tile on the board together with the value that
//! faces left, so orientation never leaks back into the tile itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Highest pip value on a double-six set.
pub const MAX_PIP: u8 = 6;

/// Number of unique tiles in a double-six set.
pub const FULL_SET_SIZE: usize = 28;

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// A domino piece.
///
/// Pips are stored normalized (`low <= high`), so the derived `Eq` and
/// `Hash` treat `(3,5)` and `(5,3)` as the same tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "TilePips", into = "TilePips")]
pub struct Tile {
    low: u8,
    high: u8,
}

impl Tile {
    /// Creates a tile from two pip values in any order.
    ///
    /// # Errors
    /// Returns [`EngineError::PipOutOfRange`] if either value exceeds 6.
    pub fn new(a: u8, b: u8) -> Result<Self, EngineError> {
        for pip in [a, b] {
            if pip > MAX_PIP {
                return Err(EngineError::PipOutOfRange(pip));
            }
        }
        Ok(Self::normalized(a, b))
    }

    /// Crate-internal constructor for values already known to be in range.
    pub(crate) const fn normalized(a: u8, b: u8) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The smaller pip value.
    pub fn low(&self) -> u8 {
        self.low
    }

    /// The larger pip value.
    pub fn high(&self) -> u8 {
        self.high
    }

    /// Returns `true` if both halves show the same value.
    pub fn is_double(&self) -> bool {
        self.low == self.high
    }

    /// Sum of both halves. Used for closed-game scoring.
    pub fn pip_total(&self) -> u32 {
        u32::from(self.low) + u32::from(self.high)
    }

    /// Returns `true` if either half shows `value`.
    pub fn has(&self, value: u8) -> bool {
        self.low == value || self.high == value
    }

    /// Given one half, returns the other. `None` if `value` isn't on the tile.
    pub fn other(&self, value: u8) -> Option<u8> {
        if self.low == value {
            Some(self.high)
        } else if self.high == value {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}]", self.low, self.high)
    }
}

/// Wire shape of a tile: `[low, high]`.
#[derive(Serialize, Deserialize)]
struct TilePips(u8, u8);

impl From<Tile> for TilePips {
    fn from(tile: Tile) -> Self {
        TilePips(tile.low, tile.high)
    }
}

impl TryFrom<TilePips> for Tile {
    type Error = EngineError;

    fn try_from(pips: TilePips) -> Result<Self, Self::Error> {
        Tile::new(pips.0, pips.1)
    }
}

/// Builds the 28-tile double-six set in ascending order.
pub fn full_set() -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(FULL_SET_SIZE);
    for a in 0..=MAX_PIP {
        for b in a..=MAX_PIP {
            tiles.push(Tile::normalized(a, b));
        }
    }
    tiles
}

// ---------------------------------------------------------------------------
// PlacedTile
// ---------------------------------------------------------------------------

/// A tile on the board, oriented so that `left` faces the left end.
///
/// The tile is a copy; flipping a placed tile never changes the value
/// held in anyone's hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrientedPips", into = "OrientedPips")]
pub struct PlacedTile {
    tile: Tile,
    left: u8,
}

impl PlacedTile {
    /// Places `tile` with `left` facing left. `None` if `left` isn't on the tile.
    pub fn new(tile: Tile, left: u8) -> Option<Self> {
        tile.has(left).then_some(Self { tile, left })
    }

    /// Places `tile` so that `right` faces right. `None` if `right` isn't on the tile.
    pub fn with_right(tile: Tile, right: u8) -> Option<Self> {
        tile.other(right).map(|left| Self { tile, left })
    }

    /// The underlying tile, orientation stripped.
    pub fn tile(&self) -> Tile {
        self.tile
    }

    /// Value facing the left end of the board.
    pub fn left(&self) -> u8 {
        self.left
    }

    /// Value facing the right end of the board.
    pub fn right(&self) -> u8 {
        // `left` is always on the tile, so `other` can't miss.
        self.tile.other(self.left).unwrap_or(self.left)
    }
}

impl fmt::Display for PlacedTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}]", self.left(), self.right())
    }
}

/// Wire shape of a placed tile: `{ "left": 5, "right": 3 }`.
#[derive(Serialize, Deserialize)]
struct OrientedPips {
    left: u8,
    right: u8,
}

impl From<PlacedTile> for OrientedPips {
    fn from(placed: PlacedTile) -> Self {
        OrientedPips {
            left: placed.left(),
            right: placed.right(),
        }
    }
}

impl TryFrom<OrientedPips> for PlacedTile {
    type Error = EngineError;

    fn try_from(pips: OrientedPips) -> Result<Self, Self::Error> {
        let tile = Tile::new(pips.left, pips.right)?;
        Ok(PlacedTile {
            tile,
            left: pips.left,
        })
    }
}
