//! The board: a chain of placed tiles with two open ends.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineError, PlacedTile, Tile};

/// Which open end of the board a tile attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Result of asking whether a tile can be played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playability {
    /// `true` if the tile attaches to the side that was asked about.
    pub playable: bool,
    /// Every side the tile could attach to right now.
    pub valid_sides: Vec<Side>,
}

/// Played tiles in left-to-right order.
///
/// Invariant: for every adjacent pair, the right value of the first equals
/// the left value of the second.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    tiles: VecDeque<PlacedTile>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedTile> {
        self.tiles.iter()
    }

    /// The exposed pip values as `(left, right)`. `None` on an empty board.
    pub fn ends(&self) -> Option<(u8, u8)> {
        let first = self.tiles.front()?;
        let last = self.tiles.back()?;
        Some((first.left(), last.right()))
    }

    /// The exposed value on one side. `None` on an empty board.
    pub fn end(&self, side: Side) -> Option<u8> {
        self.ends().map(|(left, right)| match side {
            Side::Left => left,
            Side::Right => right,
        })
    }

    /// Sides `tile` could attach to. Both sides when the board is empty.
    pub fn valid_sides(&self, tile: Tile) -> Vec<Side> {
        match self.ends() {
            None => vec![Side::Left, Side::Right],
            Some((left, right)) => {
                let mut sides = Vec::with_capacity(2);
                if tile.has(left) {
                    sides.push(Side::Left);
                }
                if tile.has(right) {
                    sides.push(Side::Right);
                }
                sides
            }
        }
    }

    /// Whether `tile` attaches to `side`, plus every side it would fit.
    pub fn can_play(&self, tile: Tile, side: Side) -> Playability {
        let valid_sides = self.valid_sides(tile);
        Playability {
            playable: valid_sides.contains(&side),
            valid_sides,
        }
    }

    /// Computes how `tile` would sit on `side` without placing it.
    ///
    /// On an empty board the tile is laid low-to-high and `side` is
    /// irrelevant. Otherwise the matching half faces the open end, so the
    /// tile is flipped when needed.
    pub fn orient(&self, tile: Tile, side: Side) -> Result<PlacedTile, EngineError> {
        let illegal = EngineError::IllegalMove { tile, side };
        let placed = match self.end(side) {
            None => PlacedTile::new(tile, tile.low()),
            Some(open) => match side {
                Side::Left => PlacedTile::with_right(tile, open),
                Side::Right => PlacedTile::new(tile, open),
            },
        };
        placed.ok_or(illegal)
    }

    /// Places `tile` on `side` and returns it as oriented on the board.
    ///
    /// # Errors
    /// Returns [`EngineError::IllegalMove`] if neither half matches the
    /// open end. The board is unchanged in that case.
    pub fn place(&mut self, tile: Tile, side: Side) -> Result<PlacedTile, EngineError> {
        let placed = self.orient(tile, side)?;
        match side {
            Side::Left => self.tiles.push_front(placed),
            Side::Right => self.tiles.push_back(placed),
        }
        Ok(placed)
    }

    /// Checks that every adjacent pair of tiles touches with equal pips.
    pub fn check_chain(&self) -> Result<(), EngineError> {
        for (index, pair) in self.tiles.iter().zip(self.tiles.iter().skip(1)).enumerate() {
            let (a, b) = pair;
            if a.right() != b.left() {
                return Err(EngineError::Invariant(format!(
                    "board tiles {index} {a} and {} {b} do not touch",
                    index + 1
                )));
            }
        }
        Ok(())
    }
}
