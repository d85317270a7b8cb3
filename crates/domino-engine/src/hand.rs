//! A player's held tiles.

use serde::{Deserialize, Serialize};

use crate::Tile;

/// The tiles held by one seat.
///
/// Order is display-only: clients address tiles by index, but no rule
/// depends on where a tile sits in the hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    tiles: Vec<Tile>,
}

impl Hand {
    /// Creates a hand holding `tiles` in the given order.
    pub fn new(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    /// Returns the tile at `index`, if any.
    pub fn get(&self, index: usize) -> Option<Tile> {
        self.tiles.get(index).copied()
    }

    /// Removes and returns the tile at `index`, if any.
    pub(crate) fn take(&mut self, index: usize) -> Option<Tile> {
        (index < self.tiles.len()).then(|| self.tiles.remove(index))
    }

    /// Position of `tile` in the hand.
    pub fn position(&self, tile: Tile) -> Option<usize> {
        self.tiles.iter().position(|t| *t == tile)
    }

    /// Sum of pips across all held tiles.
    pub fn pip_total(&self) -> u32 {
        self.tiles.iter().map(Tile::pip_total).sum()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// The held tiles as a slice, in display order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(pairs: &[(u8, u8)]) -> Hand {
        Hand::new(pairs.iter().map(|&(a, b)| Tile::new(a, b).unwrap()).collect())
    }

    #[test]
    fn test_take_removes_only_that_tile() {
        let mut h = hand(&[(0, 1), (2, 3), (4, 5)]);
        assert_eq!(h.take(1), Some(Tile::new(2, 3).unwrap()));
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(1), Some(Tile::new(4, 5).unwrap()));
    }

    #[test]
    fn test_take_out_of_range_leaves_hand_alone() {
        let mut h = hand(&[(0, 1)]);
        assert_eq!(h.take(5), None);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_pip_total_and_position() {
        let h = hand(&[(6, 6), (1, 2)]);
        assert_eq!(h.pip_total(), 15);
        assert_eq!(h.position(Tile::new(2, 1).unwrap()), Some(1));
        assert_eq!(h.position(Tile::new(0, 0).unwrap()), None);
    }
}
