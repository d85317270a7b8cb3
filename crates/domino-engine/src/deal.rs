//! Distributing the set between hands and the standby pile.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{EngineError, FULL_SET_SIZE, SEATS, Tile, full_set};

/// The outcome of distributing one set: four hands plus the undealt rest.
///
/// Every tile of the double-six set ends up in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    pub(crate) hands: [Vec<Tile>; SEATS],
    pub(crate) standby: Vec<Tile>,
}

impl Deal {
    /// Shuffles a fresh set and deals `hand_size` tiles to each seat.
    ///
    /// Tiles go round-robin in seat order (first tile to seat 0, second to
    /// seat 1, ...). Whatever is left becomes the standby pile.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidHandSize`] if four hands of
    /// `hand_size` don't fit in one set.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R, hand_size: usize) -> Result<Self, EngineError> {
        if hand_size == 0 || hand_size * SEATS > FULL_SET_SIZE {
            return Err(EngineError::InvalidHandSize(hand_size));
        }

        let mut tiles = full_set();
        tiles.shuffle(rng);

        let dealt = hand_size * SEATS;
        let standby = tiles.split_off(dealt);
        let mut hands: [Vec<Tile>; SEATS] = Default::default();
        for (i, tile) in tiles.into_iter().enumerate() {
            hands[i % SEATS].push(tile);
        }

        Ok(Self { hands, standby })
    }

    /// Builds a deal from explicit hands. The standby pile is every tile of
    /// the set that no hand holds, in ascending order.
    ///
    /// # Errors
    /// - [`EngineError::InvalidPlayerCount`] unless exactly four hands are given
    /// - [`EngineError::DuplicateTile`] if a tile appears in two places
    pub fn fixed(hands: Vec<Vec<Tile>>) -> Result<Self, EngineError> {
        let hands: [Vec<Tile>; SEATS] = hands
            .try_into()
            .map_err(|v: Vec<Vec<Tile>>| EngineError::InvalidPlayerCount(v.len()))?;

        let mut seen = HashSet::with_capacity(FULL_SET_SIZE);
        for tile in hands.iter().flatten() {
            if !seen.insert(*tile) {
                return Err(EngineError::DuplicateTile(*tile));
            }
        }

        let standby = full_set()
            .into_iter()
            .filter(|t| !seen.contains(t))
            .collect();

        Ok(Self { hands, standby })
    }

    /// Tiles dealt to each seat, in seat order.
    pub fn hands(&self) -> &[Vec<Tile>; SEATS] {
        &self.hands
    }

    /// Tiles left undealt.
    pub fn standby(&self) -> &[Tile] {
        &self.standby
    }
}
