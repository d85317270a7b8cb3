//! Seats and partnerships.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of seats at the table.
pub const SEATS: usize = 4;

/// A fixed position at the table, `0..4`.
///
/// Turn order goes `0 → 1 → 2 → 3 → 0`. The team is derived from seat
/// parity on demand and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Seat(u8);

impl Seat {
    /// Seat 0: first to deal to, and the opener when nobody holds a double.
    pub const FIRST: Seat = Seat(0);

    /// Returns the seat at `index`, or `None` if `index >= 4`.
    pub fn new(index: usize) -> Option<Self> {
        (index < SEATS).then_some(Self(index as u8))
    }

    /// All four seats in turn order.
    pub fn all() -> impl Iterator<Item = Seat> {
        (0..SEATS as u8).map(Seat)
    }

    /// Zero-based seat index.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The seat that moves after this one.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % SEATS as u8)
    }

    /// The partnership this seat belongs to.
    pub fn team(self) -> Team {
        if self.0 % 2 == 0 { Team::A } else { Team::B }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Seat> for usize {
    fn from(seat: Seat) -> Self {
        seat.index()
    }
}

impl TryFrom<usize> for Seat {
    type Error = String;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Seat::new(index).ok_or_else(|| format!("seat {index} is out of range (0-3)"))
    }
}

/// A partnership: seats {0, 2} are team A, seats {1, 3} are team B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    /// Index into per-team arrays such as scores (`A = 0`, `B = 1`).
    pub fn index(self) -> usize {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }

    /// The two seats of this partnership.
    pub fn seats(self) -> [Seat; 2] {
        match self {
            Team::A => [Seat(0), Seat(2)],
            Team::B => [Seat(1), Seat(3)],
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => write!(f, "Team A"),
            Team::B => write!(f, "Team B"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_new_bounds() {
        assert!(Seat::new(3).is_some());
        assert!(Seat::new(4).is_none());
    }

    #[test]
    fn test_seat_next_wraps() {
        let order: Vec<usize> = std::iter::successors(Seat::new(2), |s| Some(s.next()))
            .take(5)
            .map(Seat::index)
            .collect();
        assert_eq!(order, vec![2, 3, 0, 1, 2]);
    }

    #[test]
    fn test_team_from_parity() {
        let teams: Vec<Team> = Seat::all().map(Seat::team).collect();
        assert_eq!(teams, vec![Team::A, Team::B, Team::A, Team::B]);
        assert_eq!(Team::B.seats().map(Seat::index), [1, 3]);
    }
}
