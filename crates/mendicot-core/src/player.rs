//! Seats, teams and hands.
//!
//! This module contains:
//! - PlayerId (seat index) and the fixed seat count
//! - Team membership derived from seat parity
//! - Hand as an unordered bag of cards

use crate::card::{Card, Suit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seat index, 0-3, assigned in join order
pub type PlayerId = u8;

/// Seats at a Mendicot table
pub const SEATS: usize = 4;

/// Seat after `seat` in play order
pub fn next_seat(seat: PlayerId) -> PlayerId {
    (seat + 1) % SEATS as PlayerId
}

/// A partnership. Seats 0 and 2 form team 0, seats 1 and 3 form team 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team(u8);

impl Team {
    pub const ALL: [Team; 2] = [Team(0), Team(1)];

    /// Team of a seat
    pub fn of(seat: PlayerId) -> Self {
        Team(seat % 2)
    }

    /// Index into per-team tallies
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn other(&self) -> Self {
        Team(1 - self.0)
    }

    /// Whether `seat` plays for this team
    pub fn contains(&self, seat: PlayerId) -> bool {
        Team::of(seat) == *self
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team {}", self.0)
    }
}

/// The cards a seat currently holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }

    /// Whether any card of `suit` is held
    pub fn has_suit(&self, suit: Suit) -> bool {
        self.cards.iter().any(|c| c.suit == suit)
    }

    /// Remove a card, returning it if it was held
    pub fn remove(&mut self, card: &Card) -> Option<Card> {
        let index = self.cards.iter().position(|c| c == card)?;
        Some(self.cards.swap_remove(index))
    }

    /// Cards grouped by suit then ascending rank, for display
    pub fn sorted(&self) -> Vec<Card> {
        let mut cards = self.cards.clone();
        cards.sort_by_key(|c| (Suit::ALL.iter().position(|s| *s == c.suit), c.rank));
        cards
    }
}

/// A seated player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub seat: PlayerId,
    pub hand: Hand,
}

impl Player {
    pub fn new(seat: PlayerId, cards: Vec<Card>) -> Self {
        Self {
            seat,
            hand: Hand::new(cards),
        }
    }

    pub fn team(&self) -> Team {
        Team::of(self.seat)
    }
}
