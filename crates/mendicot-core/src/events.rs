//! Events produced by play actions.
//!
//! `GameState::play_turn` returns these in the order viewers must apply them.

use crate::card::{Card, Suit};
use crate::player::{PlayerId, Team};
use serde::{Deserialize, Serialize};

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "team", rename_all = "snake_case")]
pub enum Outcome {
    Win(Team),
    Tie,
}

impl Outcome {
    pub fn winning_team(&self) -> Option<Team> {
        match self {
            Outcome::Win(team) => Some(*team),
            Outcome::Tie => None,
        }
    }
}

/// Events that occur as a result of a play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A card left a seat's hand and joined the current trick
    CardPlayed {
        seat: PlayerId,
        card: Card,
        /// Seat to act once this play has fully resolved
        next_turn: PlayerId,
    },

    /// The fourth card of a trick was played and the trick was judged
    TrickCompleted {
        winner: PlayerId,
        tens: u8,
        tricks_won: [u8; 2],
        tens_count: [u8; 2],
        next_turn: PlayerId,
    },

    /// The deal is decided
    GameOver {
        outcome: Outcome,
        tricks_won: [u8; 2],
        tens_count: [u8; 2],
        trump: Suit,
    },
}
