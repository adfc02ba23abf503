//! Game invariants - sanity checks that detect bugs.
//!
//! These should never trigger for a state reached through `play_turn` from a
//! full deal. Tests run them after every play.

use crate::card::{Card, DECK_SIZE};
use crate::game::{GameState, TRICKS_PER_DEAL};
use crate::player::SEATS;
use std::collections::HashSet;
use thiserror::Error;

/// Ten-rank cards in a deck
const TENS_IN_DECK: u8 = 4;

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invariant violation: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl GameState {
    /// Check all table invariants.
    ///
    /// Returns a list of violations found, or empty if all invariants hold.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if self.players.len() != SEATS {
            violations.push(InvariantViolation::new(format!(
                "expected {} seats, found {}",
                SEATS,
                self.players.len()
            )));
        }

        // Every card is in exactly one place
        let mut seen: HashSet<Card> = HashSet::with_capacity(DECK_SIZE);
        let mut total = 0usize;
        let held = self.players.iter().flat_map(|p| p.hand.cards().iter().copied());
        let played = self
            .tricks
            .iter()
            .chain(std::iter::once(&self.current_trick))
            .flat_map(|t| t.plays().iter().map(|p| p.card));
        for card in held.chain(played) {
            total += 1;
            if !seen.insert(card) {
                violations.push(InvariantViolation::new(format!("{card} appears twice")));
            }
        }
        if total != DECK_SIZE {
            violations.push(InvariantViolation::new(format!(
                "{total} cards accounted for, expected {DECK_SIZE}"
            )));
        }

        let tens_resolved: u8 = self.tricks.iter().map(|t| t.tens()).sum();
        let tens_total = self.tens_count[0] + self.tens_count[1];
        if tens_total > TENS_IN_DECK || tens_total != tens_resolved {
            violations.push(InvariantViolation::new(format!(
                "tens tally {:?} does not match {} tens in completed tricks",
                self.tens_count, tens_resolved
            )));
        }

        let tricks_total = (self.tricks_won[0] + self.tricks_won[1]) as usize;
        if tricks_total != self.tricks.len() || tricks_total > TRICKS_PER_DEAL {
            violations.push(InvariantViolation::new(format!(
                "tricks won {:?} does not match {} completed tricks",
                self.tricks_won,
                self.tricks.len()
            )));
        }

        if self.current_turn as usize >= SEATS {
            violations.push(InvariantViolation::new(format!(
                "current turn {} is not a seat",
                self.current_turn
            )));
        }

        if self.current_trick.len() >= SEATS {
            violations.push(InvariantViolation::new(format!(
                "current trick holds {} plays",
                self.current_trick.len()
            )));
        }

        violations
    }
}
