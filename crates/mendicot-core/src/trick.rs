//! Trick evaluation.
//!
//! A trick is judged by a single comparison pass over its plays. Legality of
//! each play is checked by the game state before the card reaches the trick.

use crate::card::{Card, Suit};
use crate::player::{PlayerId, Team, SEATS};
use serde::{Deserialize, Serialize};

/// One card played by one seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub seat: PlayerId,
    pub card: Card,
}

/// Outcome of a completed trick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickResult {
    pub winner: PlayerId,
    pub team: Team,
    /// Ten-rank cards captured by the winning team
    pub tens: u8,
}

/// Plays in the order they were made, starting with the leader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trick {
    plays: Vec<Play>,
}

impl Trick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_plays(plays: Vec<Play>) -> Self {
        Self { plays }
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    /// Whether every seat has played
    pub fn is_complete(&self) -> bool {
        self.plays.len() == SEATS
    }

    pub fn push(&mut self, seat: PlayerId, card: Card) {
        self.plays.push(Play { seat, card });
    }

    /// Suit of the first card played
    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|p| p.card.suit)
    }

    /// Ten-rank cards in this trick
    pub fn tens(&self) -> u8 {
        self.plays.iter().filter(|p| p.card.is_ten()).count() as u8
    }

    /// The winning play so far.
    ///
    /// A play overtakes the current winner if it is trump over non-trump, or
    /// the same suit as the winner with a strictly higher rank.
    pub fn winning_play(&self, trump: Suit) -> Option<Play> {
        let (first, rest) = self.plays.split_first()?;
        let mut best = *first;
        for play in rest {
            let trumps_it = play.card.suit == trump && best.card.suit != trump;
            let beats_it = play.card.suit == best.card.suit && play.card.rank > best.card.rank;
            if trumps_it || beats_it {
                best = *play;
            }
        }
        Some(best)
    }

    /// Judge a completed trick. Returns `None` while plays are missing.
    pub fn evaluate(&self, trump: Suit) -> Option<TrickResult> {
        if !self.is_complete() {
            return None;
        }
        let winner = self.winning_play(trump)?.seat;
        Some(TrickResult {
            winner,
            team: Team::of(winner),
            tens: self.tens(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank;

    fn trick(plays: &[(PlayerId, Suit, Rank)]) -> Trick {
        Trick::from_plays(
            plays
                .iter()
                .map(|&(seat, suit, rank)| Play {
                    seat,
                    card: Card::new(suit, rank),
                })
                .collect(),
        )
    }

    #[test]
    fn test_trump_beats_higher_lead() {
        let t = trick(&[
            (0, Suit::Spades, Rank::Five),
            (1, Suit::Spades, Rank::Ace),
            (2, Suit::Hearts, Rank::Two),
            (3, Suit::Spades, Rank::King),
        ]);

        let result = t.evaluate(Suit::Hearts).unwrap();
        assert_eq!(result.winner, 2);
        assert_eq!(result.team, Team::of(0));
        assert_eq!(result.tens, 0);
    }

    #[test]
    fn test_highest_of_lead_suit_wins_without_trump() {
        let t = trick(&[
            (1, Suit::Clubs, Rank::Nine),
            (2, Suit::Clubs, Rank::Queen),
            (3, Suit::Diamonds, Rank::Ace),
            (0, Suit::Clubs, Rank::Ten),
        ]);

        let result = t.evaluate(Suit::Hearts).unwrap();
        assert_eq!(result.winner, 2);
        assert_eq!(result.tens, 1);
    }

    #[test]
    fn test_off_suit_never_overtakes() {
        let t = trick(&[
            (0, Suit::Clubs, Rank::Two),
            (1, Suit::Diamonds, Rank::Ace),
            (2, Suit::Spades, Rank::Ace),
            (3, Suit::Diamonds, Rank::King),
        ]);

        assert_eq!(t.evaluate(Suit::Hearts).unwrap().winner, 0);
    }

    #[test]
    fn test_higher_trump_overtakes_trump() {
        let t = trick(&[
            (3, Suit::Clubs, Rank::Ace),
            (0, Suit::Hearts, Rank::Three),
            (1, Suit::Hearts, Rank::Ten),
            (2, Suit::Clubs, Rank::Ten),
        ]);

        let result = t.evaluate(Suit::Hearts).unwrap();
        assert_eq!(result.winner, 1);
        assert_eq!(result.team, Team::of(1));
        assert_eq!(result.tens, 2);
    }

    #[test]
    fn test_trump_lead_wins_against_off_suit() {
        let t = trick(&[
            (0, Suit::Hearts, Rank::Two),
            (1, Suit::Spades, Rank::Ace),
            (2, Suit::Clubs, Rank::Ace),
            (3, Suit::Diamonds, Rank::Ace),
        ]);

        assert_eq!(t.evaluate(Suit::Hearts).unwrap().winner, 0);
    }

    #[test]
    fn test_incomplete_trick_has_no_result() {
        let t = trick(&[(0, Suit::Hearts, Rank::Two)]);
        assert_eq!(t.evaluate(Suit::Hearts), None);
        assert_eq!(t.lead_suit(), Some(Suit::Hearts));
        assert_eq!(t.winning_play(Suit::Spades).map(|p| p.seat), Some(0));
    }
}
