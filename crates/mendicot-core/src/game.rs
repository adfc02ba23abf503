//! Core game state machine.
//!
//! This module contains the main `GameState` struct: dealing, trump
//! selection, turn sequencing, tens scoring and win/tie detection.

use crate::card::{Card, Deck, Suit};
use crate::events::{GameEvent, Outcome};
use crate::player::{next_seat, Hand, Player, PlayerId, Team, SEATS};
use crate::trick::{Trick, TrickResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Tricks in a full deal
pub const TRICKS_PER_DEAL: usize = 13;

/// Tens a team must exceed to win outright
const TENS_TO_WIN: u8 = 2;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    InProgress,
    Complete { outcome: Outcome },
}

/// Errors that can occur when playing a card.
///
/// Variants are listed in the order they are checked.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Game is over")]
    GameOver,

    #[error("Player not found: seat {0}")]
    PlayerNotFound(PlayerId),

    #[error("Not your turn: seat {current} is to play")]
    NotYourTurn { seat: PlayerId, current: PlayerId },

    #[error("Invalid card: {0} is not in hand")]
    InvalidCard(Card),

    #[error("Must follow the lead suit {lead}")]
    MustFollowSuit { lead: Suit },
}

impl GameError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            GameError::GameOver => "game_over",
            GameError::PlayerNotFound(_) => "player_not_found",
            GameError::NotYourTurn { .. } => "not_your_turn",
            GameError::InvalidCard(_) => "invalid_card",
            GameError::MustFollowSuit { .. } => "must_follow_suit",
        }
    }
}

/// Table rules that vary between hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOptions {
    /// A seat holding the lead suit must play it
    pub follow_suit: bool,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self { follow_suit: true }
    }
}

/// The complete game state for one deal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// All four seats, indexed by seat
    pub(crate) players: Vec<Player>,
    pub(crate) trump: Suit,
    /// Completed tricks, oldest first
    pub(crate) tricks: Vec<Trick>,
    pub(crate) tens_count: [u8; 2],
    pub(crate) tricks_won: [u8; 2],
    pub(crate) current_trick: Trick,
    pub(crate) current_turn: PlayerId,
    pub(crate) last_trick_winner: Option<PlayerId>,
    pub(crate) phase: GamePhase,
    options: GameOptions,
}

impl GameState {
    /// Shuffle, deal and pick trump from a random card in seat 0's hand
    pub fn new<R: Rng>(rng: &mut R, options: GameOptions) -> Self {
        let hands = Deck::shuffled(rng).deal();
        let pick = rng.gen_range(0..hands[0].len());
        let trump = hands[0][pick].suit;
        Self::from_hands(hands, trump, options)
    }

    /// Deterministic deal for a given seed
    pub fn with_seed(seed: u64, options: GameOptions) -> Self {
        Self::new(&mut StdRng::seed_from_u64(seed), options)
    }

    /// Start from an already-dealt table. Seat 0 leads the first trick.
    pub fn from_hands(hands: [Vec<Card>; SEATS], trump: Suit, options: GameOptions) -> Self {
        let players = hands
            .into_iter()
            .enumerate()
            .map(|(seat, cards)| Player::new(seat as PlayerId, cards))
            .collect();

        Self {
            players,
            trump,
            tricks: Vec::with_capacity(TRICKS_PER_DEAL),
            tens_count: [0, 0],
            tricks_won: [0, 0],
            current_trick: Trick::new(),
            current_turn: 0,
            last_trick_winner: None,
            phase: GamePhase::InProgress,
            options,
        }
    }

    pub fn trump(&self) -> Suit {
        self.trump
    }

    pub fn options(&self) -> GameOptions {
        self.options
    }

    /// Seat expected to play next
    pub fn current_turn(&self) -> PlayerId {
        self.current_turn
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    /// Completed tricks, oldest first
    pub fn tricks(&self) -> &[Trick] {
        &self.tricks
    }

    pub fn tricks_won(&self) -> [u8; 2] {
        self.tricks_won
    }

    pub fn tens_count(&self) -> [u8; 2] {
        self.tens_count
    }

    pub fn last_trick_winner(&self) -> Option<PlayerId> {
        self.last_trick_winner
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// A seat's hand, if the seat exists
    pub fn hand(&self, seat: PlayerId) -> Option<&Hand> {
        self.players.get(seat as usize).map(|p| &p.hand)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Complete { .. })
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            GamePhase::Complete { outcome } => Some(outcome),
            GamePhase::InProgress => None,
        }
    }

    /// Cards `seat` may legally play into the current trick, ignoring whose
    /// turn it is.
    pub fn legal_cards(&self, seat: PlayerId) -> Vec<Card> {
        if self.is_finished() {
            return Vec::new();
        }
        let Some(hand) = self.hand(seat) else {
            return Vec::new();
        };

        match self.current_trick.lead_suit() {
            Some(lead) if self.options.follow_suit && hand.has_suit(lead) => hand
                .cards()
                .iter()
                .copied()
                .filter(|c| c.suit == lead)
                .collect(),
            _ => hand.cards().to_vec(),
        }
    }

    /// Play a card for `seat`.
    ///
    /// On success the card moves from the hand into the current trick and the
    /// turn advances. The fourth play of a trick judges it in the same call
    /// and then runs the win check. On failure nothing changes.
    pub fn play_turn(&mut self, seat: PlayerId, card: Card) -> Result<Vec<GameEvent>, GameError> {
        self.validate_play(seat, card)?;

        let played = self.players[seat as usize]
            .hand
            .remove(&card)
            .ok_or(GameError::InvalidCard(card))?;
        self.current_trick.push(seat, played);
        self.current_turn = next_seat(self.current_turn);

        let resolved = match self.current_trick.evaluate(self.trump) {
            Some(result) => self.resolve_trick(result),
            None => Vec::new(),
        };

        let mut events = Vec::with_capacity(1 + resolved.len());
        events.push(GameEvent::CardPlayed {
            seat,
            card: played,
            next_turn: self.current_turn,
        });
        events.extend(resolved);
        Ok(events)
    }

    fn validate_play(&self, seat: PlayerId, card: Card) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }

        let player = self
            .players
            .get(seat as usize)
            .ok_or(GameError::PlayerNotFound(seat))?;

        if seat != self.current_turn {
            return Err(GameError::NotYourTurn {
                seat,
                current: self.current_turn,
            });
        }

        if !player.hand.contains(&card) {
            return Err(GameError::InvalidCard(card));
        }

        if self.options.follow_suit {
            if let Some(lead) = self.current_trick.lead_suit() {
                if card.suit != lead && player.hand.has_suit(lead) {
                    return Err(GameError::MustFollowSuit { lead });
                }
            }
        }

        Ok(())
    }

    /// Score a judged trick, hand the lead to its winner and check for the end
    fn resolve_trick(&mut self, result: TrickResult) -> Vec<GameEvent> {
        let team = result.team.index();
        self.tricks_won[team] += 1;
        self.tens_count[team] += result.tens;

        let trick = std::mem::take(&mut self.current_trick);
        self.tricks.push(trick);
        self.current_turn = result.winner;
        self.last_trick_winner = Some(result.winner);

        let mut events = vec![GameEvent::TrickCompleted {
            winner: result.winner,
            tens: result.tens,
            tricks_won: self.tricks_won,
            tens_count: self.tens_count,
            next_turn: self.current_turn,
        }];

        if let Some(outcome) = self.check_win_condition() {
            self.phase = GamePhase::Complete { outcome };
            events.push(GameEvent::GameOver {
                outcome,
                tricks_won: self.tricks_won,
                tens_count: self.tens_count,
                trump: self.trump,
            });
        }

        events
    }

    /// Decide the deal, if it is decided.
    ///
    /// A team holding three or more tens wins at once; two each is a tie;
    /// otherwise the deal runs until every trick is played.
    fn check_win_condition(&self) -> Option<Outcome> {
        for team in Team::ALL {
            if self.tens_count[team.index()] > TENS_TO_WIN {
                return Some(Outcome::Win(team));
            }
        }

        if self.tens_count == [TENS_TO_WIN, TENS_TO_WIN] {
            return Some(Outcome::Tie);
        }

        if self.tricks.len() >= TRICKS_PER_DEAL {
            let [first, second] = self.tens_count;
            return Some(match first.cmp(&second) {
                Ordering::Greater => Outcome::Win(Team::of(0)),
                Ordering::Less => Outcome::Win(Team::of(1)),
                Ordering::Equal => Outcome::Tie,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank;
    use pretty_assertions::assert_eq;

    fn card(suit: Suit, rank: Rank) -> Card {
        Card::new(suit, rank)
    }

    #[test]
    fn test_new_game_deals_thirteen_each() {
        let game = GameState::with_seed(42, GameOptions::default());

        for seat in 0..SEATS as PlayerId {
            assert_eq!(game.hand(seat).unwrap().len(), 13);
        }
        assert_eq!(game.current_turn(), 0);
        assert_eq!(game.phase(), GamePhase::InProgress);
        assert!(game.hand(0).unwrap().has_suit(game.trump()));
    }

    #[test]
    fn test_seeded_deals_match() {
        let a = GameState::with_seed(9, GameOptions::default());
        let b = GameState::with_seed(9, GameOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_unknown_seat() {
        let mut game = GameState::with_seed(1, GameOptions::default());
        let any = game.hand(0).unwrap().cards()[0];

        assert_eq!(game.play_turn(4, any), Err(GameError::PlayerNotFound(4)));
    }

    #[test]
    fn test_game_over_checked_first() {
        let mut game = GameState::with_seed(1, GameOptions::default());
        game.phase = GamePhase::Complete {
            outcome: Outcome::Tie,
        };
        let any = game.hand(2).unwrap().cards()[0];

        assert_eq!(game.play_turn(9, any), Err(GameError::GameOver));
    }

    #[test]
    fn test_must_follow_suit() {
        let hands = [
            vec![card(Suit::Spades, Rank::Two)],
            vec![card(Suit::Spades, Rank::Three), card(Suit::Hearts, Rank::Ace)],
            vec![],
            vec![],
        ];
        let mut game = GameState::from_hands(hands.clone(), Suit::Hearts, GameOptions::default());
        game.play_turn(0, card(Suit::Spades, Rank::Two)).unwrap();

        assert_eq!(game.legal_cards(1), vec![card(Suit::Spades, Rank::Three)]);
        let before = game.clone();
        assert_eq!(
            game.play_turn(1, card(Suit::Hearts, Rank::Ace)),
            Err(GameError::MustFollowSuit { lead: Suit::Spades })
        );
        assert_eq!(game, before);

        let mut permissive =
            GameState::from_hands(hands, Suit::Hearts, GameOptions { follow_suit: false });
        permissive.play_turn(0, card(Suit::Spades, Rank::Two)).unwrap();
        assert_eq!(permissive.legal_cards(1).len(), 2);
        assert!(permissive.play_turn(1, card(Suit::Hearts, Rank::Ace)).is_ok());
    }

    #[test]
    fn test_win_check_priority() {
        let mut game = GameState::with_seed(3, GameOptions::default());

        game.tens_count = [1, 3];
        assert_eq!(game.check_win_condition(), Some(Outcome::Win(Team::of(1))));

        game.tens_count = [2, 2];
        assert_eq!(game.check_win_condition(), Some(Outcome::Tie));

        game.tens_count = [2, 1];
        assert_eq!(game.check_win_condition(), None);
    }

    #[test]
    fn test_exhausted_deal_compares_tens() {
        let mut game = GameState::with_seed(3, GameOptions::default());
        game.tricks = vec![Trick::new(); TRICKS_PER_DEAL];

        game.tens_count = [1, 0];
        assert_eq!(game.check_win_condition(), Some(Outcome::Win(Team::of(0))));

        game.tens_count = [0, 1];
        assert_eq!(game.check_win_condition(), Some(Outcome::Win(Team::of(1))));

        game.tens_count = [1, 1];
        assert_eq!(game.check_win_condition(), Some(Outcome::Tie));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GameError::GameOver.code(), "game_over");
        assert_eq!(
            GameError::NotYourTurn { seat: 1, current: 0 }.to_string(),
            "Not your turn: seat 0 is to play"
        );
    }
}
