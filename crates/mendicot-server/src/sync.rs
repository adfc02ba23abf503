//! Turn synchronization.
//!
//! Maps engine events onto the fixed wire sequence, and provides the
//! viewer-side reducer that rebuilds table state from that sequence.

use crate::protocol::{OutcomeKind, ServerMessage};
use mendicot_core::{Card, GameEvent, Outcome, PlayerId, Suit, Team};

/// Wire messages for one successful play, in emission order:
/// `card_played`, `current_turn`, then for a completed trick
/// `trick_complete` and `current_turn` again, then `game_over` if decided.
pub fn play_messages(events: &[GameEvent]) -> Vec<ServerMessage> {
    let mut messages = Vec::with_capacity(events.len() * 2);
    for event in events {
        match *event {
            GameEvent::CardPlayed {
                seat,
                card,
                next_turn,
            } => {
                messages.push(ServerMessage::CardPlayed {
                    seat,
                    card,
                    next_turn,
                });
                messages.push(ServerMessage::CurrentTurn {
                    seat_index: next_turn,
                });
            }
            GameEvent::TrickCompleted {
                winner,
                tricks_won,
                tens_count,
                next_turn,
                ..
            } => {
                messages.push(ServerMessage::TrickComplete {
                    winner,
                    tricks_won,
                    tens_count,
                    next_turn,
                });
                messages.push(ServerMessage::CurrentTurn {
                    seat_index: next_turn,
                });
            }
            GameEvent::GameOver {
                outcome,
                tricks_won,
                tens_count,
                trump,
            } => messages.push(game_over_message(outcome, tricks_won, tens_count, trump)),
        }
    }
    messages
}

fn game_over_message(
    outcome: Outcome,
    tricks_won: [u8; 2],
    tens_count: [u8; 2],
    trump: Suit,
) -> ServerMessage {
    let kind = match outcome {
        Outcome::Win(_) => OutcomeKind::Win,
        Outcome::Tie => OutcomeKind::Tie,
    };
    ServerMessage::GameOver {
        outcome: kind,
        winning_team: outcome.winning_team(),
        tricks_won,
        tens_count,
        trump,
    }
}

/// A viewer's reconstruction of the table.
///
/// Applying every message a connection receives, in order, yields the same
/// turn, trick, tallies and result as the server's game state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    pub seat: Option<PlayerId>,
    pub seat_count: usize,
    pub hand: Vec<Card>,
    pub trump: Option<Suit>,
    pub current_turn: Option<PlayerId>,
    pub current_trick: Vec<(PlayerId, Card)>,
    pub tricks_won: [u8; 2],
    pub tens_count: [u8; 2],
    pub outcome: Option<Outcome>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::Joined {
                seat_index,
                seat_count,
                ..
            } => {
                self.seat = Some(*seat_index);
                self.seat_count = *seat_count;
            }
            ServerMessage::SeatCount { count } => self.seat_count = *count,
            ServerMessage::GameStart {
                seat_index,
                hand,
                trump,
            } => {
                *self = Self {
                    seat: Some(*seat_index),
                    seat_count: self.seat_count,
                    hand: hand.clone(),
                    trump: Some(*trump),
                    ..Self::default()
                };
            }
            ServerMessage::CurrentTurn { seat_index } => self.current_turn = Some(*seat_index),
            ServerMessage::CardPlayed {
                seat,
                card,
                next_turn,
            } => {
                if self.seat == Some(*seat) {
                    self.hand.retain(|c| c != card);
                }
                self.current_trick.push((*seat, *card));
                self.current_turn = Some(*next_turn);
            }
            ServerMessage::TrickComplete {
                tricks_won,
                tens_count,
                next_turn,
                ..
            } => {
                self.current_trick.clear();
                self.tricks_won = *tricks_won;
                self.tens_count = *tens_count;
                self.current_turn = Some(*next_turn);
            }
            ServerMessage::GameOver {
                outcome,
                winning_team,
                tricks_won,
                tens_count,
                ..
            } => {
                self.tricks_won = *tricks_won;
                self.tens_count = *tens_count;
                self.outcome = match (outcome, winning_team) {
                    (OutcomeKind::Win, Some(team)) => Some(Outcome::Win(*team)),
                    (OutcomeKind::Win, None) => None,
                    (OutcomeKind::Tie, _) => Some(Outcome::Tie),
                };
            }
            ServerMessage::SessionReset => {
                *self = Self {
                    seat_count: self.seat_count,
                    ..Self::default()
                };
            }
            ServerMessage::Welcome { .. }
            | ServerMessage::InvalidMove { .. }
            | ServerMessage::Error { .. }
            | ServerMessage::Pong => {}
        }
    }

    /// Whether the local seat's partnership has won
    pub fn won(&self) -> bool {
        match (self.outcome, self.seat) {
            (Some(Outcome::Win(team)), Some(seat)) => team == Team::of(seat),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mendicot_core::{GameOptions, GameState, Rank};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_completing_play_message_order() {
        let events = vec![
            GameEvent::CardPlayed {
                seat: 3,
                card: Card::new(Suit::Clubs, Rank::Ace),
                next_turn: 1,
            },
            GameEvent::TrickCompleted {
                winner: 1,
                tens: 1,
                tricks_won: [0, 1],
                tens_count: [0, 1],
                next_turn: 1,
            },
        ];

        let messages = play_messages(&events);
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ServerMessage::CardPlayed { seat: 3, .. }));
        assert_eq!(messages[1], ServerMessage::CurrentTurn { seat_index: 1 });
        assert!(matches!(messages[2], ServerMessage::TrickComplete { winner: 1, .. }));
        assert_eq!(messages[3], ServerMessage::CurrentTurn { seat_index: 1 });
    }

    #[test]
    fn test_view_converges_with_engine() {
        let mut game = GameState::with_seed(31, GameOptions::default());
        let mut view = TableView::new();
        view.apply(&ServerMessage::GameStart {
            seat_index: 0,
            hand: game.hand(0).unwrap().cards().to_vec(),
            trump: game.trump(),
        });
        view.apply(&ServerMessage::CurrentTurn {
            seat_index: game.current_turn(),
        });

        while !game.is_finished() {
            let seat = game.current_turn();
            let card = game.legal_cards(seat)[0];
            let events = game.play_turn(seat, card).unwrap();
            for message in play_messages(&events) {
                view.apply(&message);
            }

            assert_eq!(view.current_turn, Some(game.current_turn()));
            assert_eq!(view.tricks_won, game.tricks_won());
            assert_eq!(view.tens_count, game.tens_count());
            let trick: Vec<(PlayerId, Card)> = game
                .current_trick()
                .plays()
                .iter()
                .map(|p| (p.seat, p.card))
                .collect();
            assert_eq!(view.current_trick, trick);
            assert_eq!(view.hand.len(), game.hand(0).unwrap().len());
        }

        assert_eq!(view.outcome, game.outcome());
    }

    #[test]
    fn test_reset_clears_table() {
        let mut view = TableView::new();
        view.apply(&ServerMessage::SeatCount { count: 4 });
        view.apply(&ServerMessage::GameStart {
            seat_index: 2,
            hand: vec![Card::new(Suit::Hearts, Rank::Two)],
            trump: Suit::Hearts,
        });
        view.apply(&ServerMessage::SessionReset);
        view.apply(&ServerMessage::SeatCount { count: 3 });

        assert_eq!(
            view,
            TableView {
                seat_count: 3,
                ..TableView::default()
            }
        );
    }
}
