//! Game session management.
//!
//! A session binds up to four connections to seats and owns the deal once the
//! fourth seat is taken. Every operation returns the messages it produces, in
//! order, for the caller to deliver while it still holds the session.

use crate::protocol::ServerMessage;
use crate::sync::play_messages;
use mendicot_core::{Card, GameError, GameOptions, GameState, PlayerId, SEATS};
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

pub type ConnectionId = Uuid;
pub type SessionId = Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session is full")]
    SessionFull,

    #[error("Already seated in a session")]
    AlreadySeated,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Not in a session")]
    NotInSession,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl SessionError {
    /// Reply for the acting connection. Rule failures are `invalid_move`,
    /// everything else is `error`.
    pub fn to_message(&self) -> ServerMessage {
        match self {
            SessionError::Game(e) => ServerMessage::InvalidMove {
                reason: e.code().to_string(),
                message: e.to_string(),
            },
            other => ServerMessage::Error {
                reason: other.to_string(),
            },
        }
    }
}

/// Who receives an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Connection(ConnectionId),
    /// Every connection seated in the session
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: Recipient,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn to(connection: ConnectionId, message: ServerMessage) -> Self {
        Self {
            to: Recipient::Connection(connection),
            message,
        }
    }

    pub fn session(message: ServerMessage) -> Self {
        Self {
            to: Recipient::Session,
            message,
        }
    }
}

/// Session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Waiting,
    InGame,
    Finished,
}

/// A table of up to four seated connections.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    /// Connections in seat order
    seats: Vec<ConnectionId>,
    /// The deal, once all seats are taken
    game: Option<GameState>,
    options: GameOptions,
    rng: StdRng,
}

impl Session {
    pub fn new(id: SessionId, options: GameOptions, rng: StdRng) -> Self {
        Self {
            id,
            seats: Vec::with_capacity(SEATS),
            game: None,
            options,
            rng,
        }
    }

    /// Reopen a torn-down table for the connections still present.
    ///
    /// Survivors keep their relative seat order. Each is told the previous
    /// session is gone, then its new seat, then the new headcount.
    pub fn from_survivors(
        id: SessionId,
        options: GameOptions,
        rng: StdRng,
        mut survivors: Vec<ConnectionId>,
    ) -> (Self, Vec<Outbound>) {
        survivors.truncate(SEATS - 1);
        let seat_count = survivors.len();
        let mut session = Self::new(id, options, rng);
        session.seats = survivors;

        let mut outbound = vec![Outbound::session(ServerMessage::SessionReset)];
        outbound.extend(session.seats.iter().enumerate().map(|(seat, &connection)| {
            Outbound::to(
                connection,
                ServerMessage::Joined {
                    session_id: id,
                    seat_index: seat as PlayerId,
                    seat_count,
                },
            )
        }));
        outbound.push(Outbound::session(ServerMessage::SeatCount { count: seat_count }));
        (session, outbound)
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= SEATS
    }

    /// Connections in seat order
    pub fn connections(&self) -> &[ConnectionId] {
        &self.seats
    }

    pub fn seat_of(&self, connection: ConnectionId) -> Option<PlayerId> {
        self.seats
            .iter()
            .position(|&c| c == connection)
            .map(|i| i as PlayerId)
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        match &self.game {
            None => SessionStatus::Waiting,
            Some(game) if game.is_finished() => SessionStatus::Finished,
            Some(_) => SessionStatus::InGame,
        }
    }

    /// Seat a connection. The fourth seat deals the game.
    pub fn join(&mut self, connection: ConnectionId) -> Result<Vec<Outbound>, SessionError> {
        if self.seat_of(connection).is_some() {
            return Err(SessionError::AlreadySeated);
        }
        if self.is_full() {
            return Err(SessionError::SessionFull);
        }

        self.seats.push(connection);
        let seat_index = (self.seats.len() - 1) as PlayerId;
        let seat_count = self.seats.len();
        debug!(session = %self.id, connection = %connection, seat = seat_index, "Seat taken");

        let mut outbound = vec![
            Outbound::to(
                connection,
                ServerMessage::Joined {
                    session_id: self.id,
                    seat_index,
                    seat_count,
                },
            ),
            Outbound::session(ServerMessage::SeatCount { count: seat_count }),
        ];

        if self.is_full() {
            outbound.extend(self.start_game());
        }

        Ok(outbound)
    }

    /// Deal, then send each seat its own hand and everyone the first turn
    fn start_game(&mut self) -> Vec<Outbound> {
        let game = GameState::new(&mut self.rng, self.options);
        info!(session = %self.id, trump = %game.trump(), "Game started");

        let mut outbound: Vec<Outbound> = self
            .seats
            .iter()
            .enumerate()
            .map(|(seat, &connection)| {
                let seat_index = seat as PlayerId;
                let hand = game
                    .hand(seat_index)
                    .map(|h| h.cards().to_vec())
                    .unwrap_or_default();
                Outbound::to(
                    connection,
                    ServerMessage::GameStart {
                        seat_index,
                        hand,
                        trump: game.trump(),
                    },
                )
            })
            .collect();
        outbound.push(Outbound::session(ServerMessage::CurrentTurn {
            seat_index: game.current_turn(),
        }));

        self.game = Some(game);
        outbound
    }

    /// Play a card for the connection's seat
    pub fn play_card(
        &mut self,
        connection: ConnectionId,
        card: Card,
    ) -> Result<Vec<Outbound>, SessionError> {
        let seat = self.seat_of(connection);
        let game = self.game.as_mut().ok_or(SessionError::GameNotStarted)?;
        let seat = seat.ok_or(SessionError::NotInSession)?;

        let events = game.play_turn(seat, card)?;
        debug!(session = %self.id, seat, card = %card, "Card played");
        if let Some(outcome) = game.outcome() {
            info!(
                session = %self.id,
                ?outcome,
                tens = ?game.tens_count(),
                tricks = ?game.tricks_won(),
                "Game over"
            );
        }

        Ok(play_messages(&events)
            .into_iter()
            .map(Outbound::session)
            .collect())
    }

    /// Whose turn it is, for the asking connection only
    pub fn current_turn(&self, connection: ConnectionId) -> Result<Outbound, SessionError> {
        let game = self.game.as_ref().ok_or(SessionError::GameNotStarted)?;
        Ok(Outbound::to(
            connection,
            ServerMessage::CurrentTurn {
                seat_index: game.current_turn(),
            },
        ))
    }

    /// Destroy the session because `connection` left. Returns the remaining
    /// connections in seat order; the deal is discarded.
    pub fn leave(self, connection: ConnectionId) -> Vec<ConnectionId> {
        if self.game.is_some() {
            info!(session = %self.id, connection = %connection, "Game discarded on disconnect");
        }
        self.seats
            .into_iter()
            .filter(|&c| c != connection)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn session() -> Session {
        Session::new(
            Uuid::new_v4(),
            GameOptions::default(),
            StdRng::seed_from_u64(12),
        )
    }

    fn full_session() -> (Session, Vec<ConnectionId>) {
        let mut session = session();
        let connections: Vec<ConnectionId> = (0..SEATS).map(|_| Uuid::new_v4()).collect();
        for &c in &connections {
            session.join(c).unwrap();
        }
        (session, connections)
    }

    #[test]
    fn test_seats_in_join_order() {
        let mut session = session();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let out = session.join(first).unwrap();
        assert_eq!(
            out[0],
            Outbound::to(
                first,
                ServerMessage::Joined {
                    session_id: session.id,
                    seat_index: 0,
                    seat_count: 1
                }
            )
        );
        session.join(second).unwrap();

        assert_eq!(session.seat_of(second), Some(1));
        assert_eq!(session.status(), SessionStatus::Waiting);
        assert!(matches!(
            session.join(first),
            Err(SessionError::AlreadySeated)
        ));
    }

    #[test]
    fn test_fourth_join_deals_privately() {
        let mut session = session();
        let connections: Vec<ConnectionId> = (0..SEATS).map(|_| Uuid::new_v4()).collect();
        for &c in &connections[..3] {
            session.join(c).unwrap();
        }

        let out = session.join(connections[3]).unwrap();
        assert_eq!(session.status(), SessionStatus::InGame);

        let game = session.game().unwrap();
        let starts: Vec<&Outbound> = out
            .iter()
            .filter(|o| matches!(o.message, ServerMessage::GameStart { .. }))
            .collect();
        assert_eq!(starts.len(), SEATS);
        for (seat, start) in starts.iter().enumerate() {
            assert_eq!(start.to, Recipient::Connection(connections[seat]));
            let ServerMessage::GameStart { seat_index, hand, trump } = &start.message else {
                unreachable!()
            };
            assert_eq!(*seat_index as usize, seat);
            assert_eq!(hand.len(), 13);
            assert_eq!(hand.as_slice(), game.hand(*seat_index).unwrap().cards());
            assert_eq!(*trump, game.trump());
        }
        assert_eq!(
            out.last(),
            Some(&Outbound::session(ServerMessage::CurrentTurn { seat_index: 0 }))
        );
    }

    #[test]
    fn test_fifth_join_rejected() {
        let (mut session, _) = full_session();
        let before = session.connections().to_vec();

        assert!(matches!(
            session.join(Uuid::new_v4()),
            Err(SessionError::SessionFull)
        ));
        assert_eq!(session.connections(), before.as_slice());
    }

    #[test]
    fn test_play_before_start() {
        let mut session = session();
        let c = Uuid::new_v4();
        session.join(c).unwrap();

        let err = session
            .play_card(c, Card::new(mendicot_core::Suit::Spades, mendicot_core::Rank::Ace))
            .unwrap_err();
        assert!(matches!(err, SessionError::GameNotStarted));
        assert!(matches!(err.to_message(), ServerMessage::Error { .. }));
        assert!(session.current_turn(c).is_err());
    }

    #[test]
    fn test_invalid_move_goes_to_actor_only() {
        let (mut session, connections) = full_session();
        let game = session.game().unwrap();
        let card = game.hand(1).unwrap().cards()[0];

        let err = session.play_card(connections[1], card).unwrap_err();
        match err.to_message() {
            ServerMessage::InvalidMove { reason, .. } => assert_eq!(reason, "not_your_turn"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(session.game().unwrap().current_turn(), 0);
    }

    #[test]
    fn test_play_broadcasts_in_order() {
        let (mut session, connections) = full_session();
        let card = session.game().unwrap().legal_cards(0)[0];

        let out = session.play_card(connections[0], card).unwrap();
        assert_eq!(
            out,
            vec![
                Outbound::session(ServerMessage::CardPlayed {
                    seat: 0,
                    card,
                    next_turn: 1
                }),
                Outbound::session(ServerMessage::CurrentTurn { seat_index: 1 }),
            ]
        );

        let query = session.current_turn(connections[3]).unwrap();
        assert_eq!(
            query,
            Outbound::to(connections[3], ServerMessage::CurrentTurn { seat_index: 1 })
        );
    }

    #[test]
    fn test_leave_tears_down() {
        let (session, connections) = full_session();
        let survivors = session.leave(connections[1]);
        assert_eq!(survivors, vec![connections[0], connections[2], connections[3]]);

        let next_id = Uuid::new_v4();
        let (next, out) = Session::from_survivors(
            next_id,
            GameOptions::default(),
            StdRng::seed_from_u64(1),
            survivors,
        );
        assert!(next.game().is_none());
        assert_eq!(next.seat_of(connections[2]), Some(1));

        let joined = |connection, seat_index| {
            Outbound::to(
                connection,
                ServerMessage::Joined {
                    session_id: next_id,
                    seat_index,
                    seat_count: 3,
                },
            )
        };
        assert_eq!(
            out,
            vec![
                Outbound::session(ServerMessage::SessionReset),
                joined(connections[0], 0),
                joined(connections[2], 1),
                joined(connections[3], 2),
                Outbound::session(ServerMessage::SeatCount { count: 3 }),
            ]
        );
    }
}
