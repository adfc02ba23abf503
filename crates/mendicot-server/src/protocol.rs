//! WebSocket protocol messages for Mendicot multiplayer.

use mendicot_core::{Card, PlayerId, Rank, Suit, Team};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Take a seat, in the first waiting session or in a specific one. The
    /// payload may be omitted.
    Join(Option<JoinRequest>),

    /// Play a card from the caller's hand
    PlayCard { suit: Suit, rank: Rank },

    /// Ask whose turn it is, without side effects
    QueryCurrentTurn,

    /// Ping for keepalive
    Ping,
}

/// Optional body of a `join` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome message with assigned connection ID
    Welcome { connection_id: Uuid },

    /// Seat assigned to the joining connection
    Joined {
        session_id: Uuid,
        seat_index: PlayerId,
        seat_count: usize,
    },

    /// Lobby headcount changed
    SeatCount { count: usize },

    /// The deal is ready. The hand is sent only to its owner.
    GameStart {
        seat_index: PlayerId,
        hand: Vec<Card>,
        trump: Suit,
    },

    /// Seat expected to play next
    CurrentTurn { seat_index: PlayerId },

    /// A card was played into the current trick
    CardPlayed {
        seat: PlayerId,
        card: Card,
        next_turn: PlayerId,
    },

    /// The current trick was judged
    TrickComplete {
        winner: PlayerId,
        tricks_won: [u8; 2],
        tens_count: [u8; 2],
        next_turn: PlayerId,
    },

    /// The deal is decided
    GameOver {
        outcome: OutcomeKind,
        winning_team: Option<Team>,
        tricks_won: [u8; 2],
        tens_count: [u8; 2],
        trump: Suit,
    },

    /// The session was torn down; any derived table state is void
    SessionReset,

    /// A play was rejected by the rules
    InvalidMove { reason: String, message: String },

    /// A request could not be served
    Error { reason: String },

    /// Pong response
    Pong,
}

/// Terminal result kind on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Win,
    Tie,
}
