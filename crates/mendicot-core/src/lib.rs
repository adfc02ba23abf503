//! Mendicot - a four-player partnership trick-taking game engine
//!
//! This crate provides the core game logic for Mendicot, including:
//! - Cards, deck shuffling and dealing
//! - Seats, hands and team membership
//! - Trick judging under a trump suit
//! - Game state machine with tens scoring and win/tie detection
//!
//! # Architecture
//!
//! The engine is synchronous and performs no I/O. Every source of randomness
//! is injected, so a seed fully determines a deal. A server owns one
//! `GameState` per table and serializes calls to [`GameState::play_turn`].
//!
//! # Modules
//!
//! - [`card`]: Suits, ranks, cards and the deck
//! - [`player`]: Seats, teams and hands
//! - [`trick`]: Trick judging
//! - [`game`]: Game state machine
//! - [`events`]: Events emitted by plays
//! - [`invariants`]: Consistency checks over a game state

pub mod card;
pub mod events;
pub mod game;
pub mod invariants;
pub mod player;
pub mod trick;

// Re-export commonly used types
pub use card::{Card, Deck, Rank, Suit, DECK_SIZE, HAND_SIZE};
pub use events::{GameEvent, Outcome};
pub use game::{GameError, GameOptions, GamePhase, GameState, TRICKS_PER_DEAL};
pub use invariants::InvariantViolation;
pub use player::{next_seat, Hand, Player, PlayerId, Team, SEATS};
pub use trick::{Play, Trick, TrickResult};
