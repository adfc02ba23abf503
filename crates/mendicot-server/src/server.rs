//! WebSocket server and connection handling.

use crate::config::ServerConfig;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{ConnectionId, Outbound, Recipient, Session, SessionError, SessionId};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use mendicot_core::Card;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
///
/// Lock order: `waiting` first, then a `sessions` entry. Seating and
/// teardown both run under `waiting`, so `connection_sessions` only changes
/// while it is held. A session's messages
/// are dispatched while its entry is held, so every connection sees that
/// session's messages in one total order.
pub struct ServerState {
    pub config: ServerConfig,
    /// All live sessions
    pub sessions: DashMap<SessionId, Session>,
    /// Mapping from connection ID to its session ID
    pub connection_sessions: DashMap<ConnectionId, SessionId>,
    /// Mapping from connection ID to its message sender
    pub senders: DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
    /// Sessions with free seats, in the order plain joins fill them
    waiting: Mutex<VecDeque<SessionId>>,
    sessions_created: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            connection_sessions: DashMap::new(),
            senders: DashMap::new(),
            waiting: Mutex::new(VecDeque::new()),
            sessions_created: AtomicU64::new(0),
        }
    }

    fn lock_waiting(&self) -> MutexGuard<'_, VecDeque<SessionId>> {
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Random source for a new session: derived from the configured seed, or
    /// fresh entropy.
    fn session_rng(&self) -> StdRng {
        let n = self.sessions_created.fetch_add(1, Ordering::Relaxed);
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_entropy(),
        }
    }

    fn new_session(&self) -> Session {
        let id = Uuid::new_v4();
        info!(session = %id, "Session created");
        Session::new(id, self.config.game, self.session_rng())
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, connection: ConnectionId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&connection) {
            if sender.send(msg).is_err() {
                debug!(connection = %connection, "Dropped message for closed connection");
            }
        }
    }

    /// Deliver a session's outbound messages in order.
    fn dispatch(&self, session: &Session, outbound: Vec<Outbound>) {
        for Outbound { to, message } in outbound {
            match to {
                Recipient::Connection(connection) => self.send_to(connection, message),
                Recipient::Session => {
                    for &connection in session.connections() {
                        self.send_to(connection, message.clone());
                    }
                }
            }
        }
    }

    fn session_of(&self, connection: ConnectionId) -> Result<SessionId, SessionError> {
        self.connection_sessions
            .get(&connection)
            .map(|entry| *entry)
            .ok_or(SessionError::NotInSession)
    }

    /// First waiting session with a free seat, or a new one at the back of
    /// the queue.
    fn open_seat(&self, waiting: &mut VecDeque<SessionId>) -> SessionId {
        waiting.retain(|id| self.sessions.get(id).is_some_and(|s| !s.is_full()));
        if let Some(&id) = waiting.front() {
            return id;
        }

        let session = self.new_session();
        let id = session.id;
        self.sessions.insert(id, session);
        waiting.push_back(id);
        id
    }

    /// Seat a connection in the requested session, or in the first waiting one.
    pub fn join(&self, connection: ConnectionId, target: Option<SessionId>) -> Result<(), SessionError> {
        let mut waiting = self.lock_waiting();
        if self.connection_sessions.contains_key(&connection) {
            return Err(SessionError::AlreadySeated);
        }

        let session_id = match target {
            Some(id) => id,
            None => self.open_seat(&mut waiting),
        };

        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound)?;
        let outbound = session.join(connection)?;
        self.connection_sessions.insert(connection, session_id);
        self.dispatch(&session, outbound);

        if session.is_full() {
            waiting.retain(|&id| id != session_id);
        }
        Ok(())
    }

    /// Play a card for the connection's seat.
    pub fn play_card(&self, connection: ConnectionId, card: Card) -> Result<(), SessionError> {
        let session_id = self.session_of(connection)?;
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound)?;
        let outbound = session.play_card(connection, card)?;
        self.dispatch(&session, outbound);
        Ok(())
    }

    /// Answer a turn query to the asking connection only.
    pub fn query_current_turn(&self, connection: ConnectionId) -> Result<(), SessionError> {
        let session_id = self.session_of(connection)?;
        let session = self
            .sessions
            .get(&session_id)
            .ok_or(SessionError::SessionNotFound)?;
        let reply = session.current_turn(connection)?;
        self.dispatch(&session, vec![reply]);
        Ok(())
    }

    /// Tear down the connection's session and regroup whoever is left.
    pub fn disconnect(&self, connection: ConnectionId) {
        let mut waiting = self.lock_waiting();
        let Some((_, session_id)) = self.connection_sessions.remove(&connection) else {
            return;
        };
        waiting.retain(|&id| id != session_id);

        let Some((_, session)) = self.sessions.remove(&session_id) else {
            return;
        };
        let survivors = session.leave(connection);
        info!(
            session = %session_id,
            connection = %connection,
            remaining = survivors.len(),
            "Session destroyed"
        );

        if survivors.is_empty() {
            return;
        }

        let (next, outbound) = Session::from_survivors(
            Uuid::new_v4(),
            self.config.game,
            self.session_rng(),
            survivors,
        );
        let next_id = next.id;
        for &survivor in next.connections() {
            self.connection_sessions.insert(survivor, next_id);
        }
        self.dispatch(&next, outbound);
        self.sessions.insert(next_id, next);

        // Regrouped tables are filled before any other waiting session
        waiting.push_front(next_id);
    }
}

/// Bind `addr` and serve until the listener fails.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Mendicot server listening on {}", addr);
    serve(listener, state).await
}

/// Accept connections on an already-bound listener.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> anyhow::Result<()> {
    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a connection ID
    let connection_id = Uuid::new_v4();

    // Send welcome message
    let welcome = ServerMessage::Welcome { connection_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Register the outgoing channel only once the client is reachable
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(connection_id, tx);

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to encode {:?}: {}", msg, e),
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(connection_id, client_msg, &state),
                Err(e) => {
                    warn!(connection = %connection_id, "Invalid message {}: {}", text, e);
                    state.send_to(
                        connection_id,
                        ServerMessage::Error {
                            reason: format!("Invalid message: {e}"),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!(connection = %connection_id, "Client closing connection");
                break;
            }
            Err(e) => {
                error!(connection = %connection_id, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Any departure tears down the session
    state.disconnect(connection_id);
    state.senders.remove(&connection_id);
    send_task.abort();

    info!(connection = %connection_id, "Connection closed");
    Ok(())
}

/// Handle a client message. Failures are reported to the sender only.
fn handle_message(connection_id: ConnectionId, msg: ClientMessage, state: &ServerState) {
    let result = match msg {
        ClientMessage::Join(request) => {
            state.join(connection_id, request.and_then(|r| r.session_id))
        }
        ClientMessage::PlayCard { suit, rank } => {
            state.play_card(connection_id, Card::new(suit, rank))
        }
        ClientMessage::QueryCurrentTurn => state.query_current_turn(connection_id),
        ClientMessage::Ping => {
            state.send_to(connection_id, ServerMessage::Pong);
            Ok(())
        }
    };

    if let Err(e) = result {
        debug!(connection = %connection_id, error = %e, "Request rejected");
        state.send_to(connection_id, e.to_message());
    }
}
