//! Server network layer handling WebSocket connections and the tick loop

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::protocol::{MessageType, NetworkMessage, PlayerInputData};
use shared::{TICK_DT, TICK_RATE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::broadcast;
use crate::session::SessionRegistry;

/// Outbound frames buffered per connection before the tick starts
/// dropping snapshots for that recipient
pub const OUTBOUND_CAPACITY: usize = 64;

/// Events sent from connection tasks to the server's event loop
#[derive(Debug)]
pub enum ServerEvent {
    /// A WebSocket handshake finished; the stream is ready to be adopted
    Accepted {
        ws: WebSocketStream<TcpStream>,
        peer: SocketAddr,
    },
    /// A decoded input command, routed by the id the sender claimed
    Input {
        player_id: String,
        input: PlayerInputData,
    },
    /// A connection's read side ended, cleanly or not
    Closed { session_id: String },
}

/// Main server coordinating connections and the authoritative simulation
///
/// All mutable game state lives behind `&mut self` and is only touched
/// from [`Server::run`]'s single task: connection tasks communicate
/// through the event channel instead of sharing the registry.
pub struct Server {
    listener: TcpListener,
    registry: SessionRegistry,
    tick_count: u64,

    // Communication channel from connection tasks
    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn bind(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            registry: SessionRegistry::new(),
            tick_count: 0,
            event_tx,
            event_rx,
        })
    }

    /// The actual bound address, useful when binding to port 0
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main server loop coordinating all operations
    ///
    /// Services three sources from one task: newly accepted sockets,
    /// events from connection tasks, and the fixed-rate tick. Missed
    /// ticks are skipped rather than bunched up, so a stall never causes
    /// a burst of catch-up ticks.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut tick_interval = interval(Duration::from_secs_f64(1.0 / TICK_RATE as f64));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_handshake(stream, peer),
                        Err(e) => warn!("Failed to accept connection: {}", e),
                    }
                },

                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                },

                _ = tick_interval.tick() => {
                    self.tick();
                },
            }
        }
    }

    /// Upgrades a fresh TCP stream off the loop task; the finished
    /// WebSocket comes back through the event channel
    fn spawn_handshake(&self, stream: TcpStream, peer: SocketAddr) {
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => {
                    if events.send(ServerEvent::Accepted { ws, peer }).is_err() {
                        debug!("Event loop gone before {} finished its handshake", peer);
                    }
                }
                Err(e) => warn!("WebSocket handshake with {} failed: {}", peer, e),
            }
        });
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Accepted { ws, peer } => self.register_session(ws, peer),

            ServerEvent::Input { player_id, input } => {
                if !self.registry.set_input(&player_id, input) {
                    debug!("Dropping input for unknown session {}", player_id);
                }
            }

            ServerEvent::Closed { session_id } => {
                // Push the shrunken world out right away instead of
                // waiting for the next tick
                if self.registry.leave(&session_id) {
                    broadcast::broadcast_all(&self.registry);
                }
            }
        }
    }

    /// Adopts a handshaken connection: assigns a session id, queues the
    /// join acknowledgement and spawns the reader and writer tasks.
    ///
    /// The acknowledgement is queued before this function returns and
    /// ticks only fire between events, so it is always the first frame
    /// the client sees; no snapshot can slip ahead of it.
    fn register_session(&mut self, ws: WebSocketStream<TcpStream>, peer: SocketAddr) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (sink, stream) = ws.split();

        let session_id = self.registry.join(outbound_tx);
        info!("Player {} connected from {}", session_id, peer);

        match NetworkMessage::player_joined(&session_id).encode() {
            Ok(json) => {
                if let Some(session) = self.registry.get(&session_id) {
                    if let Err(e) = session.sender.try_send(Message::Text(json)) {
                        warn!("Failed to queue join ack for {}: {}", session_id, e);
                    }
                }
            }
            Err(e) => warn!("Failed to encode join ack for {}: {}", session_id, e),
        }

        tokio::spawn(write_connection(outbound_rx, sink));
        tokio::spawn(read_connection(stream, session_id, self.event_tx.clone()));
    }

    /// One simulation step: advance every ship under its latest command,
    /// then fan out per-recipient snapshots
    fn tick(&mut self) {
        self.registry.integrate_all(TICK_DT);
        broadcast::broadcast_all(&self.registry);
        self.tick_count += 1;

        // Periodic diagnostics
        if self.tick_count % 60 == 0 && !self.registry.is_empty() {
            debug!("Tick {}: {} players", self.tick_count, self.registry.len());
        }
    }
}

/// Reads frames until the peer goes away, forwarding decoded commands to
/// the event loop. Always reports `Closed` on the way out so the session
/// gets cleaned up no matter how the connection died.
async fn read_connection(
    mut stream: SplitStream<WebSocketStream<TcpStream>>,
    session_id: String,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(raw)) => handle_text_frame(&raw, &session_id, &events),
            Ok(Message::Close(_)) => break,
            // Binary, ping and pong frames carry nothing for us
            Ok(_) => {}
            Err(e) => {
                debug!("Connection error for {}: {}", session_id, e);
                break;
            }
        }
    }

    let _ = events.send(ServerEvent::Closed { session_id });
}

/// Decodes one text frame and forwards whatever it yields.
///
/// Malformed traffic (unparsable envelope, unrecognized type tag, missing
/// playerId, bad payload) is logged with the offending frame and dropped;
/// the connection itself stays up. Well-formed frames whose tag the
/// server has no behavior for are ignored without a log line.
fn handle_text_frame(raw: &str, session_id: &str, events: &mpsc::UnboundedSender<ServerEvent>) {
    let message = match NetworkMessage::decode(raw) {
        Ok(message) => message,
        Err(e) => {
            warn!("Dropping malformed frame from {}: {} (raw: {})", session_id, e, raw);
            return;
        }
    };

    match message.message_type {
        MessageType::PlayerInput => {
            let player_id = match message.required_player_id() {
                Ok(id) => id.to_string(),
                Err(e) => {
                    warn!("Dropping input frame from {}: {}", session_id, e);
                    return;
                }
            };

            match message.input_payload() {
                Ok(input) => {
                    let _ = events.send(ServerEvent::Input { player_id, input });
                }
                Err(e) => {
                    warn!("Dropping input frame from {}: {} (raw: {})", session_id, e, raw);
                }
            }
        }

        // Reserved tags and server-bound-only messages
        _ => {}
    }
}

/// Drains a session's outbound queue into the socket. Ends when the
/// registry drops the sender or the sink rejects a write.
async fn write_connection(
    mut outbound: mpsc::Receiver<Message>,
    mut sink: SplitSink<WebSocketStream<TcpStream>, Message>,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(frame).await {
            debug!("Failed to write frame: {}", e);
            break;
        }
    }

    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_channel() -> (
        mpsc::UnboundedSender<ServerEvent>,
        mpsc::UnboundedReceiver<ServerEvent>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_input_frame_is_routed() {
        let (tx, mut rx) = event_channel();
        let raw = r#"{"type":"PlayerInput","playerId":"AB12CD","data":"{\"horizontal\":0.5,\"vertical\":-1.0,\"timestamp\":42}"}"#;

        handle_text_frame(raw, "AB12CD", &tx);

        match rx.try_recv().unwrap() {
            ServerEvent::Input { player_id, input } => {
                assert_eq!(player_id, "AB12CD");
                assert_eq!(input.horizontal, 0.5);
                assert_eq!(input.vertical, -1.0);
                assert_eq!(input.timestamp, 42);
            }
            other => panic!("expected an input event, got {:?}", other),
        }
    }

    #[test]
    fn test_input_routed_by_claimed_id_not_connection() {
        let (tx, mut rx) = event_channel();
        let raw = r#"{"type":"PlayerInput","playerId":"FFFFFF","data":"{\"horizontal\":0.0,\"vertical\":1.0,\"timestamp\":0}"}"#;

        // The frame arrived on AB12CD's connection but claims FFFFFF
        handle_text_frame(raw, "AB12CD", &tx);

        match rx.try_recv().unwrap() {
            ServerEvent::Input { player_id, .. } => assert_eq!(player_id, "FFFFFF"),
            other => panic!("expected an input event, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_frame_is_dropped() {
        let (tx, mut rx) = event_channel();

        handle_text_frame("not json at all", "AB12CD", &tx);
        handle_text_frame("{}", "AB12CD", &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unrecognized_tag_is_dropped() {
        let (tx, mut rx) = event_channel();
        let raw = r#"{"type":"Teleport","playerId":"AB12CD","data":null}"#;

        handle_text_frame(raw, "AB12CD", &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_input_without_player_id_is_dropped() {
        let (tx, mut rx) = event_channel();
        let missing = r#"{"type":"PlayerInput","data":"{\"horizontal\":1.0,\"vertical\":0.0,\"timestamp\":0}"}"#;
        let empty = r#"{"type":"PlayerInput","playerId":"","data":"{\"horizontal\":1.0,\"vertical\":0.0,\"timestamp\":0}"}"#;

        handle_text_frame(missing, "AB12CD", &tx);
        handle_text_frame(empty, "AB12CD", &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_input_with_bad_payload_is_dropped() {
        let (tx, mut rx) = event_channel();
        let missing_data = r#"{"type":"PlayerInput","playerId":"AB12CD"}"#;
        let broken_data = r#"{"type":"PlayerInput","playerId":"AB12CD","data":"{oops"}"#;

        handle_text_frame(missing_data, "AB12CD", &tx);
        handle_text_frame(broken_data, "AB12CD", &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reserved_tags_are_silently_ignored() {
        let (tx, mut rx) = event_channel();
        for tag in ["ShipUpgrade", "WeaponUpgrade", "AbilityUse", "PlayerLeft", "Error"] {
            let raw = format!(r#"{{"type":"{}","playerId":"AB12CD","data":null}}"#, tag);
            handle_text_frame(&raw, "AB12CD", &tx);
        }

        // Valid tags the server never acts on from a client
        handle_text_frame(r#"{"type":"PlayerJoined","playerId":"AB12CD","data":null}"#, "AB12CD", &tx);
        handle_text_frame(r#"{"type":"GameState","data":"{}"}"#, "AB12CD", &tx);

        assert!(rx.try_recv().is_err());
    }
}
