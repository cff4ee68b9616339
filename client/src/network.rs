//! WebSocket transport and the frame-driven game client

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::protocol::{MessageType, NetworkMessage, ProtocolError};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::events::EventBus;
use crate::game::ClientWorld;
use crate::input::InputSampler;

/// Outbound frames buffered before sends start being skipped
const OUTBOUND_CAPACITY: usize = 64;
/// Inbound frames buffered between drains
const INBOUND_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not joined yet, the server has not assigned a player id")]
    NotJoined,
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A live server connection split into reader and writer tasks.
///
/// The reader decodes incoming text frames and queues the typed
/// messages for [`Connection::try_recv`]; malformed frames are logged
/// and dropped there so callers only ever see well-formed envelopes.
/// The writer drains an outbound queue into the socket.
pub struct Connection {
    outbound: mpsc::Sender<Message>,
    inbound: mpsc::Receiver<NetworkMessage>,
}

impl Connection {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _response) = connect_async(url).await?;
        info!("Connected to {}", url);

        let (sink, stream) = ws.split();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);

        tokio::spawn(write_socket(outbound_rx, sink));
        tokio::spawn(read_socket(stream, inbound_tx));

        Ok(Connection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }

    /// Next decoded message, if one is already waiting
    pub fn try_recv(&mut self) -> Option<NetworkMessage> {
        self.inbound.try_recv().ok()
    }

    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Queues a message for the writer task. Returns false when the
    /// send was skipped, whether because the transport is gone, the
    /// queue is full or the message would not encode.
    pub fn send(&self, message: &NetworkMessage) -> bool {
        if !self.is_open() {
            warn!("Skipping send, transport is not open");
            return false;
        }
        let json = match message.encode() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode outbound message: {}", e);
                return false;
            }
        };
        match self.outbound.try_send(Message::Text(json)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Skipping send: {}", e);
                false
            }
        }
    }

    /// Best-effort close: queues a close frame if there is room and
    /// lets both tasks wind down as the handles drop.
    pub fn close(self) {
        let _ = self.outbound.try_send(Message::Close(None));
    }
}

async fn write_socket(mut outbound: mpsc::Receiver<Message>, mut sink: WsSink) {
    while let Some(message) = outbound.recv().await {
        if let Err(e) = sink.send(message).await {
            debug!("Write failed, stopping writer: {}", e);
            break;
        }
    }
}

async fn read_socket(mut stream: WsStream, inbound: mpsc::Sender<NetworkMessage>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(raw)) => match NetworkMessage::decode(&raw) {
                Ok(message) => {
                    if inbound.send(message).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Dropping malformed frame from server: {} (raw: {})", e, raw),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read failed, stopping reader: {}", e);
                break;
            }
        }
    }
    info!("Server connection closed");
}

/// The game client: one connection, one world, one event bus.
///
/// Call [`Client::frame`] once per presentation frame and
/// [`Client::send_axes`] with whatever the input device reads; the
/// client decides what actually goes on the wire.
pub struct Client {
    connection: Connection,
    world: ClientWorld,
    events: EventBus,
    sampler: InputSampler,
}

impl Client {
    /// Connects to the server and takes ownership of the event bus,
    /// so every subscription lives exactly as long as this client.
    pub async fn connect(url: &str, events: EventBus) -> Result<Self, ClientError> {
        let connection = Connection::connect(url).await?;
        Ok(Client {
            connection,
            world: ClientWorld::new(),
            events,
            sampler: InputSampler::new(),
        })
    }

    /// One presentation frame: drains the inbound queue, applies at
    /// most one snapshot, then eases remote ships by `dt` seconds.
    pub fn frame(&mut self, dt: f32) {
        self.process_inbound();
        self.world.advance(dt);
    }

    fn process_inbound(&mut self) {
        let mut latest_snapshot = None;

        while let Some(message) = self.connection.try_recv() {
            match message.message_type {
                MessageType::PlayerJoined => match message.required_player_id() {
                    Ok(id) => {
                        let id = id.to_string();
                        self.world.on_player_joined(id, &mut self.events);
                    }
                    Err(e) => warn!("Dropping join ack: {}", e),
                },
                MessageType::GameState => match message.game_state_payload() {
                    Ok(state) => latest_snapshot = Some(state),
                    Err(e) => warn!("Dropping snapshot: {}", e),
                },
                // Reserved tags carry nothing for us yet
                _ => {}
            }
        }

        // Only the newest snapshot matters; stale ones are superseded
        // before they are ever applied.
        if let Some(state) = latest_snapshot {
            self.world.apply_snapshot(&state, &mut self.events);
        }
    }

    /// Samples the axes and sends an input command when warranted.
    ///
    /// Returns Ok(true) when a command went out, Ok(false) when this
    /// sample produced nothing to send, and [`ClientError::NotJoined`]
    /// when real input arrives before the server has acknowledged us.
    pub fn send_axes(&mut self, horizontal: f32, vertical: f32) -> Result<bool, ClientError> {
        let Some(local_id) = self.world.local_id() else {
            if horizontal != 0.0 || vertical != 0.0 {
                return Err(ClientError::NotJoined);
            }
            return Ok(false);
        };

        let Some(input) = self.sampler.sample(horizontal, vertical) else {
            return Ok(false);
        };

        let message = NetworkMessage::player_input(local_id, &input)?;
        Ok(self.connection.send(&message))
    }

    pub fn world(&self) -> &ClientWorld {
        &self.world
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Says goodbye and drops the connection
    pub fn close(self) {
        self.connection.close();
    }
}
