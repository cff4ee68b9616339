//! # Game Server Library
//!
//! This library provides the authoritative server implementation for the
//! networked ship game. It owns the canonical state of every ship, applies
//! client steering commands, and broadcasts per-player snapshots so each
//! client can mirror the world the server decided on.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the only copy of the physics. Clients send steering
//! axes, never positions; every pose a client displays originates here.
//! A fixed 60 Hz loop re-applies each session's most recent command every
//! tick, so holding a key steers continuously even though the client only
//! transmits on changes.
//!
//! ### Session Management
//! Handles the complete lifecycle of a player session:
//! - WebSocket handshake and player id assignment
//! - Latest-wins input tracking per session
//! - Disconnect handling with immediate roster rebroadcast
//!
//! ### Snapshot Broadcasting
//! After every tick the server builds one snapshot per connected player.
//! Snapshots are tailored to their recipient, marking every other ship as
//! an enemy, and are dropped rather than queued unboundedly when a client
//! cannot keep up.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! All mutable state lives in one task that multiplexes connection
//! arrivals, decoded client messages, and the tick timer. Socket reads
//! and writes happen in per-connection tasks that talk to the loop over
//! channels, so the state itself needs no locks and every tick sees a
//! consistent world.
//!
//! ### WebSocket Communication
//! Clients connect over WebSocket and exchange JSON envelopes in text
//! frames. Malformed frames are logged and dropped without disturbing
//! the connection; unknown-but-valid message kinds are ignored quietly.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! The session registry: id generation, join and leave, per-session ship
//! state and the latest steering command.
//!
//! ### Broadcast Module (`broadcast`)
//! Builds recipient-relative snapshots and fans them out to every
//! connected session's outbound queue.
//!
//! ### Network Module (`network`)
//! The listener, the event loop, and the per-connection reader and
//! writer tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::bind("127.0.0.1:3000").await?;
//!
//!     // Runs the accept/input/tick loop until the process is stopped:
//!     // - accepts WebSocket connections and assigns player ids
//!     // - applies the latest steering command each 60 Hz tick
//!     // - broadcasts a tailored snapshot to every player
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod network;
pub mod session;
