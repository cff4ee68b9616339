//! # Game Client Library
//!
//! This library provides the client-side implementation for the networked
//! ship game. It covers connecting to a server over WebSocket, reconciling
//! authoritative snapshots into presentable state, deciding which input
//! samples become wire commands, and announcing world changes to whatever
//! presentation layer sits on top.
//!
//! ## Architecture Overview
//!
//! The client is deliberately thin: the server owns the simulation, so the
//! client's job is to mirror it smoothly rather than to simulate anything
//! itself. The pieces cooperate like this:
//!
//! ### Snapshot Reconciliation
//! Every server tick produces a full snapshot of all ships. The client
//! hard-sets its own ship from each snapshot, so what the player sees is
//! exactly what the server decided. Other players' ships are instead eased
//! toward their snapshot poses, which hides the 60 Hz stepping without
//! ever showing a ship anywhere the server did not put it.
//!
//! ### Snapshot Coalescing
//! Inbound frames queue between presentation frames. When a frame drains
//! the queue it keeps only the newest snapshot and applies that one, so a
//! client that stalls for a moment snaps forward instead of replaying a
//! backlog in fast motion.
//!
//! ### Session Phases
//! A connection starts unjoined. Until the server's join acknowledgement
//! arrives there is no player id to reconcile against, so snapshots are
//! dropped and real input is refused. The acknowledgement flips the
//! session to joined and everything starts flowing.
//!
//! ## Module Organization
//!
//! ### Events Module (`events`)
//! An explicit event bus for presentation-side systems. The reconciler
//! publishes joins, remote ship spawns and despawns; listeners subscribe
//! per event kind and live exactly as long as the bus that owns them.
//!
//! ### Game Module (`game`)
//! The client's view of the world: session phase, the hard-set local
//! ship, and the interpolated remote ships with their snapshot targets.
//!
//! ### Input Module (`input`)
//! Turns raw axis samples into wire commands: clamps to [-1, 1], sends
//! every sample while an axis is active, and sends exactly one zero
//! command on the release edge so the server knows to start coasting.
//!
//! ### Network Module (`network`)
//! The WebSocket transport and the [`network::Client`] facade that ties
//! the other modules together into a frame-driven loop.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::events::{EventBus, GameEventKind};
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut events = EventBus::new();
//!     events.subscribe(GameEventKind::Joined, |event| {
//!         println!("joined: {:?}", event);
//!     });
//!
//!     let mut client = Client::connect("ws://127.0.0.1:3000", events).await?;
//!     loop {
//!         client.frame(1.0 / 60.0);
//!         if client.world().is_joined() {
//!             client.send_axes(0.0, 1.0)?;
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(16)).await;
//!     }
//! }
//! ```

pub mod events;
pub mod game;
pub mod input;
pub mod network;
