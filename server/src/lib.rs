//! # Frog Pond Game Server Library
//!
//! Authoritative server for the frog pond arena: players hop between lily
//! pads, catch flies for experience, and knock each other into the water.
//! This library owns the canonical world state, applies every player
//! action, and broadcasts the updates that keep all connected clients
//! synchronized.
//!
//! ## Architecture
//!
//! All game state is owned by a single control task. Inbound packets and
//! the fixed-rate simulation tick are multiplexed onto that task through
//! channels, so every mutating handler runs to completion before the next
//! event. No locks guard the world, and contested situations (simultaneous
//! attacks, pad occupancy, respawn races) resolve deterministically in
//! arrival order.
//!
//! ## Module Organization
//!
//! - [`world`]: one-shot procedural lily-pad layout, run before any
//!   connection is accepted
//! - [`flies`]: the fixed-size fly population and its per-tick wandering
//! - [`players`]: the authoritative player roster and name reservations
//! - [`actions`]: validation and application of player actions, producing
//!   outbound events
//! - [`game`]: the assembled world state shared by the modules above
//! - [`client_manager`]: transport-level session roster with timeout
//!   sweeping
//! - [`network`]: UDP socket plumbing and the main `select!` loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 60 Hz tick, up to 32 concurrent clients
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(16),
//!         32
//!     ).await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod client_manager;
pub mod flies;
pub mod game;
pub mod network;
pub mod players;
pub mod world;
