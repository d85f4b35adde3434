//! # Forager Server Library
//!
//! This library provides the authoritative server for the multiplayer
//! mushroom-foraging world. It owns the item pool and the roster of
//! connected foragers, decides every collection race, and broadcasts the
//! resulting events so that all clients converge on the same world.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server is the only writer of shared state. Clients report their own
//! pose and ask to collect items; the server decides whether an item is still
//! available, credits the winner and tells everyone what happened.
//!
//! ### Collection Races
//! When two foragers reach for the same mushroom, the first claim the server
//! processes wins. Later claims for the same item are refused with a
//! `CollectRejected` notice and change nothing.
//!
//! ### Respawning
//! A collected item comes back at a fresh random spot with a freshly drawn
//! kind after the respawn delay. Item ids are stable for the life of the
//! process, so clients can key their local state on them.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! Accept, read and write tasks run concurrently, but they only move bytes.
//! Decoded packets, disconnects and respawn deadlines all flow into one
//! channel-driven loop that applies them to the [`authority::Authority`] one
//! at a time. No locks guard world state because only that loop touches it.
//!
//! ### TCP Framing
//! Packets are bincode-encoded and sent as length-prefixed frames over TCP,
//! which gives ordered, reliable delivery per connection. A frame that fails
//! to decode is logged and skipped; the connection stays open.
//!
//! ## Module Organization
//!
//! ### Item Pool (`item_pool`)
//! The fixed set of collectible items, their placement on the terrain and the
//! available/collected flag.
//!
//! ### Roster (`roster`)
//! Joined participants with their pose, score and per-kind inventory, plus
//! the leaderboard ordering.
//!
//! ### Scheduler (`scheduler`) and Collection (`collection`)
//! The claim/respawn lifecycle: a claim flips the item, credits the claimant
//! and queues a respawn deadline; expired deadlines redraw the item.
//!
//! ### Authority (`authority`)
//! Routes inbound intents to the modules above and turns the outcome into
//! addressed packets.
//!
//! ### Client Manager (`client_manager`) and Network (`network`)
//! Connection ids, capacity limits, per-connection writer queues and the
//! main event loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::authority::WorldConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut server = Server::new("127.0.0.1:3069", 64, WorldConfig::default()).await?;
//!
//!     // Runs until ctrl-c or a ShutdownHandle fires
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Trust Model
//!
//! Reported poses are stored verbatim and collection intents are not checked
//! against the claimant's distance to the item. The server arbitrates races
//! between honest clients; it does not defend against modified ones.

pub mod authority;
pub mod client_manager;
pub mod collection;
pub mod item_pool;
pub mod network;
pub mod roster;
pub mod scheduler;
