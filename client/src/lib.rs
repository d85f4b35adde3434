//! # Forager Client Library
//!
//! This library provides the client side of the multiplayer foraging world:
//! keyboard input, the local player's movement, a mirror of the server's
//! world state and a top-down map renderer.
//!
//! ## Architecture Overview
//!
//! The server owns all shared state. The client keeps a private projection
//! of it and only ever changes that projection by applying packets from the
//! server, in the order they arrive.
//!
//! ### Local Prediction
//! The local player's own position is simulated every frame without waiting
//! for the server. A throttled sample of it is sent every 50ms; frames in
//! between are never seen by anyone else.
//!
//! ### Remote Smoothing
//! Poses relayed for other players are treated as targets. Each frame the
//! drawn avatar closes a fixed fraction of the remaining distance, so remote
//! players glide instead of teleporting and trail the truth a little.
//!
//! ### Server-Confirmed Collection
//! Walking onto a mushroom sends a collect intent, but the mushroom stays on
//! screen until the server broadcasts who got it. If someone else got there
//! first, nothing happens locally beyond the item disappearing.
//!
//! ## Module Organization
//!
//! ### Reconciler Module (`reconciler`)
//! The local projection of participants and items, the pending-claim set,
//! the local score and inventory, and the last leaderboard.
//!
//! ### Local Player Module (`local_player`)
//! Predicted movement over the terrain and the pose-update throttle.
//!
//! ### Game Module (`game`)
//! Per-frame glue that advances prediction and decides which intents to send.
//!
//! ### Input Module (`input`)
//! Keyboard sampling: WASD/arrows to move, Q/E to turn, L for the leaderboard.
//!
//! ### Network Module (`network`)
//! A background thread running the TCP connection.
//!
//! ### Rendering Module (`rendering`)
//! Map, avatars and HUD drawn with macroquad.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::ClientGame;
//! use client::input::FrameInput;
//! use client::network::{NetEvent, NetworkClient};
//! use shared::RollingTerrain;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let network = NetworkClient::connect("127.0.0.1:3069", "Forager")?;
//! let mut game = ClientGame::new(RollingTerrain::new(0));
//!
//! for frame in 0..600u64 {
//!     for event in network.poll() {
//!         if let NetEvent::Packet(packet) = event {
//!             game.handle_packet(packet);
//!         }
//!     }
//!
//!     let input = FrameInput { forward: 1.0, ..FrameInput::default() };
//!     for packet in game.update(1.0 / 60.0, &input, frame * 16) {
//!         network.send(packet);
//!     }
//! }
//!
//! network.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod game;
pub mod input;
pub mod local_player;
pub mod network;
pub mod reconciler;
pub mod rendering;
