//! # Battle Server Library
//!
//! This library implements a text-line TCP battle server. Players connect,
//! register a unique name, fight a PVE enemy, equip weapons and challenge
//! each other to PVP battles. Results feed a global leaderboard and a match
//! history with analytical reports.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! Every connection runs its own reader task that dispatches lines in order,
//! plus a writer task that drains an unbounded outbox. Handlers never wait
//! on a peer's socket, so one slow client cannot stall a battle.
//!
//! ### Shared State By Handle
//! The [`registry::PlayerRegistry`] and [`stats::StatsStore`] are created once
//! and passed to every connection through an [`battle::Arena`]. There is no
//! global state.
//!
//! ### Opponents As Handles
//! A battling player stores its opponent's session id, never a reference.
//! Each use resolves the id through the registry, so a disconnected opponent
//! shows up as absent instead of stale.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Per-player state: HP, weapon, menu flag, battle pairing and counters.
//!
//! ### Registry Module (`registry`)
//! Live connections, capacity limit and atomic name claims.
//!
//! ### Battle Module (`battle`)
//! Challenge, accept, attack, heal, surrender, PVE and disconnect cleanup.
//!
//! ### Dispatch Module (`dispatch`)
//! Layered resolution of each client line into one handler.
//!
//! ### Stats And Report Modules (`stats`, `report`)
//! Leaderboard storage, match history and the read-only analytics.
//!
//! ### Network Module (`network`)
//! TCP accept loop, line reader and outbox writer.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(&ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod battle;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod menu;
pub mod network;
pub mod registry;
pub mod report;
pub mod session;
pub mod stats;
pub mod utils;
