//! # Battle Client Library
//!
//! A console client for the battle server. It forwards typed commands over a
//! TCP line connection and prints server replies as readable text.
//!
//! ## Module Organization
//!
//! ### Display Module (`display`)
//! Translates protocol tokens such as `HP:75` or `CHALLENGE_REQUEST:Bob` into
//! console text, and classifies typed lines (send, clear screen, exit).
//!
//! ### Network Module (`network`)
//! Owns the TCP connection. A background task reads server lines while the
//! input loop forwards commands, so replies and challenges show up as soon as
//! they arrive.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:5000").await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod display;
pub mod network;
