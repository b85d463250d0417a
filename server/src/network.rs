//! TCP front end: accept loop and per-connection line handling
//!
//! Each connection gets two tasks:
//! - **Reader**: reads newline-terminated lines and dispatches them in order
//! - **Writer**: drains the session outbox to the socket
//!
//! Game code only ever queues lines on the outbox, so a slow client never
//! blocks the session that is messaging it.

use log::{debug, error, info, warn};
use shared::protocol::{CONNECTED, NAME_PROMPT, SERVER_FULL};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::battle::Arena;
use crate::config::ServerConfig;
use crate::dispatch::{self, Flow};
use crate::error::{Result, ServerError};
use crate::registry::PlayerRegistry;
use crate::session::Session;
use crate::stats::StatsStore;

/// Longest accepted client line, newline included
pub const MAX_LINE_BYTES: usize = 4096;

/// The listening server and the state shared by all its connections.
pub struct Server {
    listener: TcpListener,
    arena: Arc<Arena>,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr()?).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let arena = Arena::new(
            Arc::new(PlayerRegistry::new(config.max_clients)),
            Arc::new(StatsStore::new()),
            config.leaderboard_size,
        );
        Ok(Server {
            listener,
            arena: Arc::new(arena),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared game state, e.g. for a shutdown report.
    pub fn arena(&self) -> Arc<Arena> {
        Arc::clone(&self.arena)
    }

    /// Accepts connections until the task is dropped.
    pub async fn run(self) -> Result<()> {
        info!("Server started successfully");
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };

            let arena = Arc::clone(&self.arena);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(arena, stream, addr).await {
                    warn!("Connection {} ended with error: {}", addr, e);
                }
            });
        }
    }
}

async fn handle_connection(arena: Arc<Arena>, stream: TcpStream, addr: SocketAddr) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();

    let Some(session) = arena.registry.register(addr, tx).await else {
        write_half
            .write_all(format!("{SERVER_FULL}\n").as_bytes())
            .await?;
        write_half.shutdown().await?;
        return Err(ServerError::ServerFull(arena.registry.max_clients()));
    };

    tokio::spawn(write_lines(write_half, rx, session.id));

    session.send(CONNECTED);
    session.send(NAME_PROMPT);

    let result = read_lines(&arena, &session, read_half).await;

    // Runs exactly once per connection, whatever ended the loop
    arena.disconnect(&session).await;
    result
}

async fn read_lines(arena: &Arena, session: &Session, read_half: OwnedReadHalf) -> Result<()> {
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        let read = (&mut reader)
            .take(MAX_LINE_BYTES as u64)
            .read_line(&mut line)
            .await?;
        if read == 0 {
            info!("Connection closed by {}", session.display_name());
            return Ok(());
        }
        if read == MAX_LINE_BYTES && !line.ends_with('\n') {
            return Err(ServerError::LineTooLong(MAX_LINE_BYTES));
        }

        let text = line.trim_end_matches(['\r', '\n']);
        if dispatch::handle_line(arena, session, text).await == Flow::Exit {
            info!("{} left the game", session.display_name());
            return Ok(());
        }
    }
}

/// Writes queued lines until every sender is gone or the peer stops reading.
async fn write_lines(
    mut writer: OwnedWriteHalf,
    mut outbox: mpsc::UnboundedReceiver<String>,
    id: u32,
) {
    while let Some(message) = outbox.recv().await {
        let mut data = message.into_bytes();
        data.push(b'\n');
        if let Err(e) = writer.write_all(&data).await {
            debug!("Write to session {} failed: {}", id, e);
            break;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(max_clients: usize) -> ServerConfig {
        ServerConfig {
            port: 0,
            max_clients,
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_bind_on_free_port() {
        let server = tokio_test::assert_ok!(Server::bind(&test_config(4)).await);
        let addr = tokio_test::assert_ok!(server.local_addr());
        assert_ne!(addr.port(), 0);
        assert!(server.arena().registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_connect_greeting_and_server_full() {
        let server = Server::bind(&test_config(1)).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let first = TcpStream::connect(addr).await.unwrap();
        let mut first = BufReader::new(first).lines();
        assert_eq!(first.next_line().await.unwrap().unwrap(), CONNECTED);
        assert_eq!(first.next_line().await.unwrap().unwrap(), NAME_PROMPT);

        let second = TcpStream::connect(addr).await.unwrap();
        let mut second = BufReader::new(second).lines();
        assert_eq!(second.next_line().await.unwrap().unwrap(), SERVER_FULL);
        assert_eq!(second.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overlong_line_closes_connection() {
        let server = Server::bind(&test_config(2)).await.unwrap();
        let addr = server.local_addr().unwrap();
        let arena = server.arena();
        tokio::spawn(server.run());

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let junk = vec![b'x'; MAX_LINE_BYTES + 10];
        stream.write_all(&junk).await.unwrap();

        let mut lines = BufReader::new(stream).lines();
        let mut closed = false;
        for _ in 0..3 {
            if lines.next_line().await.unwrap_or(None).is_none() {
                closed = true;
                break;
            }
        }
        assert!(closed);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(arena.registry.is_empty().await);
    }
}
