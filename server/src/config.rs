use clap::Parser;
use shared::DEFAULT_PORT;
use std::net::SocketAddr;

use crate::error::{Result, ServerError};

/// Command-line configuration for the battle server.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
    /// Server port to listen on (0 picks a free port)
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Maximum number of concurrent connections
    #[arg(short, long, default_value = "64")]
    pub max_clients: usize,
    /// Number of entries shown by LEADERBOARD
    #[arg(short, long, default_value = "10")]
    pub leaderboard_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_clients: 64,
            leaderboard_size: 10,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(address))
    }
}
