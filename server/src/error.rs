//! Errors surfaced at the transport boundary. Protocol misuse is never an
//! error here; it is answered with a reply line.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("server full ({0} clients)")]
    ServerFull(usize),

    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
