//! Registry of connected player sessions
//!
//! This module tracks every live connection for the lifetime of the process:
//! - Session registration on connect and removal on disconnect
//! - Capacity enforcement
//! - Atomic name claiming with case-insensitive uniqueness
//! - Name lookup and roster snapshots for challenges and broadcasts
//!
//! Readers always get a snapshot (`Arc` clones taken under the read lock), so
//! a full scan never holds the lock while sessions are inspected or messaged.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::session::{Session, SessionId};

/// Outcome of a name claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClaim {
    Accepted,
    Blank,
    Taken,
    /// The session already has a name; names never change.
    AlreadyNamed,
}

struct Roster {
    sessions: HashMap<SessionId, Arc<Session>>,
    next_session_id: SessionId,
}

/// Process-wide set of live sessions, keyed by session id.
pub struct PlayerRegistry {
    /// Live sessions and the next id to hand out
    roster: RwLock<Roster>,
    /// Connections beyond this are refused with `SERVER_FULL`
    max_clients: usize,
}

impl PlayerRegistry {
    /// Creates an empty registry that admits at most `max_clients` sessions.
    /// Session ids start from 1.
    pub fn new(max_clients: usize) -> Self {
        Self {
            roster: RwLock::new(Roster {
                sessions: HashMap::new(),
                next_session_id: 1,
            }),
            max_clients,
        }
    }

    /// Registers a new connection and hands back its session.
    ///
    /// Returns None if the server is at capacity.
    pub async fn register(
        &self,
        addr: SocketAddr,
        outbox: mpsc::UnboundedSender<String>,
    ) -> Option<Arc<Session>> {
        let mut roster = self.roster.write().await;
        if roster.sessions.len() >= self.max_clients {
            return None;
        }

        let id = roster.next_session_id;
        roster.next_session_id += 1;

        let session = Arc::new(Session::new(id, addr, outbox));
        roster.sessions.insert(id, Arc::clone(&session));
        info!("Session {} connected from {}", id, addr);

        Some(session)
    }

    /// Removes a session. Returns false if it was already gone.
    pub async fn unregister(&self, id: SessionId) -> bool {
        let removed = self.roster.write().await.sessions.remove(&id);
        match removed {
            Some(session) => {
                info!("Session {} ({}) removed", id, session.display_name());
                true
            }
            None => false,
        }
    }

    /// Resolves a session id, e.g. an opponent handle. None once disconnected.
    pub async fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.roster.read().await.sessions.get(&id).cloned()
    }

    /// True if no other named session uses `candidate` (case-insensitive).
    pub async fn is_name_unique(&self, candidate: &str, except: SessionId) -> bool {
        let roster = self.roster.read().await;
        name_is_free(&roster, candidate, except)
    }

    /// Checks uniqueness and assigns the name under one write lock, so two
    /// concurrent claims of the same name cannot both succeed.
    pub async fn claim_name(&self, session: &Session, candidate: &str) -> NameClaim {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return NameClaim::Blank;
        }

        let roster = self.roster.write().await;
        if !name_is_free(&roster, candidate, session.id) {
            return NameClaim::Taken;
        }
        if session.set_name(candidate.to_string()) {
            NameClaim::Accepted
        } else {
            NameClaim::AlreadyNamed
        }
    }

    /// First named session other than `except` whose name matches case-insensitively.
    pub async fn find_by_name(&self, name: &str, except: SessionId) -> Option<Arc<Session>> {
        let name = name.trim();
        let roster = self.roster.read().await;
        roster
            .sessions
            .values()
            .filter(|s| s.id != except)
            .find(|s| s.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .cloned()
    }

    /// Snapshot of every session except `except`, in connection order.
    pub async fn all_except(&self, except: SessionId) -> Vec<Arc<Session>> {
        let roster = self.roster.read().await;
        let mut others: Vec<Arc<Session>> = roster
            .sessions
            .values()
            .filter(|s| s.id != except)
            .cloned()
            .collect();
        others.sort_by_key(|s| s.id);
        others
    }

    /// Returns the number of currently connected sessions
    pub async fn len(&self) -> usize {
        self.roster.read().await.sessions.len()
    }

    /// Returns true if no sessions are currently connected
    pub async fn is_empty(&self) -> bool {
        self.roster.read().await.sessions.is_empty()
    }

    /// Configured connection limit.
    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}

fn name_is_free(roster: &Roster, candidate: &str, except: SessionId) -> bool {
    roster
        .sessions
        .values()
        .filter(|s| s.id != except)
        .filter_map(|s| s.name())
        .all(|n| !n.eq_ignore_ascii_case(candidate))
}
