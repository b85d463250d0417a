//! Per-connection player state
//!
//! A [`Session`] is shared (`Arc`) between its own connection task and every
//! other task that challenges, attacks or lists it. Its mutable fields live in
//! a single [`PlayerState`] behind one mutex, so compound fields such as the
//! battle pairing are always observed together.

use log::debug;
use shared::{attack_damage, Weapon, HEAL_AMOUNT, MAX_HP, REVIVE_HP};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex, MutexGuard};

use crate::stats::PlayerStats;

/// Registry-assigned identity of a connection.
pub type SessionId = u32;

/// An active PVP pairing as seen from one side.
///
/// Holding the opponent as a `SessionId` means a disconnected peer resolves to
/// "absent" through the registry instead of a stale reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Battle {
    /// The other side of the pairing
    pub opponent: SessionId,
    /// When `ACCEPT` paired the two sides
    pub started_at: Instant,
    /// Damage this side has dealt since the battle started
    pub damage_dealt: u32,
}

impl Battle {
    pub fn new(opponent: SessionId) -> Self {
        Self {
            opponent,
            started_at: Instant::now(),
            damage_dealt: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Mutable game state of one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    /// Current health in `0..=MAX_HP`; 0 means dead
    pub hp: u32,
    /// Equipped weapon; `None` attacks with `BASE_DAMAGE`
    pub weapon: Option<Weapon>,
    /// Set while the weapon menu is open, so numbers select weapons
    pub in_weapon_menu: bool,
    /// `Some` exactly while the player is in a PVP battle
    pub battle: Option<Battle>,
    /// PVE and PVP kills, carried over between connections
    pub kills: u32,
    /// Deaths, counted once per lethal hit
    pub deaths: u32,
    /// All damage dealt, PVE and PVP
    pub total_damage: u32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            hp: MAX_HP,
            weapon: None,
            in_weapon_menu: false,
            battle: None,
            kills: 0,
            deaths: 0,
            total_damage: 0,
        }
    }
}

/// Result of a heal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealOutcome {
    /// The player was dead and is back with `hp`
    Revived { hp: u32 },
    /// A normal heal; `amount` is always the nominal heal, even when capped
    Healed { amount: u32, hp: u32 },
}

impl PlayerState {
    /// True while `hp` is above zero.
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn in_battle(&self) -> bool {
        self.battle.is_some()
    }

    pub fn opponent(&self) -> Option<SessionId> {
        self.battle.map(|b| b.opponent)
    }

    /// Damage one attack deals with the current weapon.
    pub fn damage(&self) -> u32 {
        attack_damage(self.weapon.as_ref())
    }

    pub fn weapon_name(&self) -> String {
        self.weapon
            .map_or_else(|| "none".to_string(), |w| w.name.to_string())
    }

    /// Snapshot of the persistent counters.
    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            kills: self.kills,
            deaths: self.deaths,
            total_damage: self.total_damage,
        }
    }

    /// Starts a battle against `opponent` with full health.
    pub fn begin_battle(&mut self, opponent: SessionId) {
        self.hp = MAX_HP;
        self.in_weapon_menu = false;
        self.battle = Some(Battle::new(opponent));
    }

    /// Clears the pairing and returns what it was.
    pub fn end_battle(&mut self) -> Option<Battle> {
        self.battle.take()
    }

    /// Ends the battle only if it is still against `opponent`.
    pub fn end_battle_with(&mut self, opponent: SessionId) -> Option<Battle> {
        match self.battle {
            Some(b) if b.opponent == opponent => self.battle.take(),
            _ => None,
        }
    }

    /// Books damage dealt by this player, on the battle counter too if battling.
    pub fn add_damage_dealt(&mut self, amount: u32) {
        self.total_damage = self.total_damage.saturating_add(amount);
        if let Some(battle) = self.battle.as_mut() {
            battle.damage_dealt = battle.damage_dealt.saturating_add(amount);
        }
    }

    /// Applies incoming damage, floored at 0. Returns true if this hit was lethal.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.is_alive();
        self.hp = self.hp.saturating_sub(amount).min(MAX_HP);
        was_alive && !self.is_alive()
    }

    /// Counts a death. Death always ends the battle; the ended pairing is
    /// returned so the caller can release the other side.
    pub fn record_death(&mut self) -> Option<Battle> {
        self.deaths += 1;
        self.battle.take()
    }

    /// Revives a dead player to `REVIVE_HP`, otherwise heals by
    /// `HEAL_AMOUNT` capped at `MAX_HP`.
    ///
    /// The reported amount is the nominal heal, so a player at 95 HP sees
    /// `HEALED:15` followed by `HP:100`.
    pub fn heal(&mut self) -> HealOutcome {
        if !self.is_alive() {
            self.hp = REVIVE_HP;
            self.in_weapon_menu = false;
            return HealOutcome::Revived { hp: self.hp };
        }
        self.hp = (self.hp + HEAL_AMOUNT).min(MAX_HP);
        HealOutcome::Healed {
            amount: HEAL_AMOUNT,
            hp: self.hp,
        }
    }
}

/// One connected client.
///
/// The id and address are fixed at accept time. The name is set once during
/// registration; everything else that changes lives in [`PlayerState`].
#[derive(Debug)]
pub struct Session {
    /// Registry-assigned id, unique for the server's lifetime
    pub id: SessionId,
    /// Peer address, used in logs
    pub addr: SocketAddr,
    /// Display name, empty until registration completes
    name: OnceLock<String>,
    /// Game state, locked for every read or change
    state: Mutex<PlayerState>,
    /// Lines queued for the connection's writer task
    outbox: mpsc::UnboundedSender<String>,
}

impl Session {
    pub fn new(id: SessionId, addr: SocketAddr, outbox: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            addr,
            name: OnceLock::new(),
            state: Mutex::new(PlayerState::default()),
            outbox,
        }
    }

    /// The registered name, if registration has completed.
    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Name for messages and logs; falls back to the connection id.
    pub fn display_name(&self) -> String {
        self.name()
            .map_or_else(|| format!("client#{}", self.id), str::to_string)
    }

    /// Sets the name once. Callers go through the registry so the uniqueness
    /// check and the assignment happen under the same lock.
    pub(crate) fn set_name(&self, name: String) -> bool {
        self.name.set(name).is_ok()
    }

    /// Locks the player state.
    ///
    /// Hold the guard briefly and never across a registry call. Locking two
    /// sessions at once goes through the arena's ordered pair lock.
    pub async fn state(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().await
    }

    /// Queues a line for the client. Never waits on the peer; a closed
    /// connection just drops the message.
    pub fn send(&self, message: impl Into<String>) {
        if self.outbox.send(message.into()).is_err() {
            debug!("Dropping message for closed session {}", self.id);
        }
    }

    /// Queues several lines in order.
    pub fn send_all<I, S>(&self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for message in messages {
            self.send(message);
        }
    }
}
