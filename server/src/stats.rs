//! Global player statistics and PVP match history
//!
//! Per-player totals survive disconnects so the leaderboard outlives
//! individual sessions. Each name has one active session at a time, so the
//! stored tuple is simply overwritten by whichever session reports last.

use log::{info, warn};
use serde::Serialize;
use shared::kd_ratio;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::utils::{format_seconds, get_timestamp};

/// Cumulative counters of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    /// PVE and PVP kills
    pub kills: u32,
    /// Times the player was killed
    pub deaths: u32,
    /// Damage dealt across all attacks
    pub total_damage: u32,
}

impl PlayerStats {
    pub fn new(kills: u32, deaths: u32, total_damage: u32) -> Self {
        Self {
            kills,
            deaths,
            total_damage,
        }
    }

    /// Kills per death; kills alone while deaths is zero.
    pub fn kd_ratio(&self) -> f64 {
        kd_ratio(self.kills, self.deaths)
    }
}

/// A leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    /// Name as the player registered it
    pub name: String,
    pub stats: PlayerStats,
}

impl std::fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<15} | K: {:<3} | D: {:<3} | K/D: {:<5.2} | Damage: {:<6}",
            self.name,
            self.stats.kills,
            self.stats.deaths,
            self.stats.kd_ratio(),
            self.stats.total_damage
        )
    }
}

/// Immutable record of one completed PVP battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub winner: String,
    pub loser: String,
    /// Damage the winner dealt during this battle
    pub winner_damage: u32,
    /// Damage the loser dealt during this battle
    pub loser_damage: u32,
    /// Time from `ACCEPT` to the lethal hit
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub winner_weapon: String,
    pub loser_weapon: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub surrender: bool,
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(duration.as_millis() as u64)
}

impl MatchResult {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        winner: impl Into<String>,
        loser: impl Into<String>,
        winner_damage: u32,
        loser_damage: u32,
        duration: Duration,
        winner_weapon: impl Into<String>,
        loser_weapon: impl Into<String>,
        surrender: bool,
    ) -> Self {
        Self {
            winner: winner.into(),
            loser: loser.into(),
            winner_damage,
            loser_damage,
            duration,
            winner_weapon: winner_weapon.into(),
            loser_weapon: loser_weapon.into(),
            timestamp: get_timestamp(),
            surrender,
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) defeated {} ({}) | Damage: {} vs {} | Duration: {}{}",
            self.winner,
            self.winner_weapon,
            self.loser,
            self.loser_weapon,
            self.winner_damage,
            self.loser_damage,
            format_seconds(self.duration),
            if self.surrender { " [SURRENDER]" } else { "" }
        )
    }
}

#[derive(Default)]
struct Table {
    /// Rows in first-registration order; ties on the leaderboard keep this order
    rows: Vec<LeaderboardEntry>,
    index: HashMap<String, usize>,
}

/// Process-wide stats store shared by every session.
#[derive(Default)]
pub struct StatsStore {
    /// Counters keyed by registered name
    players: RwLock<Table>,
    /// Finished battles in completion order
    history: RwLock<Vec<MatchResult>>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finished battle to the history and logs it.
    pub async fn record_match(&self, result: MatchResult) {
        info!("Match recorded: {}", result);
        match serde_json::to_string(&result) {
            Ok(json) => info!("match_result {}", json),
            Err(e) => warn!("Failed to serialize match result: {}", e),
        }
        self.history.write().await.push(result);
    }

    /// Overwrites the stored counters for `name`. Callers pass full session
    /// totals, never deltas.
    pub async fn upsert_player_stats(&self, name: &str, stats: PlayerStats) {
        let mut table = self.players.write().await;
        let existing = table.index.get(name).copied();
        match existing {
            Some(i) => table.rows[i].stats = stats,
            None => {
                let i = table.rows.len();
                table.rows.push(LeaderboardEntry {
                    name: name.to_string(),
                    stats,
                });
                table.index.insert(name.to_string(), i);
            }
        }
    }

    /// Zeroes the counters of a name that (re)registers.
    pub async fn reset_player(&self, name: &str) {
        self.upsert_player_stats(name, PlayerStats::default()).await;
    }

    /// Stored counters for `name`, if it ever registered.
    pub async fn player_stats(&self, name: &str) -> Option<PlayerStats> {
        let table = self.players.read().await;
        table.index.get(name).map(|&i| table.rows[i].stats)
    }

    /// Top `top_n` players by K/D ratio, descending. The sort is stable.
    pub async fn leaderboard(&self, top_n: usize) -> Vec<LeaderboardEntry> {
        let mut rows = self.players.read().await.rows.clone();
        rows.sort_by(|a, b| {
            b.stats
                .kd_ratio()
                .partial_cmp(&a.stats.kd_ratio())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows.truncate(top_n);
        rows
    }

    /// Snapshot of the match history for reports.
    pub async fn history(&self) -> Vec<MatchResult> {
        self.history.read().await.clone()
    }

    pub async fn match_count(&self) -> usize {
        self.history.read().await.len()
    }
}
