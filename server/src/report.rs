//! Read-side analytics over the PVP match history.
//!
//! Every query is an independent pass over an immutable slice of
//! [`MatchResult`]s. Rankings break ties by name so output is deterministic.

use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

use crate::stats::MatchResult;
use crate::utils::format_seconds;

/// Sorts `(name, value)` pairs by value descending, then name ascending.
fn rank_desc<V: PartialOrd>(mut rows: Vec<(String, V)>) -> Vec<(String, V)> {
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    rows
}

/// Damage dealt per player, counted as winner and as loser.
fn damage_samples(history: &[MatchResult]) -> HashMap<String, Vec<u32>> {
    let mut samples: HashMap<String, Vec<u32>> = HashMap::new();
    for m in history {
        samples
            .entry(m.winner.clone())
            .or_default()
            .push(m.winner_damage);
        samples
            .entry(m.loser.clone())
            .or_default()
            .push(m.loser_damage);
    }
    samples
}

/// Top `n` players by total damage across all their battles.
pub fn top_damage(history: &[MatchResult], n: usize) -> Vec<(String, u64)> {
    let totals = damage_samples(history)
        .into_iter()
        .map(|(name, dmg)| (name, dmg.iter().map(|&d| d as u64).sum::<u64>()))
        .collect::<Vec<_>>();
    let mut ranked = rank_desc(totals);
    ranked.truncate(n);
    ranked
}

pub fn average_duration(history: &[MatchResult]) -> Option<Duration> {
    if history.is_empty() {
        return None;
    }
    let total: Duration = history.iter().map(|m| m.duration).sum();
    Some(total / history.len() as u32)
}

/// Players whose average damage per battle is strictly above `threshold`.
pub fn players_above_average_damage(history: &[MatchResult], threshold: f64) -> Vec<(String, f64)> {
    let averages = damage_samples(history)
        .into_iter()
        .map(|(name, dmg)| {
            let avg = dmg.iter().map(|&d| d as f64).sum::<f64>() / dmg.len() as f64;
            (name, avg)
        })
        .filter(|(_, avg)| *avg > threshold)
        .collect::<Vec<_>>();
    rank_desc(averages)
}

pub fn victory_counts(history: &[MatchResult]) -> Vec<(String, usize)> {
    let mut wins: HashMap<String, usize> = HashMap::new();
    for m in history {
        *wins.entry(m.winner.clone()).or_default() += 1;
    }
    rank_desc(wins.into_iter().collect())
}

/// Winner weapon with the highest average winning damage.
pub fn most_effective_weapon(history: &[MatchResult]) -> Option<(String, f64)> {
    let mut by_weapon: HashMap<&str, (u64, u32)> = HashMap::new();
    for m in history {
        let entry = by_weapon.entry(m.winner_weapon.as_str()).or_default();
        entry.0 += m.winner_damage as u64;
        entry.1 += 1;
    }
    let averages = by_weapon
        .into_iter()
        .map(|(weapon, (sum, count))| (weapon.to_string(), sum as f64 / count as f64))
        .collect::<Vec<_>>();
    rank_desc(averages).into_iter().next()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurrenderRate {
    pub surrenders: usize,
    pub total: usize,
    pub percent: f64,
}

pub fn surrender_rate(history: &[MatchResult]) -> SurrenderRate {
    let total = history.len();
    let surrenders = history.iter().filter(|m| m.surrender).count();
    let percent = if total > 0 {
        surrenders as f64 * 100.0 / total as f64
    } else {
        0.0
    };
    SurrenderRate {
        surrenders,
        total,
        percent,
    }
}

/// Longest and shortest battle. The first one wins a tie.
pub fn duration_extremes(history: &[MatchResult]) -> Option<(&MatchResult, &MatchResult)> {
    let first = history.first()?;
    let (mut longest, mut shortest) = (first, first);
    for m in &history[1..] {
        if m.duration > longest.duration {
            longest = m;
        }
        if m.duration < shortest.duration {
            shortest = m;
        }
    }
    Some((longest, shortest))
}

/// Order-independent key for a pair of players.
fn matchup_key(a: &str, b: &str) -> String {
    if a < b {
        format!("{a} vs {b}")
    } else {
        format!("{b} vs {a}")
    }
}

/// Pairs of players that met more than once.
pub fn rivalries(history: &[MatchResult]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in history {
        *counts.entry(matchup_key(&m.winner, &m.loser)).or_default() += 1;
    }
    rank_desc(counts.into_iter().filter(|(_, n)| *n > 1).collect())
}

/// Renders every report as one multi-line block.
pub fn full_report(history: &[MatchResult]) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "FULL SERVER STATS REPORT");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total battles: {}", history.len());

    let _ = writeln!(out, "\n=== TOP 3 PLAYERS BY TOTAL DAMAGE ===");
    for (name, dmg) in top_damage(history, 3) {
        let _ = writeln!(out, "{name:<15}: {dmg} damage");
    }

    let _ = writeln!(out, "\n=== VICTORIES PER PLAYER ===");
    for (name, wins) in victory_counts(history) {
        let _ = writeln!(out, "{name:<15}: {wins} victories");
    }

    match average_duration(history) {
        Some(avg) => {
            let _ = writeln!(out, "\nAverage battle duration: {:.2} seconds", avg.as_secs_f64());
        }
        None => {
            let _ = writeln!(out, "\nAverage battle duration: no battles yet");
        }
    }

    let _ = writeln!(out, "\n=== PLAYERS WITH AVERAGE DAMAGE > 100 ===");
    for (name, avg) in players_above_average_damage(history, 100.0) {
        let _ = writeln!(out, "{name:<15}: {avg:.1} average damage");
    }

    let _ = writeln!(out, "\n=== MOST EFFECTIVE WEAPON ===");
    match most_effective_weapon(history) {
        Some((weapon, avg)) => {
            let _ = writeln!(out, "{weapon} with {avg:.1} average damage");
        }
        None => {
            let _ = writeln!(out, "No weapon data");
        }
    }

    let rate = surrender_rate(history);
    let _ = writeln!(
        out,
        "\nSurrender rate: {:.1}% ({} of {} battles)",
        rate.percent, rate.surrenders, rate.total
    );

    let _ = writeln!(out, "\n=== LONGEST AND SHORTEST BATTLES ===");
    if let Some((longest, shortest)) = duration_extremes(history) {
        let _ = writeln!(
            out,
            "Longest: {} - {} vs {}",
            format_seconds(longest.duration),
            longest.winner,
            longest.loser
        );
        let _ = writeln!(
            out,
            "Shortest: {} - {} vs {}",
            format_seconds(shortest.duration),
            shortest.winner,
            shortest.loser
        );
    }

    let _ = writeln!(out, "\n=== RIVALRIES (REPEATED MATCHUPS) ===");
    for (pair, battles) in rivalries(history) {
        let _ = writeln!(out, "{pair}: {battles} battles");
    }

    let _ = write!(out, "\n{rule}");
    out
}
