//! Multi-line text blocks sent to clients.

use shared::protocol::{self, YOU_ARE_DEAD};
use shared::{kd_ratio, BASE_DAMAGE, WEAPONS};

use crate::session::PlayerState;
use crate::stats::LeaderboardEntry;

pub fn main_menu() -> String {
    [
        "=== AVAILABLE COMMANDS ===",
        "1  - ATTACK           - Attack the PVE enemy",
        "2  - HEAL             - Heal 15 HP (or revive if dead)",
        "3  - STATUS           - Show your status",
        "4  - PLAYERS          - List connected players",
        "5  - WEAPONS          - Weapon menu",
        "6  - CHALLENGE:name   - Challenge a player",
        "7  - ACCEPT:name      - Accept a challenge",
        "8  - RESET_ENEMIES    - Reset enemies",
        "9  - HELP             - Show this help",
        "STATS                 - Show your statistics",
        "LEADERBOARD           - Show the global ranking",
        "REPORT                - Show the battle history report",
        "0  - EXIT             - Leave the game",
        "==========================",
    ]
    .join("\n")
}

pub fn battle_menu(hp: u32, opponent_hp: u32) -> String {
    format!(
        "=== PVP BATTLE ===\n\
         1 - ATTACK    - Attack your opponent\n\
         2 - HEAL      - Heal 15 HP\n\
         S - SURRENDER - Give up\n\
         STATS         - Show your statistics\n\
         ==================\n\
         Your HP: {hp} | Opponent HP: {opponent_hp}"
    )
}

pub fn weapon_menu() -> String {
    let mut lines = vec!["=== AVAILABLE WEAPONS ===".to_string()];
    lines.extend(
        WEAPONS
            .iter()
            .enumerate()
            .map(|(i, w)| format!("{}. {} (Damage: {})", i + 1, w.name, w.damage)),
    );
    lines.push(String::new());
    lines.push("Type the number or name of the weapon to equip".to_string());
    lines.push("Or type 'BACK' to return to the main menu".to_string());
    lines.join("\n")
}

pub fn dead_notice() -> String {
    format!("{YOU_ARE_DEAD} - Use 'HEAL' to revive or 'EXIT' to leave.")
}

pub fn death_count(deaths: u32) -> String {
    format!("You died! Total deaths: {deaths}")
}

pub fn unknown_command() -> String {
    format!("{} - Use '9' or 'HELP' to list commands", protocol::UNKNOWN_COMMAND)
}

pub fn unknown_battle_command() -> String {
    format!(
        "{} - In battle use ATTACK (1), HEAL (2), SURRENDER (S) or STATS",
        protocol::UNKNOWN_COMMAND
    )
}

fn weapon_line(state: &PlayerState) -> String {
    state
        .weapon
        .map_or_else(|| "None".to_string(), |w| w.to_string())
}

/// The STATS block.
pub fn player_stats(name: &str, state: &PlayerState) -> String {
    format!(
        "=== YOUR STATISTICS ===\n\
         Name: {name}\n\
         HP: {}/100\n\
         Kills: {}\n\
         Deaths: {}\n\
         Total Damage: {}\n\
         K/D Ratio: {:.2}\n\
         Weapon: {}\n\
         =======================",
        state.hp,
        state.kills,
        state.deaths,
        state.total_damage,
        kd_ratio(state.kills, state.deaths),
        weapon_line(state)
    )
}

/// The STATUS block. `opponent` is the opponent's name and HP when battling.
pub fn status(state: &PlayerState, opponent: Option<(&str, u32)>) -> String {
    let weapon = state.weapon.map_or_else(
        || format!("None equipped (base damage: {BASE_DAMAGE})"),
        |w| w.to_string(),
    );
    let battle = match opponent {
        Some((name, hp)) => format!("IN PVP BATTLE against {name} (HP: {hp})"),
        None => "Available".to_string(),
    };
    format!(
        "=== YOUR STATUS ===\nHP: {}/100\nWEAPON: {weapon}\nSTATE: {battle}\nKills: {} | Deaths: {} | Damage: {}",
        state.hp, state.kills, state.deaths, state.total_damage
    )
}

/// One PLAYERS roster line.
pub fn roster_line(name: &str, state: &PlayerState) -> String {
    format!(
        "- {name} | HP: {} | {} | K/D: {}/{} | Weapon: {}",
        state.hp,
        if state.in_battle() { "IN BATTLE" } else { "AVAILABLE" },
        state.kills,
        state.deaths,
        state.weapon.map_or("none", |w| w.name)
    )
}

pub fn roster(lines: &[String]) -> String {
    let body = if lines.is_empty() {
        "No other players connected".to_string()
    } else {
        lines.join("\n")
    };
    format!("=== CONNECTED PLAYERS ===\n{body}\n=========================")
}

pub fn leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut lines = vec!["=== GLOBAL LEADERBOARD ===".to_string()];
    lines.extend(entries.iter().map(|e| e.to_string()));
    lines.push("==========================".to_string());
    lines.join("\n")
}
