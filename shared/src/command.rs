//! Command parsing for the three input modes of a session.
//!
//! Tokens are case-insensitive. Arguments after a `PREFIX:` keep their case
//! and are trimmed.

use crate::{select_weapon, Weapon};

const EXIT_TOKENS: [&str; 2] = ["EXIT", "0"];
const BACK_TOKENS: [&str; 3] = ["BACK", "B", "0"];

fn is_any(line: &str, tokens: &[&str]) -> bool {
    let line = line.trim();
    tokens.iter().any(|t| t.eq_ignore_ascii_case(line))
}

/// Case-insensitive prefix match returning the trimmed argument.
fn prefixed<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    let line = line.trim();
    prefixes.iter().find_map(|prefix| {
        let head = line.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix)
            .then(|| line[prefix.len()..].trim())
    })
}

/// `EXIT` or `0` close the connection (outside the weapon menu).
pub fn is_exit(line: &str) -> bool {
    is_any(line, &EXIT_TOKENS)
}

/// The heal command doubles as revive and is the only command a dead player may use.
pub fn is_heal(line: &str) -> bool {
    is_any(line, &["HEAL", "2"])
}

/// Interpretation of a line while the weapon menu is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSelection {
    Back,
    Equip(Weapon),
    Invalid,
}

impl MenuSelection {
    pub fn parse(line: &str) -> Self {
        if is_any(line, &BACK_TOKENS) {
            return MenuSelection::Back;
        }
        select_weapon(line).map_or(MenuSelection::Invalid, MenuSelection::Equip)
    }
}

/// Commands accepted while in a PVP battle. Anything else is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleCommand {
    Attack,
    Heal,
    Surrender,
    Stats,
}

impl BattleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_uppercase().as_str() {
            "ATTACK" | "1" => Some(BattleCommand::Attack),
            "HEAL" | "2" => Some(BattleCommand::Heal),
            "SURRENDER" | "S" => Some(BattleCommand::Surrender),
            "STATS" | "STATUS" => Some(BattleCommand::Stats),
            _ => None,
        }
    }
}

/// Commands accepted outside battle and outside the weapon menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenWeaponMenu,
    EquipWeapon(String),
    Attack,
    Heal,
    Stats,
    Challenge(String),
    Accept(String),
    Status,
    Players,
    ResetEnemies,
    Help,
    Leaderboard,
    Report,
    Unknown,
}

impl Command {
    /// Runs the resolvers in priority order; the first match wins.
    pub fn parse(line: &str) -> Self {
        weapon_command(line)
            .or_else(|| action_command(line))
            .or_else(|| challenge_command(line))
            .or_else(|| info_command(line))
            .unwrap_or(Command::Unknown)
    }
}

fn weapon_command(line: &str) -> Option<Command> {
    if is_any(line, &["WEAPONS", "5"]) {
        return Some(Command::OpenWeaponMenu);
    }
    prefixed(line, &["WEAPON:"]).map(|name| Command::EquipWeapon(name.to_string()))
}

fn action_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_uppercase().as_str() {
        "ATTACK" | "1" => Some(Command::Attack),
        "HEAL" | "2" => Some(Command::Heal),
        "STATS" => Some(Command::Stats),
        _ => None,
    }
}

fn challenge_command(line: &str) -> Option<Command> {
    if let Some(name) = prefixed(line, &["CHALLENGE:", "6:"]) {
        return Some(Command::Challenge(name.to_string()));
    }
    if let Some(name) = prefixed(line, &["ACCEPT:", "7:"]) {
        return Some(Command::Accept(name.to_string()));
    }
    match line.trim() {
        "6" => Some(Command::Challenge(String::new())),
        "7" => Some(Command::Accept(String::new())),
        _ => None,
    }
}

fn info_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_uppercase().as_str() {
        "STATUS" | "3" => Some(Command::Status),
        "PLAYERS" | "4" => Some(Command::Players),
        "RESET_ENEMIES" | "8" => Some(Command::ResetEnemies),
        "HELP" | "9" => Some(Command::Help),
        "LEADERBOARD" | "LB" => Some(Command::Leaderboard),
        "REPORT" => Some(Command::Report),
        _ => None,
    }
}
