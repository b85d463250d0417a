//! Console presentation of server lines and local input handling.

use shared::command::is_exit;
use shared::protocol::{
    strip_tag, BATTLE_END, BATTLE_START, CHALLENGE_REQUEST, HEALED, HP, HP_OPPONENT,
    INCOMING_ATTACK, REVIVED, SERVER_FULL, YOU_ATTACKED_OPPONENT, YOU_DIED, YOU_LOSE, YOU_WIN,
};

/// ANSI sequence that clears the terminal and homes the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// Translates a server line into console text. Unknown lines pass through.
pub fn render(message: &str) -> String {
    if let Some(hp) = strip_tag(message, HP) {
        return format!("Current HP: {hp}");
    }
    if let Some(hp) = strip_tag(message, HP_OPPONENT) {
        return format!("Opponent HP: {hp}");
    }
    if let Some(amount) = strip_tag(message, HEALED) {
        return format!("You healed {amount} HP");
    }
    if let Some(hp) = strip_tag(message, REVIVED) {
        return format!("You are back on your feet with {hp} HP");
    }
    if let Some(damage) = strip_tag(message, YOU_ATTACKED_OPPONENT) {
        return format!("You hit your opponent for {damage}");
    }
    if let Some(attack) = strip_tag(message, INCOMING_ATTACK) {
        return match attack.split_once(" de ") {
            Some((damage, attacker)) => format!("{attacker} hit you for {damage}"),
            None => format!("You were hit for {attack}"),
        };
    }
    if let Some(rest) = strip_tag(message, BATTLE_START) {
        return format!("Battle started! {rest}");
    }
    if let Some(challenger) = strip_tag(message, CHALLENGE_REQUEST) {
        return format!(
            "{challenger} challenged you to a battle!\n   Type 'ACCEPT:{challenger}' to accept"
        );
    }
    match message {
        YOU_DIED => "You died! Use HEAL to recover.".to_string(),
        YOU_WIN => "You won the battle!".to_string(),
        YOU_LOSE => "You lost the battle.".to_string(),
        BATTLE_END => "Battle over".to_string(),
        SERVER_FULL => "The server is full, try again later".to_string(),
        _ => message.to_string(),
    }
}

/// What to do with one line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Send(String),
    Clear,
    /// Sends an exit token. The client quits once the server closes the
    /// connection; inside the weapon menu `0` only goes back.
    Exit(String),
    Skip,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Input::Skip
        } else if is_exit(line) {
            Input::Exit(line.to_string())
        } else if line.eq_ignore_ascii_case("CLEAR") || line.eq_ignore_ascii_case("CLS") {
            Input::Clear
        } else {
            Input::Send(line.to_string())
        }
    }
}
