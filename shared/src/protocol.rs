//! Wire vocabulary of the line protocol.
//!
//! Every message is a newline-terminated UTF-8 line. Tokens ending in `:`
//! are prefixes followed by a value; the rest are sent verbatim.

pub const CONNECTED: &str = "CONNECTED_TO_SERVER";
pub const NAME_PROMPT: &str = "Please enter your player name:";
pub const WELCOME: &str = "WELCOME ";
pub const SERVER_FULL: &str = "SERVER_FULL";

pub const HP: &str = "HP:";
pub const HP_OPPONENT: &str = "HP_OPPONENT:";
pub const HEALED: &str = "HEALED:";
pub const REVIVED: &str = "REVIVED:";
pub const YOU_DIED: &str = "YOU_DIED";
pub const YOU_WIN: &str = "YOU_WIN";
pub const YOU_LOSE: &str = "YOU_LOSE";
pub const YOU_ATTACKED_OPPONENT: &str = "YOU_ATTACKED_OPPONENT:";
pub const INCOMING_ATTACK: &str = "RECIBISTE_ATAQUE:";
pub const YOU_ATTACKED_ENEMY: &str = "YOU_ATTACKED:Enemy:";
pub const ENEMY_DEFEATED: &str = "ENEMY_DEFEATED:Enemy";
pub const WEAPON_EQUIPPED: &str = "WEAPON_EQUIPPED:";

pub const CHALLENGE_REQUEST: &str = "CHALLENGE_REQUEST:";
pub const CHALLENGE_SENT: &str = "CHALLENGE_SENT:";
pub const BATTLE_START: &str = "BATTLE_START:";
pub const BATTLE_END: &str = "BATTLE_END";
pub const SURRENDERED: &str = "TE_HAS_RENDIDO";
pub const OPPONENT_DIED: &str = "TU_OPONENTE_HA_MUERTO";
pub const OPPONENT_SURRENDERED: &str = "TU_OPONENTE_SE_HA_RENDIDO";
pub const OPPONENT_DISCONNECTED: &str = "TU_OPONENTE_SE_DESCONECTO";

pub const ENEMIES_RESET: &str = "ENEMIES_RESET";
pub const ENEMIES_HAVE_BEEN_RESET: &str = "ENEMIES_HAVE_BEEN_RESET";

pub const YOU_ARE_DEAD: &str = "YOU_ARE_DEAD";
pub const UNKNOWN_COMMAND: &str = "UNKNOWN_COMMAND";
pub const ERROR: &str = "ERROR:";

/// Formats a `PREFIX:value` line.
pub fn tagged(prefix: &str, value: impl std::fmt::Display) -> String {
    format!("{prefix}{value}")
}

/// Returns the value after `prefix` if `line` starts with it.
pub fn strip_tag<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix)
}

/// Builds an `ERROR: ...` reply.
pub fn error(text: impl std::fmt::Display) -> String {
    format!("{ERROR} {text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_and_strip() {
        let line = tagged(HP, 42);
        assert_eq!(line, "HP:42");
        assert_eq!(strip_tag(&line, HP), Some("42"));
        assert_eq!(strip_tag(&line, HEALED), None);
    }

    #[test]
    fn test_hp_prefix_does_not_match_opponent_hp() {
        assert!(strip_tag("HP_OPPONENT:10", HP).is_none());
    }

    #[test]
    fn test_error_format() {
        assert_eq!(error("nope"), "ERROR: nope");
    }
}
