//! Routes each client line to exactly one handler.
//!
//! Resolution order: registration, exit, dead check, weapon menu, battle,
//! then the general command set.

use log::{debug, info};
use shared::command::{is_exit, is_heal, BattleCommand, Command, MenuSelection};
use shared::protocol::{
    error, tagged, ENEMIES_HAVE_BEEN_RESET, ENEMIES_RESET, NAME_PROMPT, WEAPON_EQUIPPED, WELCOME,
};
use shared::{select_weapon, Weapon};

use crate::battle::Arena;
use crate::menu;
use crate::registry::NameClaim;
use crate::report;
use crate::session::Session;

/// Whether the read loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Handles one line from `me`.
pub async fn handle_line(arena: &Arena, me: &Session, line: &str) -> Flow {
    if me.name().is_none() {
        return register(arena, me, line).await;
    }
    debug!("Received from {}: {}", me.display_name(), line);

    let (alive, in_menu, in_battle) = {
        let state = me.state().await;
        (state.is_alive(), state.in_weapon_menu, state.in_battle())
    };

    // `0` means BACK inside the weapon menu
    if is_exit(line) && !(in_menu && line.trim() == "0") {
        return Flow::Exit;
    }

    if !alive {
        if is_heal(line) {
            arena.heal(me).await;
        } else {
            me.send(menu::dead_notice());
        }
    } else if in_menu {
        weapon_menu_line(me, line).await;
    } else if in_battle {
        battle_line(arena, me, line).await;
    } else {
        command(arena, me, Command::parse(line)).await;
    }
    Flow::Continue
}

/// Name registration. Blank or taken names get the prompt again.
async fn register(arena: &Arena, me: &Session, line: &str) -> Flow {
    if is_exit(line) {
        return Flow::Exit;
    }
    match arena.registry.claim_name(me, line).await {
        NameClaim::Accepted => {
            let name = me.display_name();
            arena.stats.reset_player(&name).await;
            info!("Player registered: {} ({})", name, me.addr);
            me.send(format!("{WELCOME}{name}"));
            me.send(menu::main_menu());
        }
        NameClaim::Blank | NameClaim::Taken => me.send(NAME_PROMPT),
        NameClaim::AlreadyNamed => {}
    }
    Flow::Continue
}

async fn equip(me: &Session, weapon: Weapon) {
    {
        let mut state = me.state().await;
        state.weapon = Some(weapon);
        state.in_weapon_menu = false;
    }
    debug!("{} equipped {}", me.display_name(), weapon.name);
    me.send(tagged(WEAPON_EQUIPPED, weapon));
}

async fn weapon_menu_line(me: &Session, line: &str) {
    match MenuSelection::parse(line) {
        MenuSelection::Back => {
            me.state().await.in_weapon_menu = false;
            me.send(menu::main_menu());
        }
        MenuSelection::Equip(weapon) => {
            equip(me, weapon).await;
            me.send(menu::main_menu());
        }
        MenuSelection::Invalid => {
            me.send(error("Invalid weapon. Type a number, a weapon name or BACK"));
            me.send(menu::weapon_menu());
        }
    }
}

async fn battle_line(arena: &Arena, me: &Session, line: &str) {
    match BattleCommand::parse(line) {
        Some(BattleCommand::Attack) => arena.attack(me).await,
        Some(BattleCommand::Heal) => arena.heal(me).await,
        Some(BattleCommand::Surrender) => arena.surrender(me).await,
        Some(BattleCommand::Stats) => send_stats(me).await,
        None => me.send(menu::unknown_battle_command()),
    }
}

async fn command(arena: &Arena, me: &Session, command: Command) {
    match command {
        Command::OpenWeaponMenu => {
            me.state().await.in_weapon_menu = true;
            me.send(menu::weapon_menu());
        }
        Command::EquipWeapon(name) => match select_weapon(&name) {
            Some(weapon) => equip(me, weapon).await,
            None => me.send(error(format!("Unknown weapon '{name}'"))),
        },
        Command::Attack => arena.pve_attack(me).await,
        Command::Heal => arena.heal(me).await,
        Command::Stats => send_stats(me).await,
        Command::Challenge(name) => arena.challenge(me, &name).await,
        Command::Accept(name) => arena.accept(me, &name).await,
        Command::Status => send_status(arena, me).await,
        Command::Players => send_players(arena, me).await,
        Command::ResetEnemies => {
            me.send(ENEMIES_RESET);
            for other in arena.registry.all_except(me.id).await {
                if other.name().is_some() {
                    other.send(ENEMIES_HAVE_BEEN_RESET);
                }
            }
        }
        Command::Help => me.send(menu::main_menu()),
        Command::Leaderboard => {
            let entries = arena.stats.leaderboard(arena.leaderboard_size).await;
            me.send(menu::leaderboard(&entries));
        }
        Command::Report => {
            let history = arena.stats.history().await;
            me.send(report::full_report(&history));
        }
        Command::Unknown => me.send(menu::unknown_command()),
    }
}

async fn send_stats(me: &Session) {
    let text = menu::player_stats(&me.display_name(), &*me.state().await);
    me.send(text);
}

async fn send_status(arena: &Arena, me: &Session) {
    let state = me.state().await.clone();
    let opponent = match state.opponent() {
        Some(id) => match arena.registry.get(id).await {
            Some(other) => {
                let hp = other.state().await.hp;
                Some((other.display_name(), hp))
            }
            None => None,
        },
        None => None,
    };
    let opponent = opponent.as_ref().map(|(name, hp)| (name.as_str(), *hp));
    me.send(menu::status(&state, opponent));
}

async fn send_players(arena: &Arena, me: &Session) {
    let mut lines = Vec::new();
    for other in arena.registry.all_except(me.id).await {
        if let Some(name) = other.name() {
            let line = menu::roster_line(name, &*other.state().await);
            lines.push(line);
        }
    }
    me.send(menu::roster(&lines));
}
