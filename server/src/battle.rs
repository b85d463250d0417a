//! PVE and PVP combat
//!
//! [`Arena`] owns every operation that touches more than one session. The
//! lock rules are:
//! - two session locks are only ever held together through `lock_pair`,
//!   which takes them in ascending id order
//! - never take a registry lock while a session lock is held
//!
//! Opponents are stored as ids and re-resolved through the registry on every
//! use. Pairing and PVP hits lock both sides, so a battle is decided exactly
//! once. A pairing torn down from one side (surrender, death, disconnect) is
//! released on the other with [`PlayerState::end_battle_with`], which only
//! succeeds while that side is still paired with the caller.

use log::{debug, info};
use rand::Rng;
use shared::protocol::{
    self, error, tagged, BATTLE_END, BATTLE_START, CHALLENGE_REQUEST, CHALLENGE_SENT,
    ENEMY_DEFEATED, HEALED, HP, HP_OPPONENT, INCOMING_ATTACK, REVIVED, SURRENDERED, YOU_ATTACKED_ENEMY,
    YOU_ATTACKED_OPPONENT, YOU_DIED, YOU_LOSE, YOU_WIN,
};
use shared::{MAX_HP, PVE_KILL_CHANCE};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::MutexGuard;

use crate::menu;
use crate::registry::PlayerRegistry;
use crate::session::{HealOutcome, PlayerState, Session, SessionId};
use crate::stats::{MatchResult, PlayerStats, StatsStore};

/// Outcome of one PVP attack, decided with both sides locked.
struct Strike {
    damage: u32,
    /// Defender HP after the hit
    hp: u32,
    attacker_hp: u32,
    /// Filled when the hit was lethal
    kill: Option<Kill>,
}

/// Everything needed to announce and record a PVP kill.
struct Kill {
    winner_damage: u32,
    duration: Duration,
    winner_weapon: String,
    winner_stats: PlayerStats,
    loser_damage: u32,
    loser_weapon: String,
    loser_stats: PlayerStats,
}

/// Shared game services used by every connection task.
///
/// One `Arena` is created per server and handed to each connection as an
/// `Arc`; all game rules that involve another player go through it.
pub struct Arena {
    /// Live connections, looked up by id or name
    pub registry: Arc<PlayerRegistry>,
    /// Persistent player counters and match history
    pub stats: Arc<StatsStore>,
    /// Rows shown by `LEADERBOARD`
    pub leaderboard_size: usize,
}

impl Arena {
    pub fn new(registry: Arc<PlayerRegistry>, stats: Arc<StatsStore>, leaderboard_size: usize) -> Self {
        Self {
            registry,
            stats,
            leaderboard_size,
        }
    }

    /// Lines sent when a battle ends for a player.
    fn after_battle(alive: bool) -> Vec<String> {
        let follow_up = if alive {
            menu::main_menu()
        } else {
            menu::dead_notice()
        };
        vec![BATTLE_END.to_string(), follow_up]
    }

    async fn persist(&self, session: &Session, stats: PlayerStats) {
        if let Some(name) = session.name() {
            self.stats.upsert_player_stats(name, stats).await;
        }
    }

    /// Ends the other side of a pairing that `from` has already left and
    /// tells it why. No-op if that side is gone or already moved on.
    async fn release_opponent(&self, opponent: SessionId, from: SessionId, notice: &str) {
        let Some(other) = self.registry.get(opponent).await else {
            return;
        };
        let ended = {
            let mut state = other.state().await;
            state.end_battle_with(from).map(|_| state.is_alive())
        };
        if let Some(alive) = ended {
            other.send(notice);
            other.send_all(Self::after_battle(alive));
        }
    }

    /// Attacks the PVE enemy with a random kill roll.
    pub async fn pve_attack(&self, me: &Session) {
        let roll = rand::thread_rng().gen_range(0..100);
        self.pve_attack_with_roll(me, roll).await;
    }

    /// PVE attack with an explicit roll in `0..100`. The enemy is defeated
    /// when the roll is below the kill chance.
    pub async fn pve_attack_with_roll(&self, me: &Session, roll: u32) {
        let defeated = roll < PVE_KILL_CHANCE;
        let (damage, kills, stats) = {
            let mut state = me.state().await;
            let damage = state.damage();
            state.add_damage_dealt(damage);
            if defeated {
                state.kills += 1;
            }
            (damage, state.kills, state.stats())
        };

        me.send(tagged(YOU_ATTACKED_ENEMY, damage));
        if defeated {
            me.send(ENEMY_DEFEATED);
            me.send(format!("You got a KILL! Total kills: {kills}"));
            debug!("{} defeated the PVE enemy", me.display_name());
        }
        self.persist(me, stats).await;
    }

    /// Heals, or revives a dead player.
    pub async fn heal(&self, me: &Session) {
        let outcome = me.state().await.heal();
        match outcome {
            HealOutcome::Revived { hp } => {
                info!("{} revived with {} HP", me.display_name(), hp);
                me.send(tagged(REVIVED, hp));
                me.send(tagged(HP, hp));
                me.send(menu::main_menu());
            }
            HealOutcome::Healed { amount, hp } => {
                me.send(tagged(HEALED, amount));
                me.send(tagged(HP, hp));
            }
        }
    }

    /// Sends a challenge to the player named `target`.
    pub async fn challenge(&self, me: &Session, target: &str) {
        if target.is_empty() {
            me.send(error("Usage: CHALLENGE:<name>"));
            return;
        }
        if me.state().await.in_battle() {
            me.send(error("You are already in a battle"));
            return;
        }
        let Some(other) = self.registry.find_by_name(target, me.id).await else {
            me.send(error(format!(
                "Player '{target}' not found. Use PLAYERS to list players."
            )));
            return;
        };
        let other_name = other.display_name();
        if other.state().await.in_battle() {
            me.send(error(format!("{other_name} is already in a battle")));
            return;
        }

        other.send(tagged(CHALLENGE_REQUEST, me.display_name()));
        me.send(tagged(
            CHALLENGE_SENT,
            format!("{other_name} - Waiting for a response..."),
        ));
        info!("{} challenged {}", me.display_name(), other_name);
    }

    /// Accepts a challenge from `challenger` and starts the battle.
    ///
    /// Both sides are checked and paired under one `lock_pair`, so neither
    /// is touched unless both are free.
    pub async fn accept(&self, me: &Session, challenger: &str) {
        if challenger.is_empty() {
            me.send(error("Usage: ACCEPT:<name>"));
            return;
        }
        if me.state().await.in_battle() {
            me.send(error("You are already in a battle"));
            return;
        }
        let Some(other) = self.registry.find_by_name(challenger, me.id).await else {
            me.send(error(format!("Player '{challenger}' not found")));
            return;
        };
        let other_name = other.display_name();

        let refusal = {
            let (mut mine, mut theirs) = lock_pair(me, &other).await;
            if mine.in_battle() {
                Some("You are already in a battle".to_string())
            } else if theirs.in_battle() {
                Some(format!("{other_name} is already in a battle"))
            } else {
                mine.begin_battle(other.id);
                theirs.begin_battle(me.id);
                None
            }
        };
        if let Some(reason) = refusal {
            me.send(error(reason));
            return;
        }

        let my_name = me.display_name();
        info!("Battle started: {} vs {}", other_name, my_name);
        for (session, opponent) in [(me, &other_name), (other.as_ref(), &my_name)] {
            session.send(tagged(
                BATTLE_START,
                format!("{opponent} - Let the PVP battle begin!"),
            ));
            session.send(menu::battle_menu(MAX_HP, MAX_HP));
        }
    }

    /// Attacks the current PVP opponent.
    ///
    /// The hit is applied with both sides locked and only while each side is
    /// still paired with the other, so two simultaneous lethal hits cannot
    /// both count.
    pub async fn attack(&self, me: &Session) {
        let Some(opponent_id) = me.state().await.opponent() else {
            me.send(error("You have no valid opponent"));
            return;
        };

        let mut exchange = None;
        if let Some(other) = self.registry.get(opponent_id).await {
            let outcome = {
                let (mut mine, mut theirs) = lock_pair(me, &other).await;
                strike(&mut mine, &mut theirs, me.id, other.id)
            };
            exchange = outcome.map(|hit| (other, hit));
        }
        let Some((other, hit)) = exchange else {
            // Opponent left or already moved on; drop the stale pairing
            let ended = {
                let mut state = me.state().await;
                state.end_battle_with(opponent_id).map(|_| state.is_alive())
            };
            me.send(error("You have no valid opponent"));
            if let Some(alive) = ended {
                me.send_all(Self::after_battle(alive));
            }
            return;
        };

        let my_name = me.display_name();
        let other_name = other.display_name();
        me.send(tagged(YOU_ATTACKED_OPPONENT, hit.damage));
        me.send(tagged(HP_OPPONENT, hit.hp));
        other.send(tagged(HP, hit.hp));
        other.send(tagged(INCOMING_ATTACK, format!("{} de {my_name}", hit.damage)));

        let Some(kill) = hit.kill else {
            other.send(menu::battle_menu(hit.hp, hit.attacker_hp));
            return;
        };

        other.send(YOU_DIED);
        other.send(YOU_LOSE);
        other.send(menu::death_count(kill.loser_stats.deaths));
        other.send_all(Self::after_battle(false));
        me.send(YOU_WIN);
        me.send(format!("You got a KILL! Total kills: {}", kill.winner_stats.kills));
        me.send_all(Self::after_battle(true));

        let result = MatchResult::new(
            my_name.as_str(),
            other_name.as_str(),
            kill.winner_damage,
            kill.loser_damage,
            kill.duration,
            kill.winner_weapon,
            kill.loser_weapon,
            false,
        );
        self.stats.record_match(result).await;
        self.persist(me, kill.winner_stats).await;
        self.persist(&other, kill.loser_stats).await;
    }

    /// Applies damage from outside a PVP exchange. A lethal hit ends any
    /// battle the victim is in and notifies the opponent.
    pub async fn inflict_damage(&self, victim: &Session, amount: u32) -> bool {
        let death = {
            let mut state = victim.state().await;
            if state.take_damage(amount) {
                Some((state.record_death(), state.stats(), state.hp))
            } else {
                victim.send(tagged(HP, state.hp));
                None
            }
        };
        let Some((battle, stats, hp)) = death else {
            return false;
        };

        victim.send(tagged(HP, hp));
        victim.send(YOU_DIED);
        victim.send(menu::death_count(stats.deaths));
        if let Some(battle) = battle {
            self.release_opponent(battle.opponent, victim.id, protocol::OPPONENT_DIED)
                .await;
            victim.send(BATTLE_END);
        }
        victim.send(menu::dead_notice());
        self.persist(victim, stats).await;
        true
    }

    /// Gives up the current battle. No match result is recorded.
    pub async fn surrender(&self, me: &Session) {
        let ended = {
            let mut state = me.state().await;
            state.end_battle().map(|b| (b, state.is_alive()))
        };
        let Some((battle, alive)) = ended else {
            me.send(error("You are not in a battle"));
            return;
        };

        info!("{} surrendered", me.display_name());
        me.send(SURRENDERED);
        me.send_all(Self::after_battle(alive));
        self.release_opponent(battle.opponent, me.id, protocol::OPPONENT_SURRENDERED)
            .await;
    }

    /// Cleans up after a connection ends: removes the session, saves its
    /// counters and releases its opponent. Safe to call more than once.
    pub async fn disconnect(&self, me: &Session) {
        if !self.registry.unregister(me.id).await {
            return;
        }
        let (battle, stats) = {
            let mut state = me.state().await;
            (state.end_battle(), state.stats())
        };
        self.persist(me, stats).await;
        if let Some(battle) = battle {
            self.release_opponent(battle.opponent, me.id, protocol::OPPONENT_DISCONNECTED)
                .await;
        }
        info!(
            "Player {} disconnected. Stats: {} kills, {} deaths, {} damage",
            me.display_name(),
            stats.kills,
            stats.deaths,
            stats.total_damage
        );
    }
}

/// Locks the state of two distinct sessions in ascending id order and returns
/// the guards as `(first, second)`.
async fn lock_pair<'a>(
    first: &'a Session,
    second: &'a Session,
) -> (MutexGuard<'a, PlayerState>, MutexGuard<'a, PlayerState>) {
    if first.id < second.id {
        let a = first.state().await;
        let b = second.state().await;
        (a, b)
    } else {
        let b = second.state().await;
        let a = first.state().await;
        (a, b)
    }
}

/// Lands one hit if both sides are still paired with each other. A lethal hit
/// ends the battle on both sides and books the kill and the death.
fn strike(
    attacker: &mut PlayerState,
    defender: &mut PlayerState,
    attacker_id: SessionId,
    defender_id: SessionId,
) -> Option<Strike> {
    if attacker.opponent() != Some(defender_id) || defender.opponent() != Some(attacker_id) {
        return None;
    }
    let damage = attacker.damage();
    attacker.add_damage_dealt(damage);

    let kill = if defender.take_damage(damage) {
        let lost = defender.record_death();
        attacker.kills += 1;
        let won = attacker.end_battle();
        Some(Kill {
            winner_damage: won.map_or(damage, |b| b.damage_dealt),
            duration: won.map(|b| b.elapsed()).unwrap_or_default(),
            winner_weapon: attacker.weapon_name(),
            winner_stats: attacker.stats(),
            loser_damage: lost.map_or(0, |b| b.damage_dealt),
            loser_weapon: defender.weapon_name(),
            loser_stats: defender.stats(),
        })
    } else {
        None
    };

    Some(Strike {
        damage,
        hp: defender.hp,
        attacker_hp: attacker.hp,
        kill,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::WEAPONS;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    struct Player {
        session: Arc<Session>,
        rx: mpsc::UnboundedReceiver<String>,
    }

    impl Player {
        fn drain(&mut self) -> Vec<String> {
            let mut lines = Vec::new();
            while let Ok(line) = self.rx.try_recv() {
                lines.push(line);
            }
            lines
        }
    }

    fn arena() -> Arena {
        Arena::new(
            Arc::new(PlayerRegistry::new(8)),
            Arc::new(StatsStore::new()),
            10,
        )
    }

    async fn join(arena: &Arena, name: &str) -> Player {
        let (tx, rx) = mpsc::unbounded_channel();
        let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let session = arena.registry.register(addr, tx).await.unwrap();
        arena.registry.claim_name(&session, name).await;
        arena.stats.reset_player(name).await;
        Player { session, rx }
    }

    async fn start_battle(arena: &Arena, a: &mut Player, b: &mut Player) {
        arena.challenge(&a.session, b.session.name().unwrap()).await;
        arena.accept(&b.session, a.session.name().unwrap()).await;
        a.drain();
        b.drain();
    }

    #[tokio::test]
    async fn test_pve_attack_rolls() {
        let arena = arena();
        let mut a = join(&arena, "A").await;

        arena.pve_attack_with_roll(&a.session, 29).await;
        assert_eq!(
            a.drain(),
            vec![
                "YOU_ATTACKED:Enemy:10",
                "ENEMY_DEFEATED:Enemy",
                "You got a KILL! Total kills: 1"
            ]
        );

        arena.pve_attack_with_roll(&a.session, 30).await;
        assert_eq!(a.drain(), vec!["YOU_ATTACKED:Enemy:10"]);

        let state = a.session.state().await;
        assert_eq!(state.kills, 1);
        assert_eq!(state.total_damage, 20);
        assert_eq!(state.hp, 100);
        drop(state);
        assert_eq!(
            arena.stats.player_stats("A").await,
            Some(PlayerStats::new(1, 0, 20))
        );
    }

    #[tokio::test]
    async fn test_heal_and_revive() {
        let arena = arena();
        let mut a = join(&arena, "A").await;

        a.session.state().await.hp = 90;
        arena.heal(&a.session).await;
        assert_eq!(a.drain(), vec!["HEALED:15", "HP:100"]);

        a.session.state().await.hp = 0;
        arena.heal(&a.session).await;
        let lines = a.drain();
        assert_eq!(lines[0], "REVIVED:50");
        assert_eq!(lines[1], "HP:50");
    }

    #[tokio::test]
    async fn test_challenge_unknown_player() {
        let arena = arena();
        let mut a = join(&arena, "A").await;

        arena.challenge(&a.session, "Ghost").await;
        assert_eq!(
            a.drain(),
            vec!["ERROR: Player 'Ghost' not found. Use PLAYERS to list players."]
        );

        arena.challenge(&a.session, "A").await;
        assert!(a.drain()[0].contains("not found"));
    }

    #[tokio::test]
    async fn test_challenge_and_accept_pair_both_sides() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;

        arena.challenge(&a.session, "b").await;
        assert_eq!(
            a.drain(),
            vec!["CHALLENGE_SENT:B - Waiting for a response..."]
        );
        assert_eq!(b.drain(), vec!["CHALLENGE_REQUEST:A"]);

        a.session.state().await.in_weapon_menu = true;
        arena.accept(&b.session, "A").await;
        assert_eq!(a.drain()[0], "BATTLE_START:B - Let the PVP battle begin!");
        assert_eq!(b.drain()[0], "BATTLE_START:A - Let the PVP battle begin!");

        let sa = a.session.state().await.clone();
        let sb = b.session.state().await.clone();
        assert_eq!(sa.opponent(), Some(b.session.id));
        assert_eq!(sb.opponent(), Some(a.session.id));
        assert_eq!(sa.hp, 100);
        assert!(!sa.in_weapon_menu);

        // Busy players cannot be challenged or re-paired
        let mut c = join(&arena, "C").await;
        arena.challenge(&c.session, "A").await;
        assert_eq!(c.drain(), vec!["ERROR: A is already in a battle"]);
        arena.accept(&c.session, "B").await;
        assert_eq!(c.drain(), vec!["ERROR: B is already in a battle"]);
        assert!(!c.session.state().await.in_battle());
    }

    #[tokio::test]
    async fn test_attack_without_opponent() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        arena.attack(&a.session).await;
        assert_eq!(a.drain(), vec!["ERROR: You have no valid opponent"]);
    }

    #[tokio::test]
    async fn test_machete_fight_to_the_death() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;
        a.session.state().await.weapon = Some(WEAPONS[2]);
        start_battle(&arena, &mut a, &mut b).await;

        for expected_hp in [75, 50, 25] {
            arena.attack(&a.session).await;
            let lines = a.drain();
            assert_eq!(lines[0], "YOU_ATTACKED_OPPONENT:25");
            assert_eq!(lines[1], format!("HP_OPPONENT:{expected_hp}"));
            let lines = b.drain();
            assert_eq!(lines[0], format!("HP:{expected_hp}"));
            assert_eq!(lines[1], "RECIBISTE_ATAQUE:25 de A");
        }

        arena.attack(&a.session).await;
        let a_lines = a.drain();
        let b_lines = b.drain();
        assert!(a_lines.contains(&"HP_OPPONENT:0".to_string()));
        assert!(a_lines.contains(&"YOU_WIN".to_string()));
        assert!(a_lines.contains(&"BATTLE_END".to_string()));
        assert!(b_lines.contains(&"YOU_DIED".to_string()));
        assert!(b_lines.contains(&"YOU_LOSE".to_string()));
        assert!(b_lines.contains(&"BATTLE_END".to_string()));

        let sa = a.session.state().await.clone();
        let sb = b.session.state().await.clone();
        assert_eq!((sa.kills, sa.total_damage), (1, 100));
        assert_eq!((sb.deaths, sb.hp), (1, 0));
        assert!(!sa.in_battle());
        assert!(!sb.in_battle());

        let history = arena.stats.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].winner, "A");
        assert_eq!(history[0].loser, "B");
        assert_eq!(history[0].winner_damage, 100);
        assert_eq!(history[0].loser_damage, 0);
        assert_eq!(history[0].winner_weapon, "machete oxidado");
        assert_eq!(history[0].loser_weapon, "none");
        assert!(!history[0].surrender);

        assert_eq!(
            arena.stats.player_stats("A").await,
            Some(PlayerStats::new(1, 0, 100))
        );
        assert_eq!(
            arena.stats.player_stats("B").await,
            Some(PlayerStats::new(0, 1, 0))
        );

        // The loser is dead and out of battle; a further attack finds nobody
        arena.attack(&a.session).await;
        assert_eq!(a.drain(), vec!["ERROR: You have no valid opponent"]);
    }

    #[tokio::test]
    async fn test_battle_damage_counts_both_sides() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;
        a.session.state().await.weapon = Some(WEAPONS[2]);
        start_battle(&arena, &mut a, &mut b).await;

        arena.attack(&b.session).await;
        for _ in 0..4 {
            arena.attack(&a.session).await;
        }
        let history = arena.stats.history().await;
        assert_eq!(history[0].winner_damage, 100);
        assert_eq!(history[0].loser_damage, 10);
    }

    #[tokio::test]
    async fn test_surrender_records_no_match() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;
        start_battle(&arena, &mut a, &mut b).await;

        arena.surrender(&a.session).await;
        assert_eq!(a.drain()[..2], ["TE_HAS_RENDIDO", "BATTLE_END"]);
        assert_eq!(b.drain()[..2], ["TU_OPONENTE_SE_HA_RENDIDO", "BATTLE_END"]);
        assert!(!a.session.state().await.in_battle());
        assert!(!b.session.state().await.in_battle());
        assert_eq!(arena.stats.match_count().await, 0);

        arena.surrender(&a.session).await;
        assert_eq!(a.drain(), vec!["ERROR: You are not in a battle"]);
    }

    #[tokio::test]
    async fn test_disconnect_releases_opponent_once() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;
        a.session.state().await.kills = 4;
        start_battle(&arena, &mut a, &mut b).await;

        arena.disconnect(&a.session).await;
        arena.disconnect(&a.session).await;

        let lines = b.drain();
        assert_eq!(
            lines
                .iter()
                .filter(|l| *l == "TU_OPONENTE_SE_DESCONECTO")
                .count(),
            1
        );
        assert_eq!(lines[1], "BATTLE_END");
        assert!(!b.session.state().await.in_battle());
        assert!(arena.registry.get(a.session.id).await.is_none());
        assert_eq!(
            arena.stats.player_stats("A").await,
            Some(PlayerStats::new(4, 0, 0))
        );

        arena.attack(&b.session).await;
        assert_eq!(b.drain(), vec!["ERROR: You have no valid opponent"]);
    }

    #[tokio::test]
    async fn test_attack_after_opponent_vanished() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;
        start_battle(&arena, &mut a, &mut b).await;

        // Registry entry gone before the disconnect cleanup ran
        arena.registry.unregister(b.session.id).await;
        arena.attack(&a.session).await;
        let lines = a.drain();
        assert_eq!(lines[0], "ERROR: You have no valid opponent");
        assert_eq!(lines[1], "BATTLE_END");
        assert!(!a.session.state().await.in_battle());
    }

    #[tokio::test]
    async fn test_inflict_damage_death_ends_battle_for_both() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;
        start_battle(&arena, &mut a, &mut b).await;

        assert!(!arena.inflict_damage(&a.session, 40).await);
        assert_eq!(a.drain(), vec!["HP:60"]);

        assert!(arena.inflict_damage(&a.session, 100).await);
        let lines = a.drain();
        assert!(lines.contains(&"YOU_DIED".to_string()));
        assert!(lines.contains(&"BATTLE_END".to_string()));
        assert_eq!(b.drain()[..2], ["TU_OPONENTE_HA_MUERTO", "BATTLE_END"]);

        let sa = a.session.state().await.clone();
        assert_eq!(sa.deaths, 1);
        assert!(!sa.in_battle());
        assert!(!b.session.state().await.in_battle());
        assert_eq!(arena.stats.match_count().await, 0);
    }

    fn revive_prompts(lines: &[String]) -> usize {
        lines
            .iter()
            .filter(|l| l.contains("Use 'HEAL' to revive"))
            .count()
    }

    #[tokio::test]
    async fn test_pvp_loser_gets_one_revive_prompt() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;
        start_battle(&arena, &mut a, &mut b).await;
        b.session.state().await.hp = 10;

        arena.attack(&a.session).await;
        let lines = b.drain();
        assert!(lines.contains(&"You died! Total deaths: 1".to_string()));
        assert_eq!(revive_prompts(&lines), 1);
        assert!(lines.last().unwrap().starts_with("YOU_ARE_DEAD"));
    }

    #[tokio::test]
    async fn test_inflict_damage_sends_one_revive_prompt() {
        let arena = arena();
        let mut a = join(&arena, "A").await;

        assert!(arena.inflict_damage(&a.session, 150).await);
        let lines = a.drain();
        assert_eq!(lines[..3], ["HP:0", "YOU_DIED", "You died! Total deaths: 1"]);
        assert_eq!(revive_prompts(&lines), 1);
    }

    #[tokio::test]
    async fn test_dead_attacker_cannot_strike_back() {
        let arena = arena();
        let mut a = join(&arena, "A").await;
        let mut b = join(&arena, "B").await;
        start_battle(&arena, &mut a, &mut b).await;
        a.session.state().await.hp = 10;
        b.session.state().await.hp = 10;

        arena.attack(&b.session).await;
        arena.attack(&a.session).await;
        assert_eq!(a.drain()[0], "HP:0");

        let history = arena.stats.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].winner, "B");
        assert_eq!(b.session.state().await.hp, 10);
        assert_eq!(b.session.state().await.deaths, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_simultaneous_lethal_hits_decide_once() {
        for _ in 0..100 {
            let arena = Arc::new(arena());
            let mut a = join(&arena, "A").await;
            let mut b = join(&arena, "B").await;
            start_battle(&arena, &mut a, &mut b).await;
            a.session.state().await.hp = 10;
            b.session.state().await.hp = 10;

            let attacks: Vec<_> = [Arc::clone(&a.session), Arc::clone(&b.session)]
                .into_iter()
                .map(|session| {
                    let arena = Arc::clone(&arena);
                    tokio::spawn(async move { arena.attack(&session).await })
                })
                .collect();
            for attack in attacks {
                attack.await.unwrap();
            }

            assert_eq!(arena.stats.match_count().await, 1);
            let alive = [
                a.session.state().await.is_alive(),
                b.session.state().await.is_alive(),
            ];
            assert_eq!(alive.iter().filter(|&&up| up).count(), 1);
            assert!(!a.session.state().await.in_battle());
            assert!(!b.session.state().await.in_battle());
        }
    }

    #[tokio::test]
    async fn test_accept_busy_challenger_changes_nothing() {
        let arena = arena();
        let mut b = join(&arena, "B").await;
        let mut c = join(&arena, "C").await;
        let mut d = join(&arena, "D").await;
        start_battle(&arena, &mut c, &mut d).await;
        c.session.state().await.hp = 40;
        {
            let mut state = b.session.state().await;
            state.hp = 30;
            state.in_weapon_menu = true;
        }

        arena.accept(&b.session, "C").await;
        assert_eq!(b.drain(), vec!["ERROR: C is already in a battle"]);
        assert!(c.drain().is_empty());

        let sb = b.session.state().await.clone();
        assert_eq!((sb.hp, sb.in_weapon_menu, sb.in_battle()), (30, true, false));
        let sc = c.session.state().await.clone();
        assert_eq!((sc.hp, sc.opponent()), (40, Some(d.session.id)));
    }
}
