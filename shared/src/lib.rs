//! Types and rules shared by the battle server and the console client:
//! the weapon catalog, combat constants, command parsing and the wire tokens.

pub mod command;
pub mod protocol;

pub const MAX_HP: u32 = 100;
pub const HEAL_AMOUNT: u32 = 15;
pub const REVIVE_HP: u32 = 50;
pub const BASE_DAMAGE: u32 = 10;
/// A PVE roll below this value (out of 100) defeats the enemy.
pub const PVE_KILL_CHANCE: u32 = 30;
pub const DEFAULT_PORT: u16 = 5000;

/// An immutable catalog entry. Equality is by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Weapon {
    pub name: &'static str,
    pub damage: u32,
}

impl Weapon {
    pub const fn new(name: &'static str, damage: u32) -> Self {
        Self { name, damage }
    }
}

impl std::fmt::Display for Weapon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (Damage: {})", self.name, self.damage)
    }
}

/// The fixed weapon catalog, addressed 1-based on the wire.
pub const WEAPONS: [Weapon; 5] = [
    Weapon::new("una yuca", 20),
    Weapon::new("el poder de la amistad", 15),
    Weapon::new("machete oxidado", 25),
    Weapon::new("$800 de cebollin", 18),
    Weapon::new("hueso de pollo", 22),
];

/// Case-insensitive lookup by weapon name.
pub fn find_weapon(name: &str) -> Option<Weapon> {
    let name = name.trim();
    WEAPONS
        .iter()
        .find(|w| w.name.eq_ignore_ascii_case(name))
        .copied()
}

/// Lookup by 1-based catalog index.
pub fn weapon_by_index(index: usize) -> Option<Weapon> {
    index.checked_sub(1).and_then(|i| WEAPONS.get(i)).copied()
}

/// Resolves a weapon-menu selection: a name first, then a 1-based index.
pub fn select_weapon(input: &str) -> Option<Weapon> {
    find_weapon(input).or_else(|| {
        input
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(weapon_by_index)
    })
}

/// Damage dealt by a player holding `weapon`.
pub fn attack_damage(weapon: Option<&Weapon>) -> u32 {
    weapon.map_or(BASE_DAMAGE, |w| w.damage)
}

/// Kill/death ratio; a player without deaths ranks by raw kills.
pub fn kd_ratio(kills: u32, deaths: u32) -> f64 {
    if deaths == 0 {
        kills as f64
    } else {
        kills as f64 / deaths as f64
    }
}
