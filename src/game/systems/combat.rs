//! Combat resolution
//!
//! Damage rolls are pure functions of the combatants' stats and a jitter
//! source. Callers must check the target is alive before resolving; a hit
//! on a dead target reports [`DamageOutcome::AlreadyDead`] and changes nothing.

use rand::Rng;

use crate::game::constants::combat::{MIN_DAMAGE, MONSTER_JITTER, PLAYER_JITTER};
use crate::world::monster::Monster;
use crate::world::player::Player;
use crate::world::vitals::DamageOutcome;

/// One resolved attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub damage: i32,
    pub outcome: DamageOutcome,
}

impl Hit {
    pub fn killed(&self) -> bool {
        self.outcome.is_kill()
    }
}

/// `max(1, attack_power + uniform(-1, 1))`
pub fn player_damage<R: Rng + ?Sized>(rng: &mut R, attack_power: i32) -> i32 {
    (attack_power + rng.gen_range(-PLAYER_JITTER..=PLAYER_JITTER)).max(MIN_DAMAGE)
}

/// `max(1, max(1, monster_damage + uniform(-2, 2)) - defense)`
pub fn monster_damage<R: Rng + ?Sized>(rng: &mut R, monster_damage: i32, defense: i32) -> i32 {
    let raw = (monster_damage + rng.gen_range(-MONSTER_JITTER..=MONSTER_JITTER)).max(MIN_DAMAGE);
    (raw - defense).max(MIN_DAMAGE)
}

pub fn player_attacks_monster<R: Rng + ?Sized>(
    rng: &mut R,
    player: &Player,
    monster: &mut Monster,
) -> Hit {
    let damage = player_damage(rng, player.attack_power());
    Hit {
        damage,
        outcome: monster.take_damage(damage),
    }
}

pub fn monster_attacks_player<R: Rng + ?Sized>(
    rng: &mut R,
    monster: &Monster,
    player: &mut Player,
) -> Hit {
    let damage = monster_damage(rng, monster.damage, player.defense());
    Hit {
        damage,
        outcome: player.take_damage(damage),
    }
}
