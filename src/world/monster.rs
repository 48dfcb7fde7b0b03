use crate::world::vitals::{DamageOutcome, Vitals};

/// A hostile creature living in a room.
///
/// Names are only unique within a room, which is enough for targeting.
/// The owning room's monster list is the monster's location.
#[derive(Debug, Clone)]
pub struct Monster {
    pub name: String,
    pub description: String,
    pub vitals: Vitals,
    pub damage: i32,
    /// Aggressive monsters attack every tick; passive ones only sometimes
    pub aggressive: bool,
}

impl Monster {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        health: i32,
        damage: i32,
        aggressive: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            vitals: Vitals::new(health),
            damage,
            aggressive,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.vitals.is_alive()
    }

    pub fn health(&self) -> i32 {
        self.vitals.health()
    }

    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        self.vitals.take_damage(amount)
    }

    /// Reset to full health and alive. Never triggered automatically.
    pub fn respawn(&mut self) {
        self.vitals.restore();
    }

    /// Name with a health descriptor, e.g. `giant rat (wounded)`
    pub fn status(&self) -> String {
        if !self.is_alive() {
            return format!("{} (dead)", self.name);
        }

        let fraction = self.vitals.fraction();
        let label = if fraction > 0.8 {
            "healthy"
        } else if fraction > 0.5 {
            "wounded"
        } else if fraction > 0.2 {
            "badly wounded"
        } else {
            "near death"
        };
        format!("{} ({})", self.name, label)
    }
}

/// First living monster with exactly this name (case-sensitive)
pub fn living_named<'a>(monsters: &'a mut [Monster], name: &str) -> Option<&'a mut Monster> {
    monsters
        .iter_mut()
        .find(|monster| monster.is_alive() && monster.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat() -> Monster {
        Monster::new("giant rat", "A large, mangy rat", 15, 3, true)
    }

    #[test]
    fn test_monster_new() {
        let monster = rat();
        assert!(monster.is_alive());
        assert_eq!(monster.health(), 15);
        assert_eq!(monster.vitals.max_health(), 15);
    }

    #[test]
    fn test_status_labels() {
        let mut monster = Monster::new("wolf", "", 100, 1, true);
        assert_eq!(monster.status(), "wolf (healthy)");
        monster.take_damage(30);
        assert_eq!(monster.status(), "wolf (wounded)");
        monster.take_damage(30);
        assert_eq!(monster.status(), "wolf (badly wounded)");
        monster.take_damage(30);
        assert_eq!(monster.status(), "wolf (near death)");
        monster.take_damage(30);
        assert_eq!(monster.status(), "wolf (dead)");
    }

    #[test]
    fn test_respawn() {
        let mut monster = rat();
        assert!(monster.take_damage(50).is_kill());
        monster.respawn();
        assert!(monster.is_alive());
        assert_eq!(monster.health(), 15);
    }

    #[test]
    fn test_living_named_skips_dead() {
        let mut monsters = vec![rat(), rat()];
        monsters[0].take_damage(15);

        let target = living_named(&mut monsters, "giant rat").unwrap();
        target.take_damage(1);

        assert_eq!(monsters[1].health(), 14);
    }

    #[test]
    fn test_living_named_is_case_sensitive() {
        let mut monsters = vec![rat()];
        assert!(living_named(&mut monsters, "Giant Rat").is_none());
        assert!(living_named(&mut monsters, "giant rat").is_some());
    }
}
