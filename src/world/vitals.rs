//! Health bookkeeping shared by players and monsters

/// Result of applying damage to a [`Vitals`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Still standing with this much health left
    Wounded { remaining: i32 },
    /// Health reached zero with this hit
    Killed,
    /// Target was already dead, nothing changed
    AlreadyDead,
}

impl DamageOutcome {
    /// True only for the hit that caused death
    pub fn is_kill(self) -> bool {
        matches!(self, DamageOutcome::Killed)
    }
}

/// Current/maximum health plus the alive flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    health: i32,
    max_health: i32,
    alive: bool,
}

impl Vitals {
    /// Full health at `max_health`
    pub fn new(max_health: i32) -> Self {
        Self {
            health: max_health,
            max_health,
            alive: true,
        }
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_full(&self) -> bool {
        self.health >= self.max_health
    }

    /// Fraction of max health remaining (0.0 - 1.0)
    pub fn fraction(&self) -> f64 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health as f64 / self.max_health as f64
    }

    /// Apply damage, clamping at zero.
    ///
    /// The alive flag flips exactly once; further calls on a dead target
    /// report [`DamageOutcome::AlreadyDead`] and leave state untouched.
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::AlreadyDead;
        }

        self.health -= amount.max(0);
        if self.health <= 0 {
            self.health = 0;
            self.alive = false;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Wounded {
                remaining: self.health,
            }
        }
    }

    /// Heal up to max health, returning the amount actually restored
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.health;
        self.health = (self.health + amount.max(0)).min(self.max_health);
        self.health - before
    }

    /// Back to full health and alive
    pub fn restore(&mut self) {
        self.health = self.max_health;
        self.alive = true;
    }

    /// Permanently raise max health and current health by `amount`
    pub fn raise_max(&mut self, amount: i32) {
        self.max_health += amount;
        self.health += amount;
    }
}
