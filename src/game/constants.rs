/// World tick constants
pub mod tick {
    /// Interval between monster turns in milliseconds
    pub const INTERVAL_MS: u64 = 3000;
    /// Chance per tick that a passive monster attacks when players are present
    pub const PASSIVE_ATTACK_CHANCE: f64 = 0.3;
}

/// New player stats
pub mod player {
    pub const STARTING_HEALTH: i32 = 30;
    pub const BASE_DAMAGE: i32 = 5;
}

/// Combat jitter and floors
pub mod combat {
    /// Player hits vary by +/- this much
    pub const PLAYER_JITTER: i32 = 1;
    /// Monster hits vary by +/- this much
    pub const MONSTER_JITTER: i32 = 2;
    /// No hit ever does less than this
    pub const MIN_DAMAGE: i32 = 1;
}

/// `rest` healing
pub mod rest {
    /// Heal max health divided by this
    pub const DIVISOR: i32 = 4;
    /// ...but never less than this
    pub const MIN_HEAL: i32 = 5;
}

/// `use` effect magnitudes
pub mod tome {
    pub const MAX_HEALTH_GAIN: i32 = 10;
    pub const DAMAGE_GAIN: i32 = 2;
}

/// Line protocol limits
pub mod net {
    /// Longest accepted input line in bytes
    pub const MAX_LINE_LENGTH: usize = 1024;
    /// Undelivered lines buffered per player before dropping
    pub const OUTBOX_CAPACITY: usize = 256;
}
