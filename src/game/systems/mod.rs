pub mod combat;
pub mod monster_ai;
