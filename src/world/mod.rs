pub mod content;
pub mod graph;
pub mod item;
pub mod monster;
pub mod player;
pub mod room;
pub mod vitals;
