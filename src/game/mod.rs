pub mod command;
pub mod constants;
pub mod error;
pub mod interpreter;
pub mod systems;
pub mod tick;
