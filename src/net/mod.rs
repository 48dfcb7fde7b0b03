pub mod limits;
pub mod line;
pub mod outbox;
pub mod session;
pub mod transport;
