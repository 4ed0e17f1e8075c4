pub mod buffer;
pub mod consumer;
pub mod delivery;
pub mod error;
pub mod session;
pub mod signal;
pub mod transport;
