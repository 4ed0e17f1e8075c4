//! pullmq – the receive path of a messaging-client adapter.
//!
//! A broker pushes messages at us by invoking callbacks on its dispatch
//! thread; application code wants to block and pull "the next message".
//! This crate bridges the two:
//!
//!  * `core`    – delivery buffer, per-receive consumer state machine,
//!                session consumption-mode arbiter
//!  * `config`  – TOML-driven runtime configuration
//!  * `logging` – tracing subscriber setup
//!
//! The transport itself (subscribe / cancel / nack and their wire encoding)
//! is a collaborator behind the `core::transport` traits, not part of this
//! crate.

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod config;
pub mod core;
pub mod logging;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use crate::core::buffer::{BufferItem, DeliveryBuffer};
pub use crate::core::consumer::{ConsumerState, ReceiveConsumer};
pub use crate::core::delivery::{ConsumerTag, Delivery};
pub use crate::core::error::PullError;
pub use crate::core::session::{
    ConsumerId, ConsumptionMode, ConsumptionModeGuard, ModeGuardRegistry, SessionId,
};
pub use crate::core::signal::CompletionSignal;
pub use crate::core::transport::{ConsumerCallbacks, SubscribeOptions, Transport};
pub use config::{load_config, Config};
