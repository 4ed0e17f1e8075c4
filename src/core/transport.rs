use std::sync::Arc;

use crate::core::delivery::{ConsumerTag, Delivery};
use crate::core::error::PullError;

/// Options attached to a subscription request.
///
/// A [`ReceiveConsumer`](crate::core::consumer::ReceiveConsumer) always
/// subscribes with `auto_ack: false` (acknowledgement belongs to the caller)
/// and `exclusive: false`; only `no_local` is caller-chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub auto_ack: bool,
    pub no_local: bool,
    pub exclusive: bool,
}

/// The transport channel this crate consumes but does not implement.
///
/// Implementations dispatch broker events back through the
/// [`ConsumerCallbacks`] handler registered at subscribe time, on their own
/// dispatch thread(s).
pub trait Transport: Send + Sync {
    /// Subscribe `handler` to `queue` under `tag`.
    fn subscribe(
        &self,
        queue: &str,
        tag: &ConsumerTag,
        options: SubscribeOptions,
        handler: Arc<dyn ConsumerCallbacks>,
    ) -> Result<(), PullError>;

    /// Request cancellation of the subscription held under `tag`; the
    /// transport confirms asynchronously via `on_cancel_confirmed`.
    fn cancel_subscription(&self, tag: &ConsumerTag) -> Result<(), PullError>;

    /// Negatively acknowledge a single delivery, optionally requeueing it.
    fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), PullError>;
}

/// Callbacks the transport invokes on its dispatch thread.
///
/// Handlers must not block for unbounded durations; stalling the dispatch
/// thread stalls delivery and acknowledgement processing for the whole
/// channel.
pub trait ConsumerCallbacks: Send + Sync {
    /// The subscription was accepted by the server.
    fn on_subscribe_confirmed(&self);

    /// A message was pushed for this subscription.
    fn on_delivery(&self, delivery: Delivery) -> Result<(), PullError>;

    /// A client-requested cancellation was fully processed by the server.
    fn on_cancel_confirmed(&self);

    /// The server revoked the subscription on its own initiative.
    fn on_server_cancel(&self);

    /// The underlying channel failed.
    fn on_channel_shutdown(&self, cause: &PullError);
}
