use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::ConsumerConfig;
use crate::core::buffer::{BufferItem, DeliveryBuffer};
use crate::core::delivery::{ConsumerTag, Delivery};
use crate::core::error::PullError;
use crate::core::signal::CompletionSignal;
use crate::core::transport::{ConsumerCallbacks, SubscribeOptions, Transport};

/// Observable lifecycle of a [`ReceiveConsumer`].
///
/// `Aborted` is terminal and absorbing; once there the consumer never
/// re-enters any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Registered,
    AwaitingFirstDelivery,
    SelfCancelling,
    Cancelled,
    Aborted,
}

#[derive(Debug, Default)]
struct Inner {
    registered: bool,
    aborted: bool,
}

/// Feeds at most one pushed message into a delivery buffer.
///
/// Built to satisfy exactly one blocking receive: the instant its first
/// delivery arrives it requests its own cancellation, and every later event
/// either aborts it or hands the delivery back to the broker with requeue.
/// The blocking-receive implementation that owns this object reads the
/// buffer; an `EndOfStream` item there means no message will ever come.
///
/// The cancelled flag is an independent compare-and-set so the dispatch
/// thread can trigger self-cancellation without contending on the mutex
/// that serializes abort, buffer insertion, and the nack fallback.
pub struct ReceiveConsumer {
    transport: Arc<dyn Transport>,
    queue: String,
    no_local: bool,
    tag: ConsumerTag,
    buffer: DeliveryBuffer,
    completion: CompletionSignal,
    cancelled: AtomicBool,
    inner: Mutex<Inner>,
    cancellation_timeout: Duration,
}

impl ReceiveConsumer {
    pub fn new(
        transport: Arc<dyn Transport>,
        queue: impl Into<String>,
        no_local: bool,
        buffer: DeliveryBuffer,
        config: &ConsumerConfig,
    ) -> Self {
        Self {
            transport,
            queue: queue.into(),
            no_local,
            tag: ConsumerTag::generate(),
            buffer,
            completion: CompletionSignal::new(),
            cancelled: AtomicBool::new(false),
            inner: Mutex::new(Inner::default()),
            cancellation_timeout: Duration::from_millis(config.cancellation_timeout_ms),
        }
    }

    pub fn tag(&self) -> &ConsumerTag {
        &self.tag
    }

    pub fn state(&self) -> ConsumerState {
        let inner = self.inner.lock();
        if inner.aborted {
            ConsumerState::Aborted
        } else if self.cancelled.load(Ordering::Acquire) {
            if self.completion.is_complete() {
                ConsumerState::Cancelled
            } else {
                ConsumerState::SelfCancelling
            }
        } else if inner.registered {
            ConsumerState::AwaitingFirstDelivery
        } else {
            ConsumerState::Registered
        }
    }

    /// Subscribe to the queue under this consumer's tag.
    ///
    /// Always no-auto-ack and non-exclusive: acknowledgement is the caller's
    /// responsibility alone. Subscription failure is returned to the caller
    /// as well as logged, so a receive can never silently wait on a
    /// subscription that does not exist.
    pub fn register(self: &Arc<Self>) -> Result<(), PullError> {
        let options = SubscribeOptions {
            auto_ack: false,
            no_local: self.no_local,
            exclusive: false,
        };
        let handler: Arc<dyn ConsumerCallbacks> = Arc::clone(self) as Arc<dyn ConsumerCallbacks>;
        debug!(consumer = %self.tag, queue = %self.queue, "subscribe");
        match self.transport.subscribe(&self.queue, &self.tag, options, handler) {
            Ok(()) => {
                self.inner.lock().registered = true;
                Ok(())
            }
            Err(e) => {
                error!(consumer = %self.tag, queue = %self.queue, error = %e, "subscribe failed");
                Err(e)
            }
        }
    }

    /// Client-initiated cancellation: issue the request (at most once) and
    /// wait up to the configured bound for the server's confirmation.
    pub fn cancel(&self) {
        self.cancel_request(true);
    }

    fn cancel_request(&self, wait: bool) {
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!(consumer = %self.tag, "cancel subscription");
            if let Err(e) = self.transport.cancel_subscription(&self.tag) {
                // channel already failing; no confirmation will ever come
                warn!(consumer = %self.tag, error = %e, "cancel request failed");
                self.abort();
            }
        }
        if wait {
            if self.completion.wait_until_complete(self.cancellation_timeout).is_err() {
                // non-fatal: assume eventual server-side cleanup
                warn!(
                    consumer = %self.tag,
                    timeout_ms = self.cancellation_timeout.as_millis() as u64,
                    "no cancel confirmation within bound"
                );
            }
        }
    }

    /// Idempotent terminal transition.
    ///
    /// Marks the consumer aborted, releases any cancel-waiter, and inserts
    /// exactly one `EndOfStream` marker so a blocked reader wakes.
    pub fn abort(&self) {
        let mut inner = self.inner.lock();
        self.abort_locked(&mut inner);
    }

    fn abort_locked(&self, inner: &mut Inner) {
        if inner.aborted {
            return;
        }
        inner.aborted = true;
        debug!(consumer = %self.tag, "abort");
        self.completion.set_complete();
        if self.buffer.put(BufferItem::EndOfStream).is_err() {
            debug!(consumer = %self.tag, "reader gone before end-of-stream marker");
        }
    }

    /// Lifecycle no-op kept for symmetry with the wider consumer interface;
    /// flow control is the single-delivery self-cancel plus nack-requeue.
    pub fn start(&self) {}

    /// See [`ReceiveConsumer::start`].
    pub fn stop(&self) {}

    pub fn is_end_of_stream(item: &BufferItem) -> bool {
        item.is_end_of_stream()
    }
}

impl ConsumerCallbacks for ReceiveConsumer {
    fn on_subscribe_confirmed(&self) {
        debug!(consumer = %self.tag, "subscription confirmed");
    }

    fn on_delivery(&self, delivery: Delivery) -> Result<(), PullError> {
        debug!(
            consumer = %self.tag,
            delivery_tag = delivery.delivery_tag,
            redelivered = delivery.redelivered,
            "delivery"
        );
        // One delivery is all we want: request our own cancellation before
        // anything else, without waiting for the server round-trip.
        self.cancel_request(false);

        let delivery_tag = delivery.delivery_tag;
        let mut inner = self.inner.lock();
        if !inner.aborted {
            match self.buffer.put(BufferItem::Delivery(delivery)) {
                Ok(()) => return Ok(()),
                Err(_) => {
                    debug!(consumer = %self.tag, "buffer closed during put");
                    self.abort_locked(&mut inner);
                }
            }
        }
        // Not enqueued: hand the message back for redelivery. We never ack
        // anything; that is the caller's responsibility.
        debug!(consumer = %self.tag, delivery_tag, "nack with requeue");
        if let Err(e) = self.transport.nack(delivery_tag, true) {
            error!(consumer = %self.tag, delivery_tag, error = %e, "nack failed");
            self.abort_locked(&mut inner);
            return Err(e); // the channel is assumed to be failing
        }
        Ok(())
    }

    fn on_cancel_confirmed(&self) {
        debug!(consumer = %self.tag, "cancel confirmed");
        self.completion.set_complete();
    }

    fn on_server_cancel(&self) {
        info!(consumer = %self.tag, "subscription cancelled by server");
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.completion.set_complete();
            self.abort(); // no further deliveries; release any blocked reader
        }
    }

    fn on_channel_shutdown(&self, cause: &PullError) {
        warn!(consumer = %self.tag, cause = %cause, "channel shutdown");
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.completion.set_complete();
            self.abort();
        }
    }
}
