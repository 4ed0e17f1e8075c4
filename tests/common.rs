#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use pullmq::{ConsumerCallbacks, ConsumerTag, Delivery, PullError, SubscribeOptions, Transport};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        pullmq::logging::init_logging();
    });
}

/// Scripted in-process transport recording every call a consumer makes.
#[derive(Default)]
pub struct FakeTransport {
    handler: Mutex<Option<Arc<dyn ConsumerCallbacks>>>,
    pub subscribes: Mutex<Vec<(String, String, SubscribeOptions)>>,
    pub cancel_requests: AtomicUsize,
    pub nacks: Mutex<Vec<(u64, bool)>>,
    pub fail_subscribe: AtomicBool,
    pub fail_cancel: AtomicBool,
    pub fail_nack: AtomicBool,
    /// Respond to a cancel request with an immediate confirmation.
    pub confirm_cancel: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport that confirms cancellations immediately.
    pub fn confirming() -> Arc<Self> {
        let transport = Self::default();
        transport.confirm_cancel.store(true, Ordering::SeqCst);
        Arc::new(transport)
    }

    fn handler(&self) -> Option<Arc<dyn ConsumerCallbacks>> {
        self.handler.lock().clone()
    }

    /// Push a delivery at the registered consumer, as the dispatch thread would.
    pub fn deliver(&self, delivery: Delivery) -> Result<(), PullError> {
        self.handler().expect("no consumer subscribed").on_delivery(delivery)
    }

    pub fn server_cancel(&self) {
        self.handler().expect("no consumer subscribed").on_server_cancel();
    }

    pub fn shutdown(&self, reason: &str) {
        self.handler()
            .expect("no consumer subscribed")
            .on_channel_shutdown(&PullError::ChannelClosed(reason.to_owned()));
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_requests.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    fn subscribe(
        &self,
        queue: &str,
        tag: &ConsumerTag,
        options: SubscribeOptions,
        handler: Arc<dyn ConsumerCallbacks>,
    ) -> Result<(), PullError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(PullError::ChannelClosed("subscribe refused".to_owned()));
        }
        self.subscribes
            .lock()
            .push((queue.to_owned(), tag.to_string(), options));
        *self.handler.lock() = Some(Arc::clone(&handler));
        handler.on_subscribe_confirmed();
        Ok(())
    }

    fn cancel_subscription(&self, _tag: &ConsumerTag) -> Result<(), PullError> {
        self.cancel_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(PullError::ChannelClosed("channel is closing".to_owned()));
        }
        if self.confirm_cancel.load(Ordering::SeqCst) {
            if let Some(handler) = self.handler() {
                handler.on_cancel_confirmed();
            }
        }
        Ok(())
    }

    fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), PullError> {
        if self.fail_nack.load(Ordering::SeqCst) {
            return Err(PullError::ChannelClosed("nack refused".to_owned()));
        }
        self.nacks.lock().push((delivery_tag, requeue));
        Ok(())
    }
}
