use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::core::delivery::Delivery;
use crate::core::error::PullError;

/// Element type of a [`DeliveryBuffer`].
///
/// The end-of-stream marker is its own variant, so it can never be confused
/// with a real delivery that happens to carry an empty payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferItem {
    Delivery(Delivery),
    EndOfStream,
}

impl BufferItem {
    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, BufferItem::EndOfStream)
    }

    pub fn into_delivery(self) -> Option<Delivery> {
        match self {
            BufferItem::Delivery(delivery) => Some(delivery),
            BufferItem::EndOfStream => None,
        }
    }
}

/// Ordered blocking handoff between the transport's dispatch thread and one
/// blocking reader.
///
/// A consumer pushes at most one real delivery in its lifetime, followed by
/// at most one `EndOfStream` marker, so with the minimum capacity of two the
/// inserting side never blocks in practice. Once a reader has observed
/// `EndOfStream` the stream is permanently closed; polling again only ever
/// times out.
#[derive(Debug, Clone)]
pub struct DeliveryBuffer {
    sender: Sender<BufferItem>,
    receiver: Receiver<BufferItem>,
}

impl DeliveryBuffer {
    /// Create a buffer with room for `capacity` outstanding items.
    ///
    /// Clamped to at least 2: one delivery plus the end-of-stream marker must
    /// always fit without blocking the aborting thread.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(2));
        Self {
            sender: tx,
            receiver: rx,
        }
    }

    /// Blocking insertion, FIFO order.
    ///
    /// Fails only when every reading handle has been dropped; the item is
    /// abandoned, not retried.
    pub fn put(&self, item: BufferItem) -> Result<(), PullError> {
        self.sender.send(item).map_err(|_| PullError::BufferClosed)
    }

    /// Block until the next item is available.
    pub fn take(&self) -> Result<BufferItem, PullError> {
        self.receiver.recv().map_err(|_| PullError::BufferClosed)
    }

    /// Timed retrieval; `Ok(None)` when the timeout elapses first.
    pub fn poll(&self, timeout: Duration) -> Result<Option<BufferItem>, PullError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(item) => Ok(Some(item)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(PullError::BufferClosed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let buffer = DeliveryBuffer::new(4);
        buffer
            .put(BufferItem::Delivery(Delivery::new(1, "first")))
            .unwrap();
        buffer
            .put(BufferItem::Delivery(Delivery::new(2, "second")))
            .unwrap();
        buffer.put(BufferItem::EndOfStream).unwrap();

        assert_eq!(buffer.take().unwrap().into_delivery().unwrap().delivery_tag, 1);
        assert_eq!(buffer.take().unwrap().into_delivery().unwrap().delivery_tag, 2);
        assert!(buffer.take().unwrap().is_end_of_stream());
    }

    #[test]
    fn poll_times_out_on_empty_buffer() {
        let buffer = DeliveryBuffer::new(2);
        let polled = buffer.poll(Duration::from_millis(20)).unwrap();
        assert!(polled.is_none());
    }

    #[test]
    fn sentinel_is_never_a_delivery() {
        let empty = BufferItem::Delivery(Delivery::new(0, ""));
        assert!(!empty.is_end_of_stream());
        assert!(BufferItem::EndOfStream.is_end_of_stream());
        assert!(BufferItem::EndOfStream.into_delivery().is_none());
    }

    #[test]
    fn minimum_capacity_holds_delivery_and_marker() {
        let buffer = DeliveryBuffer::new(0);
        buffer
            .put(BufferItem::Delivery(Delivery::new(7, "only")))
            .unwrap();
        // must not block even though the delivery is still unread
        buffer.put(BufferItem::EndOfStream).unwrap();
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn blocked_reader_wakes_on_put() {
        let buffer = DeliveryBuffer::new(2);
        let reader = {
            let buffer = buffer.clone();
            std::thread::spawn(move || buffer.take().unwrap())
        };
        std::thread::sleep(Duration::from_millis(20));
        buffer
            .put(BufferItem::Delivery(Delivery::new(9, "wake")))
            .unwrap();
        let item = reader.join().unwrap();
        assert_eq!(item.into_delivery().unwrap().delivery_tag, 9);
    }
}
