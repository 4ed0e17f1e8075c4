use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

/// One broker-pushed message as handed to a consumer callback.
///
/// Owned by the transport until delivered, then by whichever buffer slot
/// holds it, finally by the caller that reads it. The delivery tag is the
/// per-channel identifier the transport expects back in ack/nack calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivery_tag: u64,
    pub redelivered: bool,
    pub payload: Bytes,
    pub properties: HashMap<String, String>,
}

impl Delivery {
    pub fn new(delivery_tag: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            delivery_tag,
            redelivered: false,
            payload: payload.into(),
            properties: HashMap::new(),
        }
    }

    pub fn redelivered(mut self) -> Self {
        self.redelivered = true;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Process-unique identifier for one subscription to the transport.
///
/// Generated at consumer construction, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsumerTag(pub String);

impl ConsumerTag {
    pub fn generate() -> Self {
        ConsumerTag(format!("pullmq-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for ConsumerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConsumerTag {
    fn from(s: &str) -> Self {
        ConsumerTag(s.to_owned())
    }
}

impl From<String> for ConsumerTag {
    fn from(s: String) -> Self {
        ConsumerTag(s)
    }
}

impl From<ConsumerTag> for String {
    fn from(tag: ConsumerTag) -> Self {
        tag.0
    }
}

impl AsRef<str> for ConsumerTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ConsumerTag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
