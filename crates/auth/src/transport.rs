//! Marker transport boundary.
//!
//! Session markers live in a TTL'd key/value space supplied by the host: an
//! encrypted client-side blob (cookie), or a server-side keyed store. Both
//! are consumed through the same narrow interface; encryption and transport
//! integrity are the host's concern.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use palisade_core::Clock;

/// Transport-level failure (I/O with the keyed store, cookie layer errors).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("marker transport failure: {0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// TTL'd key/value storage for session markers.
pub trait MarkerTransport: Send + Sync {
    /// Store `value` under `key` for `ttl_seconds`. A non-positive TTL means
    /// the value is already expired.
    fn set(&self, key: &str, value: String, ttl_seconds: i64) -> Result<(), TransportError>;

    /// Fetch a live value. Expired or absent keys both read as `None`.
    fn get(&self, key: &str) -> Result<Option<String>, TransportError>;

    fn remove(&self, key: &str) -> Result<(), TransportError>;
}

/// In-memory transport, the reference implementation of the server-keyed
/// strategy. Expiry is evaluated lazily against the injected clock.
pub struct InMemoryTransport {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, (String, i64)>>,
}

impl InMemoryTransport {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl MarkerTransport for InMemoryTransport {
    fn set(&self, key: &str, value: String, ttl_seconds: i64) -> Result<(), TransportError> {
        let deadline = self.clock.now() + ttl_seconds.max(0);
        let mut entries = self
            .entries
            .write()
            .map_err(|_| TransportError::new("lock poisoned"))?;
        entries.insert(key.to_string(), (value, deadline));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, TransportError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| TransportError::new("lock poisoned"))?;
        Ok(entries.get(key).and_then(|(value, deadline)| {
            if self.clock.now() < *deadline {
                Some(value.clone())
            } else {
                None
            }
        }))
    }

    fn remove(&self, key: &str) -> Result<(), TransportError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| TransportError::new("lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::ManualClock;

    #[test]
    fn values_live_until_their_deadline() {
        let clock = Arc::new(ManualClock::new(0));
        let transport = InMemoryTransport::new(clock.clone());

        transport.set("k", "v".to_string(), 60).unwrap();
        assert_eq!(transport.get("k").unwrap().as_deref(), Some("v"));

        clock.advance(59);
        assert_eq!(transport.get("k").unwrap().as_deref(), Some("v"));

        clock.advance(1);
        assert_eq!(transport.get("k").unwrap(), None);
    }

    #[test]
    fn non_positive_ttl_is_immediately_expired() {
        let clock = Arc::new(ManualClock::new(100));
        let transport = InMemoryTransport::new(clock);

        transport.set("k", "v".to_string(), 0).unwrap();
        assert_eq!(transport.get("k").unwrap(), None);

        transport.set("k", "v".to_string(), -5).unwrap();
        assert_eq!(transport.get("k").unwrap(), None);
    }

    #[test]
    fn remove_forgets_the_key() {
        let clock = Arc::new(ManualClock::new(0));
        let transport = InMemoryTransport::new(clock);

        transport.set("k", "v".to_string(), 60).unwrap();
        transport.remove("k").unwrap();
        assert_eq!(transport.get("k").unwrap(), None);
    }
}
