//! # Shared publish payload.
//!
//! [`Payload`] is the value handed to every subscriber of a publish pass. It is a
//! cheap-to-clone handle: all clones point at the same [`serde_json::Value`], so a
//! mutation made by one subscriber (or by the dispatcher itself) is visible to every
//! other holder, including later passes that were handed the same payload.
//!
//! ## Channel stamp
//! Before each subscriber runs, the dispatcher writes the channel name under
//! [`CHANNEL_KEY`] when the payload is a JSON object. Arrays and scalars are passed
//! through untouched.
//!
//! ## Example
//! ```rust
//! use mediator::{Payload, CHANNEL_KEY};
//! use serde_json::json;
//!
//! let payload = Payload::from(json!({ "user": 7 }));
//! let shared = payload.clone();
//!
//! shared.update(|v| v["seen"] = json!(true));
//!
//! assert!(payload.ptr_eq(&shared));
//! assert_eq!(payload.get("seen"), Some(json!(true)));
//! assert_eq!(payload.get(CHANNEL_KEY), None);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Key under which the dispatcher records the channel being published.
pub const CHANNEL_KEY: &str = "FxChannel";

/// Shared, mutable payload passed to subscribers.
///
/// ### Rules
/// - Clones share one value; use [`Payload::ptr_eq`] to test identity.
/// - Access goes through closures ([`read`](Self::read), [`update`](Self::update)) so
///   no guard outlives the call. Do not publish from inside those closures: the
///   dispatcher needs the write lock to stamp the channel.
#[derive(Clone)]
pub struct Payload {
    inner: Arc<RwLock<Value>>,
}

impl Payload {
    /// Wraps a JSON value.
    pub fn new(value: Value) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// An empty JSON object, the payload used when a publish carries none.
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Returns true if the payload is a JSON object (a plain mapping).
    pub fn is_mapping(&self) -> bool {
        self.inner.read().is_object()
    }

    /// Returns a clone of the value stored under `key`, if the payload is an object.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    /// Returns the channel stamped by the last publish pass, if any.
    pub fn channel(&self) -> Option<String> {
        self.inner
            .read()
            .get(CHANNEL_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    /// Returns a deep copy of the current value.
    pub fn snapshot(&self) -> Value {
        self.inner.read().clone()
    }

    /// Runs `f` with shared access to the value.
    pub fn read<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` with exclusive access to the value.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Returns true if both handles share the same value.
    pub fn ptr_eq(&self, other: &Payload) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Records `channel` under [`CHANNEL_KEY`] when the payload is an object.
    pub(crate) fn stamp_channel(&self, channel: &str) {
        if let Value::Object(map) = &mut *self.inner.write() {
            map.insert(CHANNEL_KEY.to_owned(), Value::String(channel.to_owned()));
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&*self.inner.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_empty_mapping() {
        let p = Payload::default();
        assert!(p.is_mapping());
        assert_eq!(p.snapshot(), json!({}));
    }

    #[test]
    fn test_stamp_sets_channel_on_object() {
        let p = Payload::from(json!({ "message": "hi" }));
        p.stamp_channel("orders");
        assert_eq!(p.channel().as_deref(), Some("orders"));
        assert_eq!(p.get("message"), Some(json!("hi")));
    }

    #[test]
    fn test_stamp_leaves_non_objects_untouched() {
        for value in [json!(true), json!([1, 2]), json!(3), json!("text"), Value::Null] {
            let p = Payload::from(value.clone());
            p.stamp_channel("orders");
            assert_eq!(p.snapshot(), value);
            assert_eq!(p.channel(), None);
        }
    }

    #[test]
    fn test_clones_share_mutations() {
        let a = Payload::empty();
        let b = a.clone();
        b.update(|v| v["n"] = json!(1));
        assert!(a.ptr_eq(&b));
        assert_eq!(a.get("n"), Some(json!(1)));
        assert!(!a.ptr_eq(&Payload::empty()));
    }
}
