//! # Subscription owners.
//!
//! Every subscription belongs to a [`Context`]: the object that registered it. The
//! mediator never looks inside a context; it uses it for two things:
//! - **identity**: `unsubscribe` and `remove_context` match owners by pointer
//!   ([`same_context`]), never by value;
//! - **method lookup**: a [`Callback::Method`](crate::Callback::Method) is resolved
//!   through [`Context::method`] each time the channel is published.
//!
//! ## Implementing a context
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use mediator::{Context, Handler, Payload};
//!
//! #[derive(Default)]
//! struct Cart {
//!     updates: AtomicUsize,
//! }
//!
//! impl Cart {
//!     fn on_update(&self, _payload: &Payload) {
//!         self.updates.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! impl Context for Cart {
//!     fn method(self: Arc<Self>, name: &str) -> Option<Handler> {
//!         match name {
//!             "on_update" => Some(Handler::new(move |p| self.on_update(p))),
//!             _ => None,
//!         }
//!     }
//!
//!     fn name(&self) -> &str { "cart" }
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::subscribers::Handler;

/// Owner of subscriptions.
///
/// ### Rules
/// - Identity is the `Arc` allocation: clones of one `ContextRef` are the same owner.
/// - [`Context::method`] is called outside the mediator's lock; it may publish or
///   subscribe freely.
pub trait Context: Send + Sync + 'static {
    /// Resolves a named method to a handler.
    ///
    /// Returns `None` when the context has no method with that name. The default
    /// exposes no methods.
    fn method(self: Arc<Self>, name: &str) -> Option<Handler> {
        let _ = name;
        None
    }

    /// Returns the owner name used in logs.
    ///
    /// The default uses `type_name::<Self>()`.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared reference to a subscription owner.
pub type ContextRef = Arc<dyn Context>;

/// Returns true if `a` and `b` are the same owner.
pub fn same_context(a: &ContextRef, b: &ContextRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Context with no methods, used as a plain identity for closure subscriptions.
#[derive(Debug, Default)]
pub struct Owner {
    label: Cow<'static, str>,
}

impl Owner {
    /// Creates an owner with a label used in logs.
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Creates the owner and returns it as a [`ContextRef`].
    pub fn arc(label: impl Into<Cow<'static, str>>) -> ContextRef {
        Arc::new(Self::new(label))
    }
}

impl Context for Owner {
    fn name(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_per_allocation() {
        let a = Owner::arc("same");
        let b = Owner::arc("same");
        assert!(same_context(&a, &a.clone()));
        assert!(!same_context(&a, &b));
    }

    #[test]
    fn test_owner_exposes_no_methods() {
        let a = Owner::arc("plain");
        assert_eq!(a.name(), "plain");
        assert!(a.method("anything").is_none());
    }
}
