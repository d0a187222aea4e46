//! # Subscriber callbacks.
//!
//! A subscription's target is a [`Callback`]:
//! - [`Callback::Direct`] wraps a [`Handler`], a shared closure `Fn(&Payload)`;
//! - [`Callback::Method`] names a method that is resolved on the subscription's
//!   [`Context`](crate::Context) every time the channel is published.
//!
//! ## Matching
//! `unsubscribe` compares callbacks by key:
//! - two methods match when their names are equal;
//! - two handlers built with a source key ([`Handler::with_source`] or the
//!   [`handler!`](crate::handler) macro) match when the keys are equal, so a freshly
//!   written closure with the same tokens retires the original one;
//! - two handlers without a source key match only if they are clones of the same
//!   handler.
//!
//! ## Example
//! ```rust
//! use mediator::{handler, Callback, Handler};
//!
//! let a = handler!(|_p| {});
//! let b = handler!(|_p| {});
//! assert!(Callback::from(a).matches(&Callback::from(b)));
//!
//! let c = Handler::new(|_p| {});
//! let d = Handler::new(|_p| {});
//! assert!(!Callback::from(&c).matches(&Callback::from(&d)));
//! assert!(Callback::from(&c).matches(&Callback::from(c.clone())));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::events::Payload;
use crate::subscribers::ContextRef;

type HandlerFn = dyn Fn(&Payload) + Send + Sync + 'static;

/// Shared subscriber closure.
#[derive(Clone)]
pub struct Handler {
    f: Arc<HandlerFn>,
    source: Option<Cow<'static, str>>,
}

impl Handler {
    /// Wraps a closure. Matching is by identity of this handler and its clones.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            source: None,
        }
    }

    /// Wraps a closure keyed by its source text.
    ///
    /// Two handlers with the same key are interchangeable for `unsubscribe`.
    pub fn with_source<F>(source: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            source: Some(source.into()),
        }
    }

    /// Returns the source key, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Invokes the closure.
    pub fn call(&self, payload: &Payload) {
        (self.f)(payload)
    }

    fn same_key(&self, other: &Handler) -> bool {
        match (&self.source, &other.source) {
            (Some(a), Some(b)) => a == b,
            (None, None) => std::ptr::eq(
                Arc::as_ptr(&self.f) as *const (),
                Arc::as_ptr(&other.f) as *const (),
            ),
            _ => false,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Builds a [`Handler`] keyed by the tokens of the closure expression.
///
/// The key is `stringify!` of the closure, so it changes with any token but not
/// with layout: two closures that differ only in whitespace or comments get the
/// same key and **do** match, where a raw-text comparison would keep them apart.
/// When layout must count, key the handler with [`Handler::with_source`] and the
/// exact source text instead.
#[macro_export]
macro_rules! handler {
    ($($closure:tt)+) => {
        $crate::Handler::with_source(stringify!($($closure)+), $($closure)+)
    };
}

/// Target of a subscription.
#[derive(Clone, Debug)]
pub enum Callback {
    /// A closure called as-is.
    Direct(Handler),
    /// A method name looked up on the context at every call.
    Method(Cow<'static, str>),
}

impl Callback {
    /// Builds a [`Callback::Method`].
    pub fn method(name: impl Into<Cow<'static, str>>) -> Self {
        Callback::Method(name.into())
    }

    /// Returns true if both callbacks have the same matching key.
    pub fn matches(&self, other: &Callback) -> bool {
        match (self, other) {
            (Callback::Direct(a), Callback::Direct(b)) => a.same_key(b),
            (Callback::Method(a), Callback::Method(b)) => a == b,
            _ => false,
        }
    }

    /// Resolves the callback against `context`.
    ///
    /// Returns `None` when a method name is empty or the context does not expose it.
    pub(crate) fn resolve(&self, context: &ContextRef) -> Option<Handler> {
        match self {
            Callback::Direct(h) => Some(h.clone()),
            Callback::Method(name) if name.is_empty() => None,
            Callback::Method(name) => Arc::clone(context).method(name),
        }
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Direct(h) => f.write_str(h.source().unwrap_or("<closure>")),
            Callback::Method(name) => write!(f, "{name}()"),
        }
    }
}

impl From<Handler> for Callback {
    fn from(h: Handler) -> Self {
        Callback::Direct(h)
    }
}

impl From<&Handler> for Callback {
    fn from(h: &Handler) -> Self {
        Callback::Direct(h.clone())
    }
}

impl From<&'static str> for Callback {
    fn from(name: &'static str) -> Self {
        Callback::Method(Cow::Borrowed(name))
    }
}

impl From<String> for Callback {
    fn from(name: String) -> Self {
        Callback::Method(Cow::Owned(name))
    }
}
