//! # Subscriptions and subscribe requests.
//!
//! A [`Subscription`] is one `(context, callback)` registration on one channel. It
//! is created by `subscribe`, flagged (never removed) by `unsubscribe` and
//! `remove_context`, and physically dropped only by channel cleanup once the
//! channel is no longer being dispatched.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::subscribers::{same_context, Callback, ContextRef, Handler};

/// One registration on a channel.
pub struct Subscription {
    context: ContextRef,
    callback: Callback,
    unsubscribed: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(context: ContextRef, callback: Callback) -> Self {
        Self {
            context,
            callback,
            unsubscribed: AtomicBool::new(false),
        }
    }

    /// The owner that registered this subscription.
    pub fn context(&self) -> &ContextRef {
        &self.context
    }

    /// The registered callback.
    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    /// Returns true once `unsubscribe` or `remove_context` retired this entry.
    pub fn is_unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::Acquire)
    }

    /// Returns true if `context` owns this subscription.
    pub fn is_owned_by(&self, context: &ContextRef) -> bool {
        same_context(&self.context, context)
    }

    pub(crate) fn matches(&self, context: &ContextRef, callback: &Callback) -> bool {
        self.is_owned_by(context) && self.callback.matches(callback)
    }

    pub(crate) fn mark_unsubscribed(&self) {
        self.unsubscribed.store(true, Ordering::Release);
    }

    /// Resolves the callback against the owner.
    pub(crate) fn resolve(&self) -> Option<Handler> {
        self.callback.resolve(&self.context)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("context", &self.context.name())
            .field("callback", &self.callback)
            .field("unsubscribed", &self.is_unsubscribed())
            .finish()
    }
}

/// Snapshot of one channel, as returned by `channel_listing`.
#[derive(Clone, Debug)]
pub struct ChannelListing {
    /// Channel name.
    pub channel: String,
    /// Subscriptions in invocation order, retired entries included.
    pub subscriptions: Vec<Arc<Subscription>>,
}

/// Full subscribe request.
///
/// [`Mediator::subscribe`](crate::Mediator::subscribe) covers the common case; the
/// request form exists for [`Mediator::try_subscribe`](crate::Mediator::try_subscribe)
/// and for the retired `count` option.
#[derive(Clone)]
pub struct SubscribeRequest {
    pub(crate) channel: Cow<'static, str>,
    pub(crate) callback: Callback,
    pub(crate) context: ContextRef,
    pub(crate) count: Option<u32>,
}

impl SubscribeRequest {
    /// Creates a request for `channel`.
    pub fn new(
        channel: impl Into<Cow<'static, str>>,
        callback: impl Into<Callback>,
        context: &ContextRef,
    ) -> Self {
        Self {
            channel: channel.into(),
            callback: callback.into(),
            context: Arc::clone(context),
            count: None,
        }
    }

    /// Limits the number of deliveries.
    ///
    /// Retired: the value is ignored and a warning is logged.
    #[deprecated(note = "delivery counts are no longer supported; unsubscribe explicitly")]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Channel this request targets.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl fmt::Debug for SubscribeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeRequest")
            .field("channel", &self.channel)
            .field("callback", &self.callback)
            .field("context", &self.context.name())
            .field("count", &self.count)
            .finish()
    }
}
