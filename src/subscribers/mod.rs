//! # Subscriber model.
//!
//! Types describing who subscribes and what gets called.
//!
//! ## Architecture
//! ```text
//! subscribe(channel, callback, context)
//!        │
//!        ▼
//! Subscription { context: ContextRef, callback: Callback, unsubscribed }
//!                      │                     │
//!                      │                     ├─► Direct(Handler)  ──► handler.call(&payload)
//!                      │                     └─► Method(name)     ──► context.method(name)?.call(&payload)
//!                      ▼
//!            identity for unsubscribe / remove_context
//! ```
//!
//! ## Contents
//! - [`Context`], [`ContextRef`], [`Owner`] subscription owners
//! - [`Handler`], [`Callback`] what is invoked
//! - [`Subscription`], [`ChannelListing`], [`SubscribeRequest`] registrations

mod context;
mod handler;
mod subscription;

pub use context::{same_context, Context, ContextRef, Owner};
pub use handler::{Callback, Handler};
pub use subscription::{ChannelListing, SubscribeRequest, Subscription};
