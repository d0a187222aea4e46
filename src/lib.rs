//! # mediator
//!
//! **mediator** is an in-process publish/subscribe event bus. Producers publish
//! to named channels; consumers subscribe callbacks on behalf of an owner
//! ("context"). Everything runs on the caller's stack, and callbacks may
//! subscribe, unsubscribe and publish from inside a publish.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Context    │   │   Context    │   │   Context    │
//!     │  (owner #1)  │   │  (owner #2)  │   │  (owner #3)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ subscribe        │ subscribe        │ remove_context
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Mediator (composition root)                                      │
//! │  - ChannelRegistry (channel → ordered subscriptions)              │
//! │  - ActiveChannels  (depth of passes in progress per channel)      │
//! │  - DeferredQueues  (publishes / cleanups waiting for idle)        │
//! └──────┬──────────────────────────────────────────────────┬─────────┘
//!        │ publish(channel, payload)                        │ weak ref
//!        ▼                                                  ▼
//!   one pass over a fixed-length snapshot            ┌──────────────┐
//!   ├─ other channel published → runs inline         │   Sweeper    │
//!   ├─ same channel published  → queued ───────────► │ (tokio task) │
//!   └─ on release: cleanup + drain                   └──────────────┘
//! ```
//!
//! ### Lifecycle of a subscription
//! ```text
//! subscribe ──► active ──► unsubscribe / remove_context ──► retired (skipped)
//!                                                              │
//!                         channel idle (publish end / sweep) ──┴──► removed
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types                                 |
//! |-------------------|----------------------------------------------------------|-------------------------------------------|
//! | **Dispatch**      | Reentrancy-safe publish with deferred same-channel work  | [`Mediator`], [`SweepReport`]             |
//! | **Subscribers**   | Owners, closures and by-name methods                     | [`Context`], [`Handler`], [`Callback`]    |
//! | **Payloads**      | Shared JSON payload stamped with the channel name        | [`Payload`], [`CHANNEL_KEY`]              |
//! | **Errors**        | Logged taxonomy, returned only by `try_subscribe`        | [`MediatorError`]                         |
//! | **Configuration** | Sweep period, drain-on-release, instance name            | [`MediatorConfig`], [`MediatorBuilder`]   |
//!
//! ## Logging
//! All diagnostics go through `tracing`; install any subscriber to see them.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use parking_lot::Mutex;
//! use mediator::{Handler, Mediator, Owner, Payload};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = Mediator::builder(Default::default())
//!         .name("app")
//!         .sweep_interval(Duration::from_millis(50))
//!         .build();
//!     let owner = Owner::arc("audit");
//!     let log = Arc::new(Mutex::new(Vec::new()));
//!
//!     // Publishing the same channel from inside its own pass is deferred.
//!     let (inner_bus, inner_log) = (bus.clone(), log.clone());
//!     bus.subscribe("saved", Handler::new(move |p: &Payload| {
//!         inner_log.lock().push(p.get("id"));
//!         if p.get("id") == Some(serde_json::json!(1)) {
//!             inner_bus.publish("saved", Payload::from(serde_json::json!({ "id": 2 })));
//!         }
//!     }), &owner);
//!
//!     bus.publish("saved", Payload::from(serde_json::json!({ "id": 1 })));
//!     assert_eq!(log.lock().len(), 2);
//!
//!     bus.dispose();
//! }
//! ```
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Mediator, MediatorBuilder, MediatorConfig, SweepReport};
pub use error::MediatorError;
pub use events::{Payload, CHANNEL_KEY};
pub use subscribers::{
    same_context, Callback, ChannelListing, Context, ContextRef, Handler, Owner,
    SubscribeRequest, Subscription,
};
