//! Mediator core: registry, dispatch and deferred work.
//!
//! The only public API from this module is [`Mediator`] with its configuration,
//! builder and sweep report.
//!
//! Internal modules:
//! - [`registry`]: channel name → ordered subscription list;
//! - [`active`]: per-channel depth of publish passes in progress;
//! - [`queue`]: deferred publishes and cleanups;
//! - [`mediator`]: subscribe / unsubscribe / publish / remove_context / dispose;
//! - [`sweeper`]: periodic tokio task replaying deferred work;
//! - [`builder`], [`config`]: construction.

mod active;
mod builder;
mod config;
mod mediator;
mod queue;
mod registry;
mod sweeper;

pub use builder::MediatorBuilder;
pub use config::MediatorConfig;
pub use mediator::{Mediator, SweepReport};
