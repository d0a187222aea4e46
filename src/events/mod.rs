//! Publish payloads.
//!
//! ## Contents
//! - [`Payload`] shared JSON value handed to every subscriber of a pass
//! - [`CHANNEL_KEY`] the field the dispatcher stamps with the channel name

mod payload;

pub use payload::{Payload, CHANNEL_KEY};
