//! # Active dispatch tracker.
//!
//! Records which channels are in the middle of a publish pass, as a depth counter
//! per channel.
//!
//! ## Rules
//! - `enter` before iterating a channel's list, `leave` after
//! - a channel with depth > 0 is **active**: publishes to it are deferred and its
//!   list is never compacted
//! - entries are removed when their depth returns to zero

use std::collections::HashMap;

/// Depth counters for channels currently being dispatched.
#[derive(Debug, Default)]
pub struct ActiveChannels {
    depth: HashMap<String, usize>,
}

impl ActiveChannels {
    /// Marks one more pass over `channel`; returns the new depth.
    pub fn enter(&mut self, channel: &str) -> usize {
        let d = self.depth.entry(channel.to_owned()).or_insert(0);
        *d += 1;
        *d
    }

    /// Marks the end of one pass over `channel`; returns the remaining depth.
    ///
    /// Leaving an inactive channel is a no-op returning 0.
    pub fn leave(&mut self, channel: &str) -> usize {
        match self.depth.get_mut(channel) {
            Some(d) if *d > 1 => {
                *d -= 1;
                *d
            }
            Some(_) => {
                self.depth.remove(channel);
                0
            }
            None => 0,
        }
    }

    /// Returns true if `channel` has a pass in progress.
    pub fn is_active(&self, channel: &str) -> bool {
        self.depth.contains_key(channel)
    }

    /// Returns sorted list of active channel names.
    pub fn snapshot(&self) -> Vec<String> {
        let mut names: Vec<String> = self.depth.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}
