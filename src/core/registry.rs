//! # Channel registry.
//!
//! Maps channel names to their ordered subscription lists.
//!
//! ## Architecture
//! ```text
//! subscribe ─────► push(channel, sub)            (creates the channel lazily)
//! publish ───────► len(channel) + get(channel, i) (index walk, no iterator held)
//! unsubscribe ───► mark(channel, ctx, cb)         (flag only)
//! remove_context ► mark_context(ctx)              (flag only, every channel)
//! cleanup ───────► compact(channel)               (drop flagged, remove if empty)
//! ```
//!
//! ## Rules
//! - Order of a list is insertion order and is the invocation order
//! - Flagging never changes a list's length
//! - Only `compact` removes entries, and the caller guarantees the channel is idle
//! - `compact` hands the removed entries back; the caller drops them once the
//!   state lock is released
//! - A channel exists only while its list is non-empty after compaction

use std::collections::HashMap;
use std::sync::Arc;

use crate::subscribers::{Callback, ChannelListing, ContextRef, Subscription};

/// Result of compacting one channel.
#[derive(Debug)]
pub enum Compacted {
    /// The channel did not exist.
    Missing,
    /// `retired` entries were taken out; the channel still has subscribers.
    Kept { retired: Vec<Arc<Subscription>> },
    /// Every entry was retired; the channel was removed.
    Dropped { retired: Vec<Arc<Subscription>> },
}

impl Compacted {
    /// Number of entries taken out of the channel.
    pub fn removed(&self) -> usize {
        match self {
            Compacted::Missing => 0,
            Compacted::Kept { retired } | Compacted::Dropped { retired } => retired.len(),
        }
    }
}

/// Channel name → subscriptions.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, Vec<Arc<Subscription>>>,
}

impl ChannelRegistry {
    /// Appends a subscription, creating the channel if needed.
    pub fn push(&mut self, channel: &str, sub: Arc<Subscription>) {
        self.channels.entry(channel.to_owned()).or_default().push(sub);
    }

    /// Returns the length of `channel`'s list (0 if unknown).
    pub fn len(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, Vec::len)
    }

    /// Returns true if no channel exists.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Returns the subscription at `index` in `channel`'s list.
    pub fn get(&self, channel: &str, index: usize) -> Option<Arc<Subscription>> {
        self.channels
            .get(channel)
            .and_then(|subs| subs.get(index))
            .cloned()
    }

    /// Flags every entry of `channel` owned by `context` with a matching callback.
    ///
    /// Returns the number of entries flagged, already-flagged ones included.
    pub fn mark(&self, channel: &str, context: &ContextRef, callback: &Callback) -> usize {
        let Some(subs) = self.channels.get(channel) else {
            return 0;
        };
        let mut marked = 0;
        for sub in subs.iter().filter(|s| s.matches(context, callback)) {
            sub.mark_unsubscribed();
            marked += 1;
        }
        marked
    }

    /// Flags every entry owned by `context` on every channel.
    ///
    /// Returns the sorted names of the channels that had at least one entry flagged.
    pub fn mark_context(&self, context: &ContextRef) -> Vec<String> {
        let mut touched = Vec::new();
        for (name, subs) in &self.channels {
            let mut hit = false;
            for sub in subs.iter().filter(|s| s.is_owned_by(context)) {
                sub.mark_unsubscribed();
                hit = true;
            }
            if hit {
                touched.push(name.clone());
            }
        }
        touched.sort_unstable();
        touched
    }

    /// Takes retired entries out of `channel`; removes the channel if none remain.
    pub fn compact(&mut self, channel: &str) -> Compacted {
        let Some(subs) = self.channels.get_mut(channel) else {
            return Compacted::Missing;
        };
        let (live, retired): (Vec<_>, Vec<_>) = std::mem::take(subs)
            .into_iter()
            .partition(|s| !s.is_unsubscribed());
        if live.is_empty() {
            self.channels.remove(channel);
            Compacted::Dropped { retired }
        } else {
            *subs = live;
            Compacted::Kept { retired }
        }
    }

    /// Returns a snapshot of every channel, sorted by name.
    pub fn listing(&self) -> Vec<ChannelListing> {
        let mut out: Vec<ChannelListing> = self
            .channels
            .iter()
            .map(|(name, subs)| ChannelListing {
                channel: name.clone(),
                subscriptions: subs.clone(),
            })
            .collect();
        out.sort_unstable_by(|a, b| a.channel.cmp(&b.channel));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::Owner;

    fn sub(ctx: &ContextRef, method: &'static str) -> Arc<Subscription> {
        Arc::new(Subscription::new(ctx.clone(), Callback::method(method)))
    }

    #[test]
    fn test_push_creates_channel_in_order() {
        let ctx = Owner::arc("a");
        let mut reg = ChannelRegistry::default();
        reg.push("c", sub(&ctx, "one"));
        reg.push("c", sub(&ctx, "two"));
        assert_eq!(reg.len("c"), 2);
        assert_eq!(reg.len("unknown"), 0);
        let second = reg.get("c", 1).map(|s| s.callback().to_string());
        assert_eq!(second.as_deref(), Some("two()"));
        assert!(reg.get("c", 2).is_none());
    }

    #[test]
    fn test_mark_flags_without_resizing() {
        let a = Owner::arc("a");
        let b = Owner::arc("b");
        let mut reg = ChannelRegistry::default();
        reg.push("c", sub(&a, "on"));
        reg.push("c", sub(&b, "on"));
        reg.push("c", sub(&a, "on"));

        assert_eq!(reg.mark("c", &a, &Callback::method("on")), 2);
        assert_eq!(reg.len("c"), 3);
        assert_eq!(reg.mark("missing", &a, &Callback::method("on")), 0);
    }

    #[test]
    fn test_compact_keeps_or_drops() {
        let a = Owner::arc("a");
        let b = Owner::arc("b");
        let mut reg = ChannelRegistry::default();
        reg.push("c", sub(&a, "on"));
        reg.push("c", sub(&b, "on"));

        reg.mark("c", &a, &Callback::method("on"));
        let kept = reg.compact("c");
        assert!(matches!(kept, Compacted::Kept { .. }));
        assert_eq!(kept.removed(), 1);
        assert_eq!(reg.len("c"), 1);

        reg.mark("c", &b, &Callback::method("on"));
        match reg.compact("c") {
            Compacted::Dropped { retired } => {
                assert_eq!(retired.len(), 1);
                assert!(retired[0].is_owned_by(&b));
            }
            other => panic!("unexpected compaction: {other:?}"),
        }
        assert!(reg.is_empty());
        assert!(matches!(reg.compact("c"), Compacted::Missing));
    }

    #[test]
    fn test_mark_context_spans_channels() {
        let a = Owner::arc("a");
        let b = Owner::arc("b");
        let mut reg = ChannelRegistry::default();
        reg.push("y", sub(&a, "on"));
        reg.push("x", sub(&a, "other"));
        reg.push("x", sub(&b, "on"));
        reg.push("z", sub(&b, "on"));

        assert_eq!(reg.mark_context(&a), vec!["x".to_string(), "y".to_string()]);
        let listing = reg.listing();
        let names: Vec<&str> = listing.iter().map(|l| l.channel.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert!(listing[0].subscriptions[0].is_unsubscribed());
        assert!(!listing[0].subscriptions[1].is_unsubscribed());
    }
}
