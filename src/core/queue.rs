//! # Deferred work queues.
//!
//! Work that cannot run because its channel is active waits here:
//! - **publish queue**: `(channel, payload)` of a publish that hit an active channel
//! - **delete queue**: channels whose cleanup has to wait
//!
//! Every entry carries a sequence number. A sweep or drain only takes entries
//! enqueued before it started (`seq < watermark`), so work queued by the replay
//! itself waits for the next round instead of looping.
//!
//! An entry leaves its queue at the moment it is taken for execution; taking is
//! the "completed" mark.

use std::collections::VecDeque;

use crate::core::active::ActiveChannels;
use crate::events::Payload;

/// A publish waiting for its channel to become idle.
#[derive(Debug)]
pub struct PendingPublish {
    pub seq: u64,
    pub channel: String,
    pub payload: Payload,
}

/// A cleanup waiting for its channel to become idle.
#[derive(Debug)]
pub struct PendingDelete {
    pub seq: u64,
    pub channel: String,
}

/// Publish and delete queues.
#[derive(Debug, Default)]
pub struct DeferredQueues {
    publishes: VecDeque<PendingPublish>,
    deletes: VecDeque<PendingDelete>,
    next_seq: u64,
}

impl DeferredQueues {
    /// Sequence number the next entry will get. Entries below it exist now.
    pub fn watermark(&self) -> u64 {
        self.next_seq
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Appends a deferred publish.
    pub fn push_publish(&mut self, channel: &str, payload: Payload) {
        let seq = self.bump();
        self.publishes.push_back(PendingPublish {
            seq,
            channel: channel.to_owned(),
            payload,
        });
    }

    /// Appends a deferred cleanup unless one is already pending for `channel`.
    ///
    /// Returns true if an entry was added.
    pub fn push_delete(&mut self, channel: &str) -> bool {
        if self.deletes.iter().any(|d| d.channel == channel) {
            return false;
        }
        let seq = self.bump();
        self.deletes.push_back(PendingDelete {
            seq,
            channel: channel.to_owned(),
        });
        true
    }

    /// Takes the oldest publish older than `watermark` whose channel is idle.
    pub fn pop_ready_publish(
        &mut self,
        active: &ActiveChannels,
        watermark: u64,
    ) -> Option<PendingPublish> {
        let idx = self
            .publishes
            .iter()
            .position(|p| p.seq < watermark && !active.is_active(&p.channel))?;
        self.publishes.remove(idx)
    }

    /// Takes the oldest publish for `channel` older than `watermark`.
    pub fn pop_publish_for(&mut self, channel: &str, watermark: u64) -> Option<PendingPublish> {
        let idx = self
            .publishes
            .iter()
            .position(|p| p.seq < watermark && p.channel == channel)?;
        self.publishes.remove(idx)
    }

    /// Takes every delete older than `watermark` whose channel is idle.
    pub fn take_ready_deletes(&mut self, active: &ActiveChannels, watermark: u64) -> Vec<String> {
        let mut ready = Vec::new();
        self.deletes.retain(|d| {
            if d.seq < watermark && !active.is_active(&d.channel) {
                ready.push(d.channel.clone());
                false
            } else {
                true
            }
        });
        ready
    }

    /// Takes the pending delete for `channel`, if any.
    pub fn take_delete_for(&mut self, channel: &str) -> bool {
        let before = self.deletes.len();
        self.deletes.retain(|d| d.channel != channel);
        before != self.deletes.len()
    }

    /// Number of pending publishes.
    pub fn publish_len(&self) -> usize {
        self.publishes.len()
    }

    /// Number of pending deletes.
    pub fn delete_len(&self) -> usize {
        self.deletes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_publish_skips_active_channels() {
        let mut q = DeferredQueues::default();
        let mut active = ActiveChannels::default();
        q.push_publish("busy", Payload::empty());
        q.push_publish("idle", Payload::empty());
        active.enter("busy");

        let mark = q.watermark();
        let first = q.pop_ready_publish(&active, mark);
        assert_eq!(first.map(|p| p.channel).as_deref(), Some("idle"));
        assert!(q.pop_ready_publish(&active, mark).is_none());
        assert_eq!(q.publish_len(), 1);

        active.leave("busy");
        let next = q.pop_ready_publish(&active, mark);
        assert_eq!(next.map(|p| p.channel).as_deref(), Some("busy"));
    }

    #[test]
    fn test_watermark_excludes_newer_entries() {
        let mut q = DeferredQueues::default();
        let active = ActiveChannels::default();
        q.push_publish("a", Payload::empty());
        let mark = q.watermark();
        q.push_publish("a", Payload::empty());

        assert!(q.pop_publish_for("a", mark).is_some());
        assert!(q.pop_publish_for("a", mark).is_none());
        assert!(q.pop_ready_publish(&active, mark).is_none());
        assert_eq!(q.publish_len(), 1);
    }

    #[test]
    fn test_same_channel_keeps_order() {
        let mut q = DeferredQueues::default();
        let first = Payload::empty();
        q.push_publish("a", first.clone());
        q.push_publish("a", Payload::empty());
        let mark = q.watermark();
        let popped = q.pop_publish_for("a", mark);
        assert!(popped.is_some_and(|p| p.payload.ptr_eq(&first)));
    }

    #[test]
    fn test_deletes_are_deduplicated() {
        let mut q = DeferredQueues::default();
        let mut active = ActiveChannels::default();
        assert!(q.push_delete("a"));
        assert!(!q.push_delete("a"));
        assert!(q.push_delete("b"));
        active.enter("b");

        let mark = q.watermark();
        assert_eq!(q.take_ready_deletes(&active, mark), vec!["a".to_string()]);
        assert_eq!(q.delete_len(), 1);
        assert!(q.take_delete_for("b"));
        assert!(!q.take_delete_for("b"));
    }
}
