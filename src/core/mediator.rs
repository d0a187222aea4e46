//! # Mediator: reentrancy-safe publish/subscribe dispatcher.
//!
//! The [`Mediator`] owns the channel registry, the active-dispatch tracker and the
//! deferred queues, and implements every public operation on top of them.
//!
//! ## High-level architecture
//! ```text
//! publish(channel, payload)
//!   ├─ channel active? ──yes──► publish queue ─────────────┐
//!   ├─ channel empty?  ──yes──► return                      │
//!   ├─ active.enter(channel)                                │
//!   ├─ for i in 0..len (len fixed before the loop)          │
//!   │     ├─ payload[FxChannel] = channel (objects only)    │
//!   │     ├─ skip retired entries                           │
//!   │     └─ resolve + call (lock released)                 │
//!   │           └─ nested publish(other)  → runs inline     │
//!   │           └─ nested publish(same)   → queued ─────────┤
//!   ├─ active.leave(channel)                                │
//!   ├─ cleanup: idle → compact, busy → delete queue         │
//!   └─ drain: replay queued publishes for channel ◄─────────┘
//!
//! Sweeper tick ──► sweep(): replay idle publishes, compact idle deletes
//! ```
//!
//! ## Rules
//! - The state lock is never held while user code runs: subscribers, method
//!   lookups and payload access are all free to call back into the mediator.
//! - A channel's list is visited by at most one pass at a time.
//! - Retired entries are skipped immediately and removed only when the channel
//!   is idle.
//! - A same-channel publish issued during a pass never completes inside the call
//!   that issued it.
//! - Subscriber panics are not caught on the caller's stack; the active marker
//!   is still released while unwinding.
//! - Dispatch is single-flow: `publish` and `sweep` hold a reentrant baton, so a
//!   second thread (the sweeper included) waits for the current flow to return
//!   while nested calls on the dispatching thread still run inline.
//! - Retired subscriptions are dropped after the state lock is released; their
//!   closures and contexts may call back into the mediator from `Drop`.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use tokio_util::sync::CancellationToken;

use crate::core::active::ActiveChannels;
use crate::core::builder::MediatorBuilder;
use crate::core::config::MediatorConfig;
use crate::core::queue::{DeferredQueues, PendingPublish};
use crate::core::registry::{ChannelRegistry, Compacted};
use crate::error::MediatorError;
use crate::events::Payload;
use crate::subscribers::{
    Callback, ChannelListing, ContextRef, SubscribeRequest, Subscription,
};

/// Counts of deferred work completed by one [`Mediator::sweep`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Deferred publishes replayed.
    pub published: usize,
    /// Deferred cleanups performed.
    pub compacted: usize,
}

impl SweepReport {
    /// Returns true if the sweep found nothing to do.
    pub fn is_empty(&self) -> bool {
        self.published == 0 && self.compacted == 0
    }
}

/// Mutable state guarded by one lock.
#[derive(Default)]
struct State {
    registry: ChannelRegistry,
    active: ActiveChannels,
    queues: DeferredQueues,
    draining: HashSet<String>,
}

/// State shared by every handle of one mediator and by its sweeper.
pub(crate) struct Shared {
    name: String,
    cfg: MediatorConfig,
    state: Mutex<State>,
    baton: ReentrantMutex<()>,
    token: CancellationToken,
    disposed: AtomicBool,
}

impl Shared {
    pub(crate) fn new(name: String, cfg: MediatorConfig, token: CancellationToken) -> Self {
        Self {
            name,
            cfg,
            state: Mutex::new(State::default()),
            baton: ReentrantMutex::new(()),
            token,
            disposed: AtomicBool::new(false),
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Marks a channel active for the lifetime of one publish pass.
struct ActivePass<'a> {
    shared: &'a Shared,
    channel: &'a str,
}

impl Drop for ActivePass<'_> {
    fn drop(&mut self) {
        self.shared.state.lock().active.leave(self.channel);
    }
}

/// Marks a channel as being drained so nested releases do not drain it again.
struct Draining<'a> {
    shared: &'a Shared,
    channel: &'a str,
}

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        self.shared.state.lock().draining.remove(self.channel);
    }
}

/// In-process publish/subscribe mediator.
///
/// Cheap to clone: clones are handles to the same instance, which is how
/// subscribers publish from inside their callbacks.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use mediator::{Handler, Mediator, MediatorConfig, Owner, Payload};
/// use serde_json::json;
///
/// let bus = Mediator::with_config(MediatorConfig {
///     sweep_interval: std::time::Duration::ZERO,
///     ..MediatorConfig::default()
/// });
/// let owner = Owner::arc("counter");
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let seen = hits.clone();
/// let on_tick = Handler::new(move |_p: &Payload| {
///     seen.fetch_add(1, Ordering::SeqCst);
/// });
/// bus.subscribe("tick", &on_tick, &owner);
///
/// let payload = Payload::from(json!({ "n": 1 }));
/// bus.publish("tick", payload.clone());
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// assert_eq!(payload.channel().as_deref(), Some("tick"));
///
/// bus.unsubscribe("tick", &on_tick, &owner);
/// bus.publish("tick", None);
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
///
/// bus.dispose();
/// ```
#[derive(Clone)]
pub struct Mediator {
    shared: Arc<Shared>,
}

impl Mediator {
    /// Creates a mediator with the default configuration.
    ///
    /// The background sweeper is spawned on the current tokio runtime, if any.
    pub fn new() -> Self {
        Self::builder(MediatorConfig::default()).build()
    }

    /// Creates a mediator with the given configuration.
    pub fn with_config(cfg: MediatorConfig) -> Self {
        Self::builder(cfg).build()
    }

    /// Returns a builder seeded with `cfg`.
    pub fn builder(cfg: MediatorConfig) -> MediatorBuilder {
        MediatorBuilder::new(cfg)
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub(crate) fn from_weak(shared: &Weak<Shared>) -> Option<Self> {
        shared.upgrade().map(Self::from_shared)
    }

    /// Instance name used in logs.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Configuration this instance was built with.
    pub fn config(&self) -> &MediatorConfig {
        &self.shared.cfg
    }

    // ---------------------------
    // Subscribe / unsubscribe
    // ---------------------------

    /// Registers `callback` on `channel` on behalf of `context`.
    ///
    /// Failures are logged and nothing is registered. Subscribing the same pair
    /// twice yields two independent entries.
    pub fn subscribe(&self, channel: &str, callback: impl Into<Callback>, context: &ContextRef) {
        let context = Arc::clone(context);
        if let Err(err) = self.register(channel, callback.into(), context, None) {
            err.report(self.name());
        }
    }

    /// Registers a full [`SubscribeRequest`], logging any failure.
    pub fn subscribe_with(&self, request: SubscribeRequest) {
        if let Err(err) = self.try_subscribe(request) {
            err.report(self.name());
        }
    }

    /// Registers a full [`SubscribeRequest`], returning the failure to the caller.
    ///
    /// # Errors
    /// - [`MediatorError::MissingChannel`] if the channel name is empty
    /// - [`MediatorError::NotInvocable`] if a method callback cannot be resolved on
    ///   the context
    pub fn try_subscribe(&self, request: SubscribeRequest) -> Result<(), MediatorError> {
        let SubscribeRequest {
            channel,
            callback,
            context,
            count,
        } = request;
        self.register(&channel, callback, context, count)
    }

    fn register(
        &self,
        channel: &str,
        callback: Callback,
        context: ContextRef,
        count: Option<u32>,
    ) -> Result<(), MediatorError> {
        if channel.is_empty() {
            return Err(MediatorError::MissingChannel {
                callback: callback.to_string(),
            });
        }
        if callback.resolve(&context).is_none() {
            return Err(MediatorError::NotInvocable {
                channel: channel.to_owned(),
                callback: callback.to_string(),
            });
        }
        if count.is_some() {
            MediatorError::Deprecated { option: "count" }.report(self.name());
        }

        tracing::debug!(
            mediator = self.name(),
            channel,
            owner = context.name(),
            callback = %callback,
            "subscribed"
        );
        let sub = Arc::new(Subscription::new(context, callback));
        self.shared.state.lock().registry.push(channel, sub);
        Ok(())
    }

    /// Retires every subscription on `channel` owned by `context` whose callback
    /// matches `callback`.
    ///
    /// Entries are flagged, not removed: a pass in progress skips them from now on,
    /// and storage is reclaimed once the channel is idle.
    pub fn unsubscribe(&self, channel: &str, callback: impl Into<Callback>, context: &ContextRef) {
        let callback = callback.into();
        let marked = {
            let mut st = self.shared.state.lock();
            if channel.is_empty() || st.registry.len(channel) == 0 {
                None
            } else {
                let marked = st.registry.mark(channel, context, &callback);
                if marked > 0 {
                    st.queues.push_delete(channel);
                }
                Some(marked)
            }
        };

        match marked {
            None => MediatorError::MissingTarget {
                channel: channel.to_owned(),
            }
            .report(self.name()),
            Some(marked) => tracing::debug!(
                mediator = self.name(),
                channel,
                callback = %callback,
                marked,
                "unsubscribed"
            ),
        }
    }

    /// Retires every subscription owned by `context`, on every channel.
    pub fn remove_context(&self, context: &ContextRef) {
        let touched = {
            let mut st = self.shared.state.lock();
            let touched = st.registry.mark_context(context);
            for channel in &touched {
                st.queues.push_delete(channel);
            }
            touched
        };
        tracing::debug!(
            mediator = self.name(),
            owner = context.name(),
            channels = ?touched,
            "context removed"
        );
    }

    // ---------------------------
    // Publish
    // ---------------------------

    /// Publishes `payload` (an empty object if `None`) to every live subscriber of
    /// `channel`, in subscription order.
    ///
    /// If `channel` is already being published further up the call stack, the
    /// publish is queued and runs once that pass has finished.
    pub fn publish(&self, channel: &str, payload: impl Into<Option<Payload>>) {
        let payload = payload.into().unwrap_or_default();
        let _flow = self.shared.baton.lock();
        self.dispatch(channel, payload);
    }

    fn dispatch(&self, channel: &str, payload: Payload) {
        if channel.is_empty() {
            return;
        }

        let len = {
            let mut st = self.shared.state.lock();
            if st.active.is_active(channel) {
                st.queues.push_publish(channel, payload);
                drop(st);
                tracing::debug!(
                    mediator = self.name(),
                    channel,
                    "channel busy; publish deferred"
                );
                return;
            }
            let len = st.registry.len(channel);
            if len == 0 {
                return;
            }
            st.active.enter(channel);
            len
        };

        {
            let _pass = ActivePass {
                shared: &self.shared,
                channel,
            };
            for index in 0..len {
                let Some(sub) = self.entry(channel, index) else {
                    break;
                };
                payload.stamp_channel(channel);
                if sub.is_unsubscribed() {
                    continue;
                }
                match sub.resolve() {
                    Some(handler) => handler.call(&payload),
                    None => MediatorError::Unresolved {
                        channel: channel.to_owned(),
                        callback: sub.callback().to_string(),
                    }
                    .report(self.name()),
                }
            }
        }

        self.release(channel);
    }

    fn entry(&self, channel: &str, index: usize) -> Option<Arc<Subscription>> {
        self.shared.state.lock().registry.get(channel, index)
    }

    /// Runs after a pass: cleanup now or later, then replay deferred publishes.
    fn release(&self, channel: &str) {
        let compacted = {
            let mut st = self.shared.state.lock();
            if st.active.is_active(channel) {
                st.queues.push_delete(channel);
                None
            } else {
                Some(st.registry.compact(channel))
            }
        };
        self.log_compaction(channel, compacted);

        if self.shared.cfg.drain_on_release {
            self.drain(channel);
        }
    }

    /// Replays publishes queued for `channel` before the drain started.
    fn drain(&self, channel: &str) {
        let watermark = {
            let mut st = self.shared.state.lock();
            if st.active.is_active(channel) || !st.draining.insert(channel.to_owned()) {
                return;
            }
            st.queues.watermark()
        };
        let _draining = Draining {
            shared: &self.shared,
            channel,
        };

        let mut replayed = 0usize;
        while let Some(entry) = self.next_queued(channel, watermark) {
            self.dispatch(&entry.channel, entry.payload);
            replayed += 1;
        }

        let compacted = {
            let mut st = self.shared.state.lock();
            if !st.active.is_active(channel) && st.queues.take_delete_for(channel) {
                Some(st.registry.compact(channel))
            } else {
                None
            }
        };
        if compacted.is_some() {
            self.log_compaction(channel, compacted);
        }

        if replayed > 0 {
            tracing::debug!(
                mediator = self.name(),
                channel,
                replayed,
                "drained deferred publishes"
            );
        }
    }

    fn next_queued(&self, channel: &str, watermark: u64) -> Option<PendingPublish> {
        let mut st = self.shared.state.lock();
        if st.active.is_active(channel) {
            return None;
        }
        st.queues.pop_publish_for(channel, watermark)
    }

    /// Logs a cleanup result and drops the retired entries it carries.
    ///
    /// Must be called without the state lock held.
    fn log_compaction(&self, channel: &str, compacted: Option<Compacted>) {
        match compacted {
            Some(done @ Compacted::Dropped { .. }) => tracing::debug!(
                mediator = self.name(),
                channel,
                removed = done.removed(),
                "channel emptied and removed"
            ),
            Some(done @ Compacted::Kept { .. }) if done.removed() > 0 => tracing::debug!(
                mediator = self.name(),
                channel,
                removed = done.removed(),
                "retired subscriptions removed"
            ),
            None => tracing::debug!(
                mediator = self.name(),
                channel,
                "channel busy; cleanup deferred"
            ),
            _ => {}
        }
    }

    // ---------------------------
    // Sweep
    // ---------------------------

    /// Replays deferred work whose channel is idle.
    ///
    /// Publishes queued before the call are replayed in order (per channel), then
    /// pending cleanups are performed. Work for channels that are still active, and
    /// work queued by the replay itself, stays queued.
    pub fn sweep(&self) -> SweepReport {
        let _flow = self.shared.baton.lock();
        let watermark = self.shared.state.lock().queues.watermark();
        let mut report = SweepReport::default();

        loop {
            let next = {
                let mut guard = self.shared.state.lock();
                let st = &mut *guard;
                st.queues.pop_ready_publish(&st.active, watermark)
            };
            let Some(entry) = next else {
                break;
            };
            self.dispatch(&entry.channel, entry.payload);
            report.published += 1;
        }

        let retired: Vec<Compacted> = {
            let mut guard = self.shared.state.lock();
            let st = &mut *guard;
            st.queues
                .take_ready_deletes(&st.active, watermark)
                .into_iter()
                .map(|channel| st.registry.compact(&channel))
                .collect()
        };
        report.compacted = retired.len();
        drop(retired);
        report
    }

    // ---------------------------
    // Introspection / lifecycle
    // ---------------------------

    /// Snapshot of every channel and its subscriptions, retired entries included.
    pub fn channel_listing(&self) -> Vec<ChannelListing> {
        self.shared.state.lock().registry.listing()
    }

    /// Sorted names of channels with a publish pass in progress.
    pub fn active_channels(&self) -> Vec<String> {
        self.shared.state.lock().active.snapshot()
    }

    /// Number of deferred publishes waiting for their channel.
    pub fn pending_publishes(&self) -> usize {
        self.shared.state.lock().queues.publish_len()
    }

    /// Number of deferred cleanups waiting for their channel.
    pub fn pending_deletes(&self) -> usize {
        self.shared.state.lock().queues.delete_len()
    }

    /// Stops the background sweeper and drops every subscription and queued entry.
    ///
    /// Subscriber closures often hold a clone of the mediator; disposing is what
    /// breaks that cycle. Calling it twice is harmless.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.token.cancel();

        // Dropped outside the lock: subscriber closures may run arbitrary drop code.
        let (registry, queues) = {
            let mut st = self.shared.state.lock();
            (
                std::mem::take(&mut st.registry),
                std::mem::take(&mut st.queues),
            )
        };
        let had_channels = !registry.is_empty();
        drop(registry);
        drop(queues);

        tracing::info!(mediator = self.name(), had_channels, "mediator disposed");
    }

    /// Returns true once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("name", &self.shared.name)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "mediator_tests.rs"]
mod tests;
