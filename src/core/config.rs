//! # Mediator configuration.
//!
//! Provides [`MediatorConfig`] centralized settings for one mediator instance.
//!
//! ## Sentinel values
//! - `sweep_interval = 0s` → no background sweeper (deferred work only runs on
//!   drain-on-release or an explicit `Mediator::sweep`)
//! - `name = None` → an automatic `mediator-<n>` name

use std::time::Duration;

/// Configuration for a [`Mediator`](crate::Mediator).
///
/// ## Field semantics
/// - `name`: label attached to every log line of this instance
/// - `sweep_interval`: period of the background sweep (`0s` = no background task)
/// - `drain_on_release`: replay deferred work for a channel as soon as its last
///   publish pass returns
#[derive(Clone, Debug)]
pub struct MediatorConfig {
    /// Instance name used in logs.
    pub name: Option<String>,

    /// Period of the background sweep over the deferred queues.
    ///
    /// - `Duration::ZERO` = no background task
    /// - `> 0` = a tokio task ticks at this rate while the mediator lives
    pub sweep_interval: Duration,

    /// Replay a channel's deferred publishes when the channel becomes idle.
    ///
    /// With `false` deferred publishes wait for the next sweep tick.
    pub drain_on_release: bool,
}

impl MediatorConfig {
    /// Returns the sweep period as an `Option`.
    ///
    /// - `None` → no background sweeper
    /// - `Some(d)` → tick every `d`
    #[inline]
    pub fn sweep_every(&self) -> Option<Duration> {
        if self.sweep_interval == Duration::ZERO {
            None
        } else {
            Some(self.sweep_interval)
        }
    }
}

impl Default for MediatorConfig {
    /// Default configuration:
    ///
    /// - `name = None` (automatic)
    /// - `sweep_interval = 300ms`
    /// - `drain_on_release = true`
    fn default() -> Self {
        Self {
            name: None,
            sweep_interval: Duration::from_millis(300),
            drain_on_release: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_disables_sweeper() {
        let cfg = MediatorConfig {
            sweep_interval: Duration::ZERO,
            ..MediatorConfig::default()
        };
        assert_eq!(cfg.sweep_every(), None);
    }

    #[test]
    fn test_default_interval() {
        let cfg = MediatorConfig::default();
        assert_eq!(cfg.sweep_every(), Some(Duration::from_millis(300)));
        assert!(cfg.drain_on_release);
    }
}
