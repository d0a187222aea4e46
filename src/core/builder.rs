use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::{
    config::MediatorConfig,
    mediator::{Mediator, Shared},
    sweeper,
};

/// Process-wide counter for automatic instance names.
static MEDIATOR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Builder for constructing a [`Mediator`].
pub struct MediatorBuilder {
    cfg: MediatorConfig,
}

impl MediatorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: MediatorConfig) -> Self {
        Self { cfg }
    }

    /// Sets the instance name used in logs.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.cfg.name = Some(name.into().into_owned());
        self
    }

    /// Sets the background sweep period (`Duration::ZERO` disables the task).
    pub fn sweep_interval(mut self, every: Duration) -> Self {
        self.cfg.sweep_interval = every;
        self
    }

    /// Enables or disables replaying deferred publishes when a channel goes idle.
    pub fn drain_on_release(mut self, enabled: bool) -> Self {
        self.cfg.drain_on_release = enabled;
        self
    }

    /// Builds the mediator.
    ///
    /// The background sweeper is spawned on the current tokio runtime. Without a
    /// runtime the mediator still works; deferred work then only runs through
    /// drain-on-release or explicit [`Mediator::sweep`] calls.
    pub fn build(self) -> Mediator {
        let name = self.cfg.name.clone().unwrap_or_else(|| {
            format!("mediator-{}", MEDIATOR_SEQ.fetch_add(1, Ordering::Relaxed))
        });
        let every = self.cfg.sweep_every();
        let token = CancellationToken::new();
        let shared = Arc::new(Shared::new(name, self.cfg, token.clone()));
        let mediator = Mediator::from_shared(Arc::clone(&shared));

        match (every, Handle::try_current()) {
            (Some(every), Ok(handle)) => {
                sweeper::spawn(&handle, Arc::downgrade(&shared), every, token);
                tracing::info!(
                    mediator = mediator.name(),
                    sweep_every = ?every,
                    "mediator ready"
                );
            }
            (Some(_), Err(_)) => {
                tracing::warn!(
                    mediator = mediator.name(),
                    "no tokio runtime; background sweep disabled"
                );
            }
            (None, _) => {
                tracing::info!(mediator = mediator.name(), "mediator ready without sweeper");
            }
        }
        mediator
    }
}
