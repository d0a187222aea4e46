//! Error types reported by the mediator.
//!
//! The mediator never raises across its public boundary: every [`MediatorError`]
//! is logged through `tracing` at the level returned by [`MediatorError::level`].
//! [`Mediator::try_subscribe`](crate::Mediator::try_subscribe) is the one entry point
//! that also hands the error back to the caller.
//!
//! Helper methods (`as_label`, `as_message`) give stable strings for logs.

use thiserror::Error;
use tracing::Level;

/// # Errors produced by the mediator.
///
/// | Variant          | Kind                 | Logged at |
/// |------------------|----------------------|-----------|
/// | `MissingChannel` | configuration        | error     |
/// | `NotInvocable`   | configuration        | error     |
/// | `MissingTarget`  | missing target       | debug     |
/// | `Unresolved`     | invocation           | error     |
/// | `Deprecated`     | deprecated usage     | warn      |
/// | `SweepPanicked`  | background sweep     | error     |
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediatorError {
    /// Subscribe was called without a channel name.
    #[error("subscribe called without a channel (callback: {callback})")]
    MissingChannel {
        /// Canonical text of the rejected callback.
        callback: String,
    },

    /// The callback could not be resolved to something callable at subscribe time.
    #[error("callback {callback} is not invocable on channel `{channel}`")]
    NotInvocable {
        /// Channel the subscription targeted.
        channel: String,
        /// Canonical text of the rejected callback.
        callback: String,
    },

    /// Unsubscribe referenced a channel with no subscriptions.
    #[error("no subscriptions on channel `{channel}`")]
    MissingTarget {
        /// Channel named by the request.
        channel: String,
    },

    /// A subscription's method disappeared between subscribe and publish.
    #[error("callback {callback} could not be resolved while publishing `{channel}`")]
    Unresolved {
        /// Channel being published.
        channel: String,
        /// Canonical text of the callback.
        callback: String,
    },

    /// A retired option was used; it is ignored.
    #[error("option `{option}` is deprecated and ignored")]
    Deprecated {
        /// Name of the retired option.
        option: &'static str,
    },

    /// A subscriber panicked while the background sweeper replayed a deferred publish.
    #[error("subscriber panicked during sweep: {info}")]
    SweepPanicked {
        /// Panic message, if it was a string.
        info: String,
    },
}

impl MediatorError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use mediator::MediatorError;
    ///
    /// let err = MediatorError::Deprecated { option: "count" };
    /// assert_eq!(err.as_label(), "mediator_deprecated_option");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MediatorError::MissingChannel { .. } => "mediator_missing_channel",
            MediatorError::NotInvocable { .. } => "mediator_not_invocable",
            MediatorError::MissingTarget { .. } => "mediator_missing_target",
            MediatorError::Unresolved { .. } => "mediator_unresolved_callback",
            MediatorError::Deprecated { .. } => "mediator_deprecated_option",
            MediatorError::SweepPanicked { .. } => "mediator_sweep_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            MediatorError::MissingChannel { callback } => {
                format!("missing channel; callback={callback}")
            }
            MediatorError::NotInvocable { channel, callback } => {
                format!("not invocable; channel={channel} callback={callback}")
            }
            MediatorError::MissingTarget { channel } => {
                format!("nothing to unsubscribe; channel={channel}")
            }
            MediatorError::Unresolved { channel, callback } => {
                format!("unresolved; channel={channel} callback={callback}")
            }
            MediatorError::Deprecated { option } => format!("deprecated option: {option}"),
            MediatorError::SweepPanicked { info } => format!("sweep panicked: {info}"),
        }
    }

    /// Log level this error is reported at.
    pub fn level(&self) -> Level {
        match self {
            MediatorError::MissingTarget { .. } => Level::DEBUG,
            MediatorError::Deprecated { .. } => Level::WARN,
            _ => Level::ERROR,
        }
    }

    /// Reports the error through `tracing`, tagged with the mediator name.
    pub(crate) fn report(&self, mediator: &str) {
        let label = self.as_label();
        let level = self.level();
        if level == Level::ERROR {
            tracing::error!(mediator, label, "{}", self.as_message());
        } else if level == Level::WARN {
            tracing::warn!(mediator, label, "{}", self.as_message());
        } else {
            tracing::debug!(mediator, label, "{}", self.as_message());
        }
    }
}
