//! The request protocol between timer handles and the owner thread.

use std::fmt;
use std::time::{Duration, Instant};

use oneshot::Sender;

use crate::TimerSnapshot;
use crate::tree::{ContributorId, ServiceCallId};

/// One request to the owner of a span tree.
///
/// Variants that expect an answer carry a oneshot sender of the exact reply type, so a handle
/// always receives the type it asked for. Timestamps are captured by the caller when the
/// request is built, not by the owner when it is applied.
pub(crate) enum Command {
    StopTimer {
        stopped_at: Instant,
        error: Option<String>,
    },
    TimerDuration {
        reply: Sender<Option<Duration>>,
    },
    TimerError {
        reply: Sender<Option<String>>,
    },
    TimerErrorFree {
        reply: Sender<bool>,
    },

    StartContributor {
        name: String,
        started_at: Instant,
        reply: Sender<ContributorId>,
    },
    EndContributor {
        contributor: ContributorId,
        ended_at: Instant,
        error: Option<String>,
    },
    ContributorDuration {
        contributor: ContributorId,
        reply: Sender<Option<Duration>>,
    },
    ContributorError {
        contributor: ContributorId,
        reply: Sender<Option<String>>,
    },

    StartServiceCall {
        contributor: ContributorId,
        name: String,
        endpoint: String,
        started_at: Instant,
        reply: Sender<ServiceCallId>,
    },
    EndServiceCall {
        call: ServiceCallId,
        ended_at: Instant,
        error: Option<String>,
    },
    ServiceCallDuration {
        call: ServiceCallId,
        reply: Sender<Option<Duration>>,
    },
    ServiceCallError {
        call: ServiceCallId,
        reply: Sender<Option<String>>,
    },

    Snapshot {
        reply: Sender<TimerSnapshot>,
    },
    Document {
        reply: Sender<String>,
    },

    Terminate,
}

impl Command {
    /// A short, stable name for the operation, used in log events.
    pub(crate) fn operation(&self) -> &'static str {
        match self {
            Self::StopTimer { .. } => "stop_timer",
            Self::TimerDuration { .. } => "timer_duration",
            Self::TimerError { .. } => "timer_error",
            Self::TimerErrorFree { .. } => "timer_error_free",
            Self::StartContributor { .. } => "start_contributor",
            Self::EndContributor { .. } => "end_contributor",
            Self::ContributorDuration { .. } => "contributor_duration",
            Self::ContributorError { .. } => "contributor_error",
            Self::StartServiceCall { .. } => "start_service_call",
            Self::EndServiceCall { .. } => "end_service_call",
            Self::ServiceCallDuration { .. } => "service_call_duration",
            Self::ServiceCallError { .. } => "service_call_error",
            Self::Snapshot { .. } => "snapshot",
            Self::Document { .. } => "document",
            Self::Terminate => "terminate",
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("operation", &self.operation())
            .finish_non_exhaustive()
    }
}
