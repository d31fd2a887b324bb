//! Owned copies of a span tree, detached from the owner thread.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A point-in-time copy of a timer and all of its spans.
///
/// Obtained from [`Timer::snapshot()`][crate::Timer::snapshot]. The snapshot is plain data: it
/// can be sent to other threads, compared, rendered or serialized without involving the owner
/// thread again.
///
/// When serialized, durations are encoded as integer nanoseconds under `duration_ns` and are
/// `null` while the span is still running.
///
/// The [`Display`][fmt::Display] implementation prints an indented, human-readable tree.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TimerSnapshot {
    name: String,
    correlation_id: String,
    #[serde(rename = "duration_ns", with = "duration_ns")]
    duration: Option<Duration>,
    error: Option<String>,
    error_free: bool,
    contributors: Vec<ContributorSnapshot>,
}

impl TimerSnapshot {
    pub(crate) fn new(
        name: String,
        correlation_id: String,
        duration: Option<Duration>,
        error: Option<String>,
        error_free: bool,
        contributors: Vec<ContributorSnapshot>,
    ) -> Self {
        Self {
            name,
            correlation_id,
            duration,
            error,
            error_free,
            contributors,
        }
    }

    /// The name the timer was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The correlation identifier assigned to the timer when it was created.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// The end-to-end duration, or `None` if the timer had not been stopped yet.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// The error the timer was stopped with, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether no error had been recorded that clears the error-free flag.
    #[must_use]
    pub fn is_error_free(&self) -> bool {
        self.error_free
    }

    /// The contributors, in the order they were started.
    #[must_use]
    pub fn contributors(&self) -> &[ContributorSnapshot] {
        &self.contributors
    }
}

impl fmt::Display for TimerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ", self.name, self.correlation_id)?;
        write_duration(f, self.duration)?;

        if self.error_free {
            write!(f, " error-free")?;
        }
        write_error(f, self.error.as_deref())?;
        writeln!(f)?;

        for contributor in &self.contributors {
            write!(f, "  {} ", contributor.name)?;
            write_duration(f, contributor.duration)?;
            write_error(f, contributor.error.as_deref())?;
            writeln!(f)?;

            for call in &contributor.service_calls {
                write!(f, "    {} -> {} ", call.name, call.endpoint)?;
                write_duration(f, call.duration)?;
                write_error(f, call.error.as_deref())?;
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

fn write_duration(f: &mut fmt::Formatter<'_>, duration: Option<Duration>) -> fmt::Result {
    match duration {
        Some(duration) => write!(f, "{duration:?}"),
        None => write!(f, "(running)"),
    }
}

fn write_error(f: &mut fmt::Formatter<'_>, error: Option<&str>) -> fmt::Result {
    match error {
        Some(error) => write!(f, " error: {error}"),
        None => Ok(()),
    }
}

/// A point-in-time copy of one contributor and its service calls.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ContributorSnapshot {
    name: String,
    #[serde(rename = "duration_ns", with = "duration_ns")]
    duration: Option<Duration>,
    error: Option<String>,
    service_calls: Vec<ServiceCallSnapshot>,
}

impl ContributorSnapshot {
    pub(crate) fn new(
        name: String,
        duration: Option<Duration>,
        error: Option<String>,
        service_calls: Vec<ServiceCallSnapshot>,
    ) -> Self {
        Self {
            name,
            duration,
            error,
            service_calls,
        }
    }

    /// The name the contributor was started with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The contributor duration, or `None` if it had not been ended yet.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// The error the contributor was ended with, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The service calls made by this contributor, in the order they were started.
    #[must_use]
    pub fn service_calls(&self) -> &[ServiceCallSnapshot] {
        &self.service_calls
    }
}

/// A point-in-time copy of one service call.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ServiceCallSnapshot {
    name: String,
    endpoint: String,
    #[serde(rename = "duration_ns", with = "duration_ns")]
    duration: Option<Duration>,
    error: Option<String>,
}

impl ServiceCallSnapshot {
    pub(crate) fn new(
        name: String,
        endpoint: String,
        duration: Option<Duration>,
        error: Option<String>,
    ) -> Self {
        Self {
            name,
            endpoint,
            duration,
            error,
        }
    }

    /// The name the service call was started with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The endpoint the service call targets.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The service call duration, or `None` if it had not been ended yet.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// The error the service call was ended with, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Encodes an optional duration as optional integer nanoseconds.
mod duration_ns {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[expect(clippy::ref_option, reason = "signature is dictated by serde(with)")]
    pub(super) fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Saturates after roughly 584 years.
        value
            .map(|duration| u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
            .serialize(serializer)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_nanos))
    }
}
