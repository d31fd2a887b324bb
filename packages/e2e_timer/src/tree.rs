//! The span tree: one timer, its contributors and their service calls.
//!
//! All nodes live in arenas owned by [`SpanTree`]. Children refer to their parents only by id,
//! and ids are minted exclusively by the tree that stores the node, so an id is always valid
//! for the tree it came from.

use std::time::{Duration, Instant};

use crate::{ContributorSnapshot, ServiceCallSnapshot, TimerSnapshot};

/// Decides which span errors clear the timer's error-free flag.
///
/// A timer starts out error-free. Stopping the timer with an error always clears the flag.
/// Beyond that, the policy decides whether errors on nested spans count too.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorPropagation {
    /// Only contributors ending with an error clear the flag. A service call error is recorded
    /// on the service call alone, and reaches the timer only if the contributor that made the
    /// call is itself ended with an error.
    #[default]
    ContributorsOnly,

    /// Contributors and service calls ending with an error both clear the flag.
    AllSpans,
}

/// Identifies a contributor within the tree that minted it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct ContributorId(usize);

/// Identifies a service call within the tree that minted it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct ServiceCallId(usize);

#[derive(Debug)]
pub(crate) struct ContributorNode {
    name: String,
    started_at: Instant,
    duration: Option<Duration>,
    error: Option<String>,
    service_calls: Vec<ServiceCallId>,
}

impl ContributorNode {
    pub(crate) fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug)]
pub(crate) struct ServiceCallNode {
    // Routing only; the contributor does not own the node, the tree does.
    contributor: ContributorId,
    name: String,
    endpoint: String,
    started_at: Instant,
    duration: Option<Duration>,
    error: Option<String>,
}

impl ServiceCallNode {
    pub(crate) fn contributor(&self) -> ContributorId {
        self.contributor
    }

    pub(crate) fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug)]
pub(crate) struct SpanTree {
    name: String,
    correlation_id: String,
    started_at: Instant,
    duration: Option<Duration>,
    error: Option<String>,
    error_free: bool,
    error_propagation: ErrorPropagation,

    contributors: Vec<ContributorNode>,
    service_calls: Vec<ServiceCallNode>,
}

impl SpanTree {
    pub(crate) fn new(
        name: String,
        correlation_id: String,
        started_at: Instant,
        error_propagation: ErrorPropagation,
    ) -> Self {
        Self {
            name,
            correlation_id,
            started_at,
            duration: None,
            error: None,
            error_free: true,
            error_propagation,
            contributors: Vec::new(),
            service_calls: Vec::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub(crate) fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn is_error_free(&self) -> bool {
        self.error_free
    }

    /// Records the end-to-end duration. Stopping again overwrites both duration and error,
    /// but a cleared error-free flag stays cleared.
    pub(crate) fn stop(&mut self, stopped_at: Instant, error: Option<String>) {
        self.duration = Some(stopped_at.saturating_duration_since(self.started_at));

        if error.is_some() {
            self.error_free = false;
        }

        self.error = error;
    }

    pub(crate) fn start_contributor(&mut self, name: String, started_at: Instant) -> ContributorId {
        let id = ContributorId(self.contributors.len());

        self.contributors.push(ContributorNode {
            name,
            started_at,
            duration: None,
            error: None,
            service_calls: Vec::new(),
        });

        id
    }

    /// Ending twice overwrites the duration. An error recorded by an earlier end is only
    /// replaced, never cleared, by a later end.
    pub(crate) fn end_contributor(
        &mut self,
        id: ContributorId,
        ended_at: Instant,
        error: Option<String>,
    ) {
        let contributor = self.contributor_mut(id);
        contributor.duration = Some(ended_at.saturating_duration_since(contributor.started_at));

        if let Some(error) = error {
            contributor.error = Some(error);
            self.error_free = false;
        }
    }

    pub(crate) fn contributor(&self, id: ContributorId) -> &ContributorNode {
        self.contributors
            .get(id.0)
            .expect("contributor ids are only minted by the tree that stores them")
    }

    fn contributor_mut(&mut self, id: ContributorId) -> &mut ContributorNode {
        self.contributors
            .get_mut(id.0)
            .expect("contributor ids are only minted by the tree that stores them")
    }

    pub(crate) fn start_service_call(
        &mut self,
        contributor: ContributorId,
        name: String,
        endpoint: String,
        started_at: Instant,
    ) -> ServiceCallId {
        let id = ServiceCallId(self.service_calls.len());

        self.service_calls.push(ServiceCallNode {
            contributor,
            name,
            endpoint,
            started_at,
            duration: None,
            error: None,
        });

        self.contributor_mut(contributor).service_calls.push(id);

        id
    }

    pub(crate) fn end_service_call(
        &mut self,
        id: ServiceCallId,
        ended_at: Instant,
        error: Option<String>,
    ) {
        let call = self.service_call_mut(id);
        call.duration = Some(ended_at.saturating_duration_since(call.started_at));

        if let Some(error) = error {
            call.error = Some(error);

            if self.error_propagation == ErrorPropagation::AllSpans {
                self.error_free = false;
            }
        }
    }

    pub(crate) fn service_call(&self, id: ServiceCallId) -> &ServiceCallNode {
        self.service_calls
            .get(id.0)
            .expect("service call ids are only minted by the tree that stores them")
    }

    fn service_call_mut(&mut self, id: ServiceCallId) -> &mut ServiceCallNode {
        self.service_calls
            .get_mut(id.0)
            .expect("service call ids are only minted by the tree that stores them")
    }

    pub(crate) fn snapshot(&self) -> TimerSnapshot {
        let contributors = self
            .contributors
            .iter()
            .map(|contributor| {
                let service_calls = contributor
                    .service_calls
                    .iter()
                    .map(|&id| {
                        let call = self.service_call(id);

                        ServiceCallSnapshot::new(
                            call.name.clone(),
                            call.endpoint.clone(),
                            call.duration,
                            call.error.clone(),
                        )
                    })
                    .collect();

                ContributorSnapshot::new(
                    contributor.name.clone(),
                    contributor.duration,
                    contributor.error.clone(),
                    service_calls,
                )
            })
            .collect();

        TimerSnapshot::new(
            self.name.clone(),
            self.correlation_id.clone(),
            self.duration,
            self.error.clone(),
            self.error_free,
            contributors,
        )
    }
}
