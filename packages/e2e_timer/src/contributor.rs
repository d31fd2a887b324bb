use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use crate::command::Command;
use crate::link::OwnerLink;
use crate::timer::error_text;
use crate::tree::ContributorId;
use crate::{Result, ServiceCall};

/// A named phase of work within a [`Timer`][crate::Timer].
///
/// Obtained from [`Timer::start_contributor()`][crate::Timer::start_contributor]. The handle is
/// only a route to the owner of the span tree; cloning it yields another route to the same
/// contributor, and clones can be used from different threads.
#[derive(Clone, Debug)]
pub struct Contributor {
    id: ContributorId,
    name: String,
    link: Arc<OwnerLink>,
}

impl Contributor {
    pub(crate) fn new(id: ContributorId, name: String, link: Arc<OwnerLink>) -> Self {
        Self { id, name, link }
    }

    /// The name the contributor was started with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ends the contributor, recording its duration.
    ///
    /// If `error` is present, its message is recorded on the contributor and the timer is no
    /// longer error-free. The error message of the timer itself is not affected.
    ///
    /// Ending again overwrites the recorded duration.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn end(&self, error: Option<&dyn StdError>) -> Result<()> {
        self.link.send(Command::EndContributor {
            contributor: self.id,
            ended_at: self.link.now(),
            error: error_text(error),
        })
    }

    /// The contributor duration, or `None` if it has not been ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn duration(&self) -> Result<Option<Duration>> {
        self.link.request(|reply| Command::ContributorDuration {
            contributor: self.id,
            reply,
        })
    }

    /// The message of the error the contributor was ended with, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn error(&self) -> Result<Option<String>> {
        self.link.request(|reply| Command::ContributorError {
            contributor: self.id,
            reply,
        })
    }

    /// Starts a new service call span under this contributor, timed from the moment of this
    /// call.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn start_service_call(
        &self,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<ServiceCall> {
        let name = name.into();
        let endpoint = endpoint.into();
        let started_at = self.link.now();

        let id = self.link.request(|reply| Command::StartServiceCall {
            contributor: self.id,
            name: name.clone(),
            endpoint: endpoint.clone(),
            started_at,
            reply,
        })?;

        Ok(ServiceCall::new(id, name, endpoint, Arc::clone(&self.link)))
    }
}
