//! Caller-side connection to an owner thread, shared by all handles of one timer.

use std::time::{Duration, Instant};

use crossbeam::channel::{SendTimeoutError, Sender};

use crate::command::Command;
use crate::pal::{Platform, PlatformFacade};
use crate::{Error, Result};

/// Sends commands to the owner of one span tree and waits for replies.
///
/// The command channel is a rendezvous channel: a send completes only once the owner has
/// taken the command, so every operation blocks until the owner is ready for it.
///
/// When the last link to an owner is dropped, the owner sees its channel disconnect and exits.
#[derive(Debug)]
pub(crate) struct OwnerLink {
    commands: Sender<Command>,
    platform: PlatformFacade,
    reply_timeout: Option<Duration>,
}

impl OwnerLink {
    pub(crate) fn new(
        commands: Sender<Command>,
        platform: PlatformFacade,
        reply_timeout: Option<Duration>,
    ) -> Self {
        Self {
            commands,
            platform,
            reply_timeout,
        }
    }

    /// Captures a caller-side timestamp to embed in a command.
    pub(crate) fn now(&self) -> Instant {
        self.platform.now()
    }

    /// Hands a command that expects no reply to the owner.
    pub(crate) fn send(&self, command: Command) -> Result<()> {
        self.send_before(command, self.deadline())
    }

    /// Hands a command to the owner and waits for its reply.
    ///
    /// The reply timeout, if configured, bounds the send and the wait together.
    pub(crate) fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let deadline = self.deadline();
        let (reply, response) = oneshot::channel();

        self.send_before(command(reply), deadline)?;

        match deadline {
            Some(deadline) => response.recv_deadline(deadline).map_err(|error| match error {
                oneshot::RecvTimeoutError::Timeout => self.timed_out(),
                oneshot::RecvTimeoutError::Disconnected => Error::Terminated,
            }),
            None => response.recv().map_err(|_disconnected| Error::Terminated),
        }
    }

    fn send_before(&self, command: Command, deadline: Option<Instant>) -> Result<()> {
        match deadline {
            Some(deadline) => self
                .commands
                .send_deadline(command, deadline)
                .map_err(|error| match error {
                    SendTimeoutError::Timeout(_) => self.timed_out(),
                    SendTimeoutError::Disconnected(_) => Error::Terminated,
                }),
            None => self
                .commands
                .send(command)
                .map_err(|_disconnected| Error::Terminated),
        }
    }

    // Deadlines are measured on the real clock even when timestamps come from a fake platform.
    fn deadline(&self) -> Option<Instant> {
        self.reply_timeout
            .and_then(|timeout| Instant::now().checked_add(timeout))
    }

    fn timed_out(&self) -> Error {
        Error::TimedOut {
            timeout: self.reply_timeout.unwrap_or_default(),
        }
    }
}
