use std::error::Error as StdError;
use std::panic;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel;

use crate::command::Command;
use crate::link::OwnerLink;
use crate::owner::Owner;
use crate::pal::{Platform, PlatformFacade};
use crate::tree::SpanTree;
use crate::{Contributor, Error, ErrorPropagation, JsonRenderer, Render, Result, TimerSnapshot};

/// Measures one end-to-end transaction, decomposed into [`Contributor`] spans.
///
/// Creating a timer starts its clock and spawns a dedicated owner thread that holds the span
/// tree. Every operation on the timer, or on any contributor or service call obtained from it,
/// is a request to that thread. Requests are applied one at a time, so handles can be used
/// from any number of threads without further synchronization.
///
/// # Lifetime
///
/// Call [`terminate()`][Self::terminate] when the transaction is fully recorded. This stops the
/// owner thread and waits for it to exit. Afterwards, operations on remaining contributor and
/// service call handles return [`Error::Terminated`][crate::Error::Terminated].
///
/// If the timer is dropped without being terminated, the owner thread keeps running until every
/// contributor and service call handle has been dropped as well, and then exits on its own.
///
/// # Example
///
/// ```rust
/// use e2e_timer::Timer;
///
/// # fn main() -> e2e_timer::Result<()> {
/// let timer = Timer::new("checkout");
///
/// let inventory = timer.start_contributor("inventory")?;
/// let stock = inventory.start_service_call("stock", "http://stock-svc")?;
/// stock.end(None)?;
/// inventory.end(None)?;
///
/// timer.stop(None)?;
/// assert!(timer.is_error_free()?);
///
/// println!("{}", timer.to_document()?);
/// timer.terminate()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Timer {
    name: String,
    correlation_id: String,
    link: Arc<OwnerLink>,
    owner: Option<JoinHandle<()>>,
}

impl Timer {
    /// Starts a new timer with default settings.
    ///
    /// Use [`Timer::builder()`] for custom configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Creates a builder for configuring a timer.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TimerBuilder {
        TimerBuilder::new(name.into())
    }

    /// The name the timer was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The process-unique correlation identifier assigned when the timer was created.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Stops the timer, recording the end-to-end duration.
    ///
    /// If `error` is present, its message is recorded as the timer error and the timer is no
    /// longer error-free. If `error` is absent, any previously recorded timer error is cleared,
    /// but the error-free flag is not restored.
    ///
    /// Stopping again overwrites the recorded duration.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn stop(&self, error: Option<&dyn StdError>) -> Result<()> {
        self.link.send(Command::StopTimer {
            stopped_at: self.link.now(),
            error: error_text(error),
        })
    }

    /// The end-to-end duration, or `None` if the timer has not been stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn duration(&self) -> Result<Option<Duration>> {
        self.link.request(|reply| Command::TimerDuration { reply })
    }

    /// Whether the transaction has been free of errors so far.
    ///
    /// The flag starts out `true` and is cleared, permanently, when the timer is stopped with an
    /// error or when a contributor ends with an error. Whether a service call error also clears
    /// it depends on the [`ErrorPropagation`] policy the timer was built with.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn is_error_free(&self) -> Result<bool> {
        self.link.request(|reply| Command::TimerErrorFree { reply })
    }

    /// The message of the error the timer was stopped with, if any.
    ///
    /// Contributor and service call errors are never reported here.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn error(&self) -> Result<Option<String>> {
        self.link.request(|reply| Command::TimerError { reply })
    }

    /// Starts a new contributor span, timed from the moment of this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn start_contributor(&self, name: impl Into<String>) -> Result<Contributor> {
        let name = name.into();
        let started_at = self.link.now();

        let id = self.link.request(|reply| Command::StartContributor {
            name: name.clone(),
            started_at,
            reply,
        })?;

        Ok(Contributor::new(id, name, Arc::clone(&self.link)))
    }

    /// Returns a copy of the timer and all of its spans.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn snapshot(&self) -> Result<TimerSnapshot> {
        self.link.request(|reply| Command::Snapshot { reply })
    }

    /// Renders the timer and all of its spans with the configured [`Render`] implementation.
    ///
    /// If rendering fails, the result is [`EMPTY_DOCUMENT`][crate::EMPTY_DOCUMENT]; a render
    /// failure is never returned as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn to_document(&self) -> Result<String> {
        self.link.request(|reply| Command::Document { reply })
    }

    /// Stops the owner thread and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached, for example because a reply timeout
    /// elapsed while the owner was busy. The owner thread is not joined after a timeout.
    ///
    /// # Panics
    ///
    /// If the owner thread panicked, the panic is resumed on the calling thread.
    pub fn terminate(mut self) -> Result<()> {
        let sent = self.link.send(Command::Terminate);

        // A panicked owner has already dropped its receiver, so the send reports `Terminated`
        // and the panic is only visible through the join handle.
        if matches!(sent, Ok(()) | Err(Error::Terminated)) {
            if let Some(Err(payload)) = self.owner.take().map(JoinHandle::join) {
                panic::resume_unwind(payload);
            }
        }

        sent
    }
}

/// Builder for configuring a [`Timer`].
#[derive(Debug)]
pub struct TimerBuilder {
    name: String,
    reply_timeout: Option<Duration>,
    renderer: Box<dyn Render>,
    error_propagation: ErrorPropagation,
    platform: PlatformFacade,
}

impl TimerBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            reply_timeout: None,
            renderer: Box::new(JsonRenderer::new()),
            error_propagation: ErrorPropagation::default(),
            platform: PlatformFacade::real(),
        }
    }

    /// Bounds how long any operation on the timer or its spans waits for the owner.
    ///
    /// The timeout covers handing the request to the owner and receiving the reply. An
    /// operation that runs out of time returns [`Error::TimedOut`][crate::Error::TimedOut];
    /// a request the owner already accepted is still applied.
    ///
    /// By default, operations wait indefinitely.
    #[must_use]
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    /// Sets the renderer used by [`Timer::to_document()`].
    ///
    /// Default is a compact [`JsonRenderer`].
    #[must_use]
    pub fn renderer(mut self, renderer: impl Render) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Sets which span errors clear the error-free flag of the timer.
    ///
    /// Default is [`ErrorPropagation::ContributorsOnly`].
    #[must_use]
    pub fn error_propagation(mut self, error_propagation: ErrorPropagation) -> Self {
        self.error_propagation = error_propagation;
        self
    }

    #[cfg(test)]
    pub(crate) fn platform(mut self, platform: PlatformFacade) -> Self {
        self.platform = platform;
        self
    }

    /// Starts the timer and its owner thread.
    #[must_use]
    pub fn build(self) -> Timer {
        let started_at = self.platform.now();
        let correlation_id = self.platform.new_correlation_id();

        let tree = SpanTree::new(
            self.name.clone(),
            correlation_id.clone(),
            started_at,
            self.error_propagation,
        );

        let (commands, receiver) = channel::bounded(0);
        let owner = Owner::new(tree, self.renderer).spawn(receiver);

        Timer {
            name: self.name,
            correlation_id,
            link: Arc::new(OwnerLink::new(commands, self.platform, self.reply_timeout)),
            owner: Some(owner),
        }
    }
}

pub(crate) fn error_text(error: Option<&dyn StdError>) -> Option<String> {
    error.map(ToString::to_string)
}
