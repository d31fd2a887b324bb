use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::command::Command;
use crate::link::OwnerLink;
use crate::timer::error_text;
use crate::tree::ServiceCallId;

/// One outbound call to an external endpoint, made by a [`Contributor`][crate::Contributor].
///
/// Obtained from [`Contributor::start_service_call()`][crate::Contributor::start_service_call].
/// Like the other handles, it is only a route to the owner of the span tree.
#[derive(Clone, Debug)]
pub struct ServiceCall {
    id: ServiceCallId,
    name: String,
    endpoint: String,
    link: Arc<OwnerLink>,
}

impl ServiceCall {
    pub(crate) fn new(
        id: ServiceCallId,
        name: String,
        endpoint: String,
        link: Arc<OwnerLink>,
    ) -> Self {
        Self {
            id,
            name,
            endpoint,
            link,
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

    /// Ends the service call, recording its duration.
    ///
    /// If `error` is present, its message is recorded on the service call. With the default
    /// [`ErrorPropagation::ContributorsOnly`][crate::ErrorPropagation::ContributorsOnly] policy
    /// this does not affect the contributor or the error-free flag of the timer; end the
    /// contributor with an error to report the failure upwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn end(&self, error: Option<&dyn StdError>) -> Result<()> {
        self.link.send(Command::EndServiceCall {
            call: self.id,
            ended_at: self.link.now(),
            error: error_text(error),
        })
    }

    /// The service call duration, or `None` if it has not been ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn duration(&self) -> Result<Option<Duration>> {
        self.link.request(|reply| Command::ServiceCallDuration {
            call: self.id,
            reply,
        })
    }

    /// The message of the error the service call was ended with, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner cannot be reached.
    pub fn error(&self) -> Result<Option<String>> {
        self.link.request(|reply| Command::ServiceCallError {
            call: self.id,
            reply,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;
    use std::io;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::Timer;
    use crate::pal::{FakePlatform, PlatformFacade};

    assert_impl_all!(ServiceCall: Send, Sync, Clone, Debug);

    #[cfg_attr(miri, ignore)]
    #[test]
    fn error_stays_on_service_call() {
        let timer = Timer::new("checkout");
        let contributor = timer.start_contributor("inventory").unwrap();
        let call = contributor
            .start_service_call("stock", "http://stock-svc")
            .unwrap();

        call.end(Some(&io::Error::other("timeout"))).unwrap();
        contributor.end(None).unwrap();

        assert_eq!(call.error().unwrap().as_deref(), Some("timeout"));
        assert_eq!(contributor.error().unwrap(), None);
        assert!(timer.is_error_free().unwrap());

        timer.terminate().unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn duration_measured_from_start_call() {
        let clock = FakePlatform::new();
        let timer = Timer::builder("checkout")
            .platform(PlatformFacade::fake(clock.clone()))
            .build();
        let contributor = timer.start_contributor("inventory").unwrap();

        clock.advance(Duration::from_millis(3));
        let call = contributor.start_service_call("stock", "/stock").unwrap();
        assert_eq!(call.duration().unwrap(), None);

        clock.advance(Duration::from_millis(9));
        call.end(None).unwrap();

        assert_eq!(call.duration().unwrap(), Some(Duration::from_millis(9)));
        assert_eq!(call.name(), "stock");
        assert_eq!(call.endpoint(), "/stock");

        timer.terminate().unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn ending_again_overwrites_duration_and_keeps_error() {
        let clock = FakePlatform::new();
        let timer = Timer::builder("checkout")
            .platform(PlatformFacade::fake(clock.clone()))
            .build();
        let contributor = timer.start_contributor("inventory").unwrap();
        let call = contributor.start_service_call("stock", "/stock").unwrap();

        clock.advance(Duration::from_millis(4));
        call.end(Some(&io::Error::other("first"))).unwrap();
        assert_eq!(call.duration().unwrap(), Some(Duration::from_millis(4)));

        clock.advance(Duration::from_millis(6));
        call.end(None).unwrap();

        assert_eq!(call.duration().unwrap(), Some(Duration::from_millis(10)));
        assert_eq!(call.error().unwrap().as_deref(), Some("first"));

        timer.terminate().unwrap();
    }
}
