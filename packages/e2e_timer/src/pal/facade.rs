use std::time::Instant;

#[cfg(test)]
use crate::pal::FakePlatform;
use crate::pal::{Platform, RealPlatform};

/// Dispatches to whichever platform a timer was built with.
///
/// Every handle and the owner thread carry a clone, so timestamps captured on the caller side
/// and on the owner side come from the same source.
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    Real(RealPlatform),

    #[cfg(test)]
    Fake(FakePlatform),
}

impl PlatformFacade {
    pub(crate) const fn real() -> Self {
        Self::Real(RealPlatform)
    }

    #[cfg(test)]
    pub(crate) fn fake(platform: FakePlatform) -> Self {
        Self::Fake(platform)
    }
}

impl Platform for PlatformFacade {
    fn now(&self) -> Instant {
        match self {
            Self::Real(platform) => platform.now(),
            #[cfg(test)]
            Self::Fake(platform) => platform.now(),
        }
    }

    fn new_correlation_id(&self) -> String {
        match self {
            Self::Real(platform) => platform.new_correlation_id(),
            #[cfg(test)]
            Self::Fake(platform) => platform.new_correlation_id(),
        }
    }
}
