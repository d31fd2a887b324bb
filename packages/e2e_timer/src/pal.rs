//! Platform abstraction layer for the clock and correlation identifier collaborators.
//!
//! Real timers read `std::time::Instant` and draw identifiers from a random source. Tests
//! substitute a fake platform whose clock only moves when told to.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
pub(crate) use real::RealPlatform;
