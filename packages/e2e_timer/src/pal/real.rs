//! Real platform implementation backed by the operating system clock and a random source.

use std::time::Instant;

use rand::{Rng, rng};

use crate::pal::abstractions::Platform;

/// Platform that reads the real monotonic clock and generates random correlation identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RealPlatform;

impl Platform for RealPlatform {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn new_correlation_id(&self) -> String {
        format_correlation_id(rng().random())
    }
}

/// Renders 128 random bits as `8-4-4-4-12` lowercase hex groups.
fn format_correlation_id(value: u128) -> String {
    format!(
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        value >> 96,
        (value >> 80) & 0xFFFF,
        (value >> 64) & 0xFFFF,
        (value >> 48) & 0xFFFF,
        value & 0xFFFF_FFFF_FFFF
    )
}
