#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! End-to-end transaction timing, decomposed into contributor and service call spans.
//!
//! A [`Timer`] measures how long a transaction takes and whether it failed. Each logical phase
//! of the transaction is a [`Contributor`], and each outbound call a contributor makes is a
//! [`ServiceCall`]. Errors passed when ending a span are recorded as text, so afterwards you can
//! ask not only "how long" but also "did it fail, and where".
//!
//! # Simple usage
//!
//! ```rust
//! use std::io;
//!
//! use e2e_timer::Timer;
//!
//! # fn main() -> e2e_timer::Result<()> {
//! let timer = Timer::new("checkout");
//!
//! let inventory = timer.start_contributor("inventory")?;
//! let stock = inventory.start_service_call("stock", "http://stock-svc")?;
//! stock.end(Some(&io::Error::other("timeout")))?;
//! inventory.end(None)?;
//!
//! let payment = timer.start_contributor("payment")?;
//! payment.end(None)?;
//!
//! timer.stop(None)?;
//!
//! // The service call failed but the contributor that made it recovered.
//! assert!(timer.is_error_free()?);
//! assert_eq!(stock.error()?.as_deref(), Some("timeout"));
//!
//! println!("{}", timer.snapshot()?);
//! timer.terminate()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Each timer owns a dedicated thread that exclusively holds its span tree. The handles are
//! thin routes to that thread: every operation is a request that the owner applies in the
//! order received, replying where the operation returns a value. Handles are `Send + Sync`,
//! and contributors and service calls are cheaply cloneable, so one transaction can be
//! recorded from many threads at once without locks being visible to callers.
//!
//! Each operation blocks until the owner has accepted it (and answered it, for queries). Use
//! [`TimerBuilder::reply_timeout()`] to bound those waits.
//!
//! # Timestamps
//!
//! Start and end timestamps are captured by the caller when the operation is issued, not by the
//! owner when it is applied. Time spent queueing for the owner is therefore part of the
//! measured span only from the caller's point of view.
//!
//! # Errors
//!
//! Operations return [`Error`] only when the owner cannot be reached: after
//! [`Timer::terminate()`] or when a configured reply timeout elapses. Errors that describe the
//! transaction itself are state, not failures: they are passed into `stop()` or `end()` and read
//! back through `error()` and [`Timer::is_error_free()`].
//!
//! Which span errors clear the error-free flag is controlled by [`ErrorPropagation`]. By default
//! only contributor errors do; a failed service call is visible on the service call alone.
//!
//! # Documents
//!
//! [`Timer::to_document()`] renders the span tree through a [`Render`] implementation,
//! [`JsonRenderer`] by default. A render failure produces [`EMPTY_DOCUMENT`] instead of an
//! error. [`Timer::snapshot()`] returns the same data as a typed [`TimerSnapshot`].

mod command;
mod contributor;
mod error;
mod link;
mod owner;
mod pal;
mod render;
mod service_call;
mod snapshot;
mod timer;
mod tree;

pub use contributor::*;
pub use error::*;
#[cfg(test)]
pub(crate) use render::MockRender;
pub use render::{EMPTY_DOCUMENT, JsonRenderer, Render, RenderError};
pub use service_call::*;
pub use snapshot::*;
pub use timer::{Timer, TimerBuilder};
pub use tree::ErrorPropagation;
