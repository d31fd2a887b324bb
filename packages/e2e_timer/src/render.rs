//! Rendering of timer snapshots into transport documents.

use std::error::Error as StdError;
use std::fmt::Debug;

use thiserror::Error;

use crate::TimerSnapshot;

/// The document produced when rendering fails.
pub const EMPTY_DOCUMENT: &str = "{}";

/// Renders a [`TimerSnapshot`] into a document string.
///
/// The renderer runs on the owner thread of the timer, so while it runs no other operation on
/// the same timer is serviced.
///
/// A failed render is never reported to the caller of
/// [`Timer::to_document()`][crate::Timer::to_document]; the owner logs the failure and
/// substitutes [`EMPTY_DOCUMENT`].
#[cfg_attr(test, mockall::automock)]
pub trait Render: Debug + Send + 'static {
    /// Renders the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be represented in the target format.
    fn render(&self, snapshot: &TimerSnapshot) -> Result<String, RenderError>;
}

/// Failure to render a snapshot into a document.
#[derive(Debug, Error)]
#[error("failed to render timer snapshot")]
pub struct RenderError {
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl RenderError {
    /// Wraps the underlying cause of a render failure.
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Renders snapshots as JSON via `serde_json`.
///
/// This is the renderer a timer uses unless another one is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    /// Creates a renderer that emits compact single-line JSON.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Creates a renderer that emits indented multi-line JSON.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Render for JsonRenderer {
    fn render(&self, snapshot: &TimerSnapshot) -> Result<String, RenderError> {
        let document = if self.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        };

        document.map_err(RenderError::new)
    }
}
