//! Renderer adapter: DBML source in, SVG markup out.
//!
//! The conversion itself is an external black box behind [`Render`].
//! Neither entry point returns an error; failures are folded into
//! [`RenderResult::Failure`]. [`convert`] also tells the user about them,
//! [`try_convert`] leaves that to the caller (the pipeline only reports
//! results it actually shows).

mod command;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::notice::Notifier;

pub use command::CommandRenderer;

/// Prefix of every user-facing render failure.
const FAILURE_PREFIX: &str = "Error generating SVG";

/// Rendered SVG document. May be empty (nothing rendered yet).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvgMarkup(Arc<str>);

impl SvgMarkup {
    pub fn new(svg: impl Into<Arc<str>>) -> Self {
        Self(svg.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SvgMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one conversion. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    Success { svg: SvgMarkup },
    Failure { reason: String },
}

impl RenderResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// SVG on success, empty markup on failure.
    pub fn svg_or_empty(self) -> SvgMarkup {
        match self {
            Self::Success { svg } => svg,
            Self::Failure { .. } => SvgMarkup::empty(),
        }
    }
}

/// Why the external renderer produced no diagram.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Renderer ran and rejected the input (malformed DBML).
    #[error("{0}")]
    Failed(String),

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer output is not valid UTF-8")]
    Encoding,

    #[error("renderer produced no output")]
    EmptyOutput,

    #[error("failed to read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// External DBML-to-SVG conversion.
///
/// Implementations are synchronous and deterministic: the same source
/// always yields the same result, so callers never retry.
pub trait Render: Send + Sync {
    fn render(&self, source: &str) -> Result<SvgMarkup, RenderError>;
}

/// Run the renderer and normalize the outcome.
///
/// Failures are logged, surfaced through `notifier`, and returned as
/// [`RenderResult::Failure`].
pub fn convert(renderer: &dyn Render, source: &str, notifier: &dyn Notifier) -> RenderResult {
    let result = try_convert(renderer, source);
    report(&result, notifier);
    result
}

/// [`convert`] without notifying.
pub fn try_convert(renderer: &dyn Render, source: &str) -> RenderResult {
    match renderer.render(source) {
        Ok(svg) => RenderResult::Success { svg },
        Err(err) => failure(&err.to_string()),
    }
}

/// Build a failure result from an error message.
pub fn failure(message: &str) -> RenderResult {
    let message = message.trim();
    let reason = if message.is_empty() {
        format!("{FAILURE_PREFIX}: Unknown error")
    } else {
        format!("{FAILURE_PREFIX}: {message}")
    };
    crate::debug!("render"; "{}", reason);
    RenderResult::Failure { reason }
}

/// Surface a failed result to the user. Successes are left to the caller.
pub fn report(result: &RenderResult, notifier: &dyn Notifier) {
    if let RenderResult::Failure { reason } = result {
        notifier.error(reason);
    }
}
