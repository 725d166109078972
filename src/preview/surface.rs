//! Host seam for the visual preview surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

/// Fired by a surface when the user closes it.
///
/// Clones share one flag; firing any clone closes them all.
#[derive(Debug, Clone, Default)]
pub struct CloseHook(Arc<AtomicBool>);

impl CloseHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_fired(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One visual panel able to show an HTML document.
pub trait PreviewSurface: Send {
    /// Replace the displayed document.
    fn set_html(&mut self, html: &str) -> Result<()>;

    /// Whether the surface is currently in view.
    fn is_visible(&self) -> bool;

    /// Bring the surface into view.
    fn reveal(&mut self, preserve_focus: bool) -> Result<()>;
}

/// Creates preview surfaces.
pub trait SurfaceHost: Send {
    /// Create a new surface titled `title`. The surface must fire
    /// `on_close` when it is closed.
    fn create(&mut self, title: &str, on_close: CloseHook) -> Result<Box<dyn PreviewSurface>>;
}
