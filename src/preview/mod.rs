//! Preview session manager.
//!
//! Owns the single live preview surface. The session is created lazily on
//! the first render, reused while open, and dropped once its surface
//! reports closure so the next render creates a fresh one.
//!
//! ```text
//! ensure_open ──▶ display_last_good_or ──▶ reveal
//!     │                    │
//!     │ (closed?)          └─ empty svg → redisplay last good
//!     └─ recreate
//! ```

mod file;
mod shell;
mod surface;

pub use file::FileSurfaceHost;
pub use shell::html_for_svg;
pub use surface::{CloseHook, PreviewSurface, SurfaceHost};

#[cfg(test)]
pub(crate) use surface::testing;

use crate::core::DocUri;
use crate::render::SvgMarkup;

/// Default surface title.
pub const DEFAULT_TITLE: &str = "DBML Graph";

/// Identifies one session instance; a recreated session gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle(u64);

/// The single live visual surface.
struct PreviewSession {
    id: u64,
    surface: Box<dyn PreviewSurface>,
    on_close: CloseHook,
    /// Last successful output shown (possibly empty).
    last_rendered_svg: SvgMarkup,
    current_trigger_source: Option<DocUri>,
}

impl PreviewSession {
    fn is_open(&self) -> bool {
        !self.on_close.is_fired()
    }
}

/// Single point of truth for the shared preview surface.
pub struct SessionManager {
    host: Box<dyn SurfaceHost>,
    title: String,
    session: Option<PreviewSession>,
    next_id: u64,
}

impl SessionManager {
    pub fn new(host: Box<dyn SurfaceHost>, title: impl Into<String>) -> Self {
        Self {
            host,
            title: title.into(),
            session: None,
            next_id: 0,
        }
    }

    /// Return the open session, creating it if none exists or the previous
    /// one was closed. `None` only if the host could not create a surface.
    pub fn ensure_open(&mut self) -> Option<SessionHandle> {
        if let Some(session) = &self.session {
            if session.is_open() {
                return Some(SessionHandle(session.id));
            }
            crate::debug!("preview"; "session {} closed, recreating", session.id);
            self.session = None;
        }

        let on_close = CloseHook::new();
        match self.host.create(&self.title, on_close.clone()) {
            Ok(surface) => {
                let id = self.next_id;
                self.next_id += 1;
                crate::debug!("preview"; "session {} opened", id);
                self.session = Some(PreviewSession {
                    id,
                    surface,
                    on_close,
                    last_rendered_svg: SvgMarkup::empty(),
                    current_trigger_source: None,
                });
                Some(SessionHandle(id))
            }
            Err(e) => {
                crate::log!("preview"; "failed to open preview: {:#}", e);
                None
            }
        }
    }

    /// Show `svg` in the current session and remember it.
    pub fn display(&mut self, svg: SvgMarkup) {
        let title = &self.title;
        let Some(session) = self.session.as_mut().filter(|s| s.is_open()) else {
            return;
        };
        let html = html_for_svg(title, &svg);
        if let Err(e) = session.surface.set_html(&html) {
            crate::log!("preview"; "failed to update preview: {:#}", e);
        }
        session.last_rendered_svg = svg;
    }

    /// Show `svg` if it is non-empty, otherwise redisplay the last good one.
    ///
    /// Once a render has succeeded the preview never regresses to blank.
    pub fn display_last_good_or(&mut self, svg: SvgMarkup) {
        if !svg.is_empty() {
            self.display(svg);
            return;
        }
        let Some(last_good) = self.last_rendered_svg() else {
            return;
        };
        crate::debug!("preview"; "render failed, keeping last good diagram");
        self.display(last_good);
    }

    /// Bring the surface into view without taking focus, unless it already
    /// is visible.
    pub fn reveal(&mut self) {
        let Some(session) = self.open_session_mut() else {
            return;
        };
        if session.surface.is_visible() {
            return;
        }
        if let Err(e) = session.surface.reveal(true) {
            crate::log!("preview"; "failed to reveal preview: {:#}", e);
        }
    }

    /// The surface reported closure: fire its hook and drop the session.
    pub fn on_surface_closed(&mut self) {
        if let Some(session) = self.session.take() {
            session.on_close.fire();
            crate::debug!("preview"; "session {} closed", session.id);
        }
    }

    /// Record which document the displayed diagram comes from.
    pub fn set_trigger_source(&mut self, uri: DocUri) {
        if let Some(session) = self.open_session_mut() {
            session.current_trigger_source = Some(uri);
        }
    }

    pub fn trigger_source(&self) -> Option<&DocUri> {
        self.open_session()?.current_trigger_source.as_ref()
    }

    pub fn last_rendered_svg(&self) -> Option<SvgMarkup> {
        self.open_session().map(|s| s.last_rendered_svg.clone())
    }

    pub fn is_open(&self) -> bool {
        self.open_session().is_some()
    }

    fn open_session(&self) -> Option<&PreviewSession> {
        self.session.as_ref().filter(|s| s.is_open())
    }

    fn open_session_mut(&mut self) -> Option<&mut PreviewSession> {
        self.session.as_mut().filter(|s| s.is_open())
    }
}
