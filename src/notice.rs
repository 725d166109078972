//! User-visible notifications.
//!
//! The pipeline reports outcomes through [`Notifier`] rather than printing
//! directly, so hosts decide where messages end up. The terminal host uses
//! [`StatusNotifier`], which drives the overwriting watch-status block.

use crate::logger::{status_error, status_success, status_warning};

/// Sink for messages meant for the user.
pub trait Notifier: Send + Sync {
    /// Something failed and the user should know why.
    fn error(&self, message: &str);

    /// Confirmation of a completed action.
    fn info(&self, message: &str);

    /// Non-fatal problem.
    fn warning(&self, message: &str);
}

/// Terminal notifier backed by the global watch status.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusNotifier;

impl Notifier for StatusNotifier {
    fn error(&self, message: &str) {
        match message.split_once(": ") {
            Some((summary, detail)) => status_error(summary, detail),
            None => status_error(message, ""),
        }
    }

    fn info(&self, message: &str) {
        status_success(message);
    }

    fn warning(&self, message: &str) {
        status_warning(message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use parking_lot::Mutex;

    use super::Notifier;

    /// Records every notification for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub errors: Mutex<Vec<String>>,
        pub infos: Mutex<Vec<String>>,
        pub warnings: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn errors(&self) -> Vec<String> {
            self.errors.lock().clone()
        }

        pub fn infos(&self) -> Vec<String> {
            self.infos.lock().clone()
        }

        pub fn warnings(&self) -> Vec<String> {
            self.warnings.lock().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn error(&self, message: &str) {
            self.errors.lock().push(message.to_string());
        }

        fn info(&self, message: &str) {
            self.infos.lock().push(message.to_string());
        }

        fn warning(&self, message: &str) {
            self.warnings.lock().push(message.to_string());
        }
    }
}
