//! Console rendering of session notices.

use jobseek_session::notify::{Notice, Notifier};

/// Prints notices: successes to stdout, errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Loading => tracing::debug!("request in flight"),
            Notice::Success(msg) => println!("✓ {msg}"),
            Notice::Error(msg) => eprintln!("✗ {msg}"),
        }
    }
}
