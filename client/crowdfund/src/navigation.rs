//! Where the client sends the user next.
//!
//! Logout hands control to the login route and the donation flow hands it to
//! the payment processor. Both go through a [`Navigator`] so the host decides
//! what "navigate" means (open a browser, print a link, record it in a test).

use parking_lot::Mutex;
use tracing::info;

pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Logs every navigation; the CLI prints the target itself.
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, target: &str) {
        info!("Navigate to {target}");
    }
}

/// Remembers every target it was sent to.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visited.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        self.visited.lock().push(target.to_string());
    }
}
