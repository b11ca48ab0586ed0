//! Render/control handoff contract
//!
//! Workers never touch the terminal or the displayed list directly. Every
//! observable effect is sent as a [`UiUpdate`] over an unbounded channel;
//! the control thread drains the channel exclusively, one message at a
//! time, preserving submission order. The rendering layer itself is an
//! external collaborator; this module only defines the messages it
//! consumes.

use crate::package::Package;
use tokio::sync::mpsc;

/// Severity of a transient status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// A discrete effect to apply on the control thread.
#[derive(Debug)]
pub enum UiUpdate {
    /// Replace the rendered list. `total` is the full catalog size,
    /// `filtered` the size after filter/search; `scroll_to_top` is the
    /// caller's choice (forced refreshes keep the cursor in place).
    DisplayList {
        packages: Vec<Package>,
        total: usize,
        filtered: usize,
        scroll_to_top: bool,
    },
    /// Show a transient status message.
    Status { level: StatusLevel, message: String },
    /// Show one package's detail pane.
    Detail(Box<Package>),
    /// Append one line to the operation log.
    LogLine(String),
    /// A refresh cycle finished publishing its snapshot.
    RefreshComplete,
}

/// Sending half of the UI channel, cloned into workers.
pub type UiSink = mpsc::UnboundedSender<UiUpdate>;

/// Receiving half, owned by the control thread.
pub type UiStream = mpsc::UnboundedReceiver<UiUpdate>;

/// Create the UI channel pair.
pub fn channel() -> (UiSink, UiStream) {
    mpsc::unbounded_channel()
}

/// Convenience helpers for the common message shapes.
pub trait UiSinkExt {
    fn status(&self, level: StatusLevel, message: impl Into<String>);
    fn log_line(&self, line: impl Into<String>);
}

impl UiSinkExt for UiSink {
    fn status(&self, level: StatusLevel, message: impl Into<String>) {
        // A closed channel means the UI is gone; nothing left to notify.
        let _ = self.send(UiUpdate::Status {
            level,
            message: message.into(),
        });
    }

    fn log_line(&self, line: impl Into<String>) {
        let _ = self.send(UiUpdate::LogLine(line.into()));
    }
}
