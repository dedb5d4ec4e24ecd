//! User-facing notifications

use crossbeam_channel::{Receiver, Sender};
use tracing::{info, warn};

use crate::error::NotifyError;

/// Sink for short user-facing messages
pub trait Notifier: Send + Sync {
    /// Deliver one message
    fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Deliver a message, logging and discarding any failure
pub fn notify_quietly(notifier: &dyn Notifier, message: &str) {
    if let Err(e) = notifier.notify(message) {
        warn!("Notification dropped: {}", e);
    }
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!(target: "zapret::notify", "{}", message);
        Ok(())
    }
}

/// Forwards notifications to a channel drained by the UI thread
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<String>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver it feeds
    pub fn new() -> (Self, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.tx
            .send(message.to_string())
            .map_err(|_| NotifyError::Disconnected)
    }
}
