//! services/client/src/adapters/notifier.rs
//!
//! Adapter for the `Notifier` port that hands messages to whichever task
//! renders them for the user.

use rag_client_core::Notifier;
use tokio::sync::mpsc;
use tracing::warn;

/// Forwards user-facing errors over a channel to a UI task.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelNotifier {
    /// Creates the notifier together with the receiving end the UI drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify_error(&self, message: &str) {
        if self.sender.send(message.to_string()).is_err() {
            warn!("Notification dropped, no receiver: {}", message);
        }
    }
}
