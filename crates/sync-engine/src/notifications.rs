// crates/sync-engine/src/notifications.rs
//! Status messages for the user interface
//!
//! An append-only queue of display strings. The orchestrator produces; the
//! UI either polls (`try_next`, `drain`) or awaits (`recv`). There is no
//! backpressure: sending never blocks and never fails from the producer's
//! point of view.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Creates a connected notifier/receiver pair
pub fn channel() -> (Notifier, NotificationReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, NotificationReceiver { rx })
}

/// Producer side
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<String>,
}

impl Notifier {
    /// Pushes a status message; dropped if nobody is listening
    pub fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        if self.tx.send(message).is_err() {
            log::debug!("Notification receiver dropped");
        }
    }
}

/// Consumer side
#[derive(Debug)]
pub struct NotificationReceiver {
    rx: UnboundedReceiver<String>,
}

impl NotificationReceiver {
    /// Next message if one is queued
    pub fn try_next(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// All queued messages, oldest first
    pub fn drain(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Waits for the next message; `None` once every notifier is gone
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
