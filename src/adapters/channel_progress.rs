//! Progress sink backed by a tokio channel.
//!
//! Lets a consumer on another task (a streaming endpoint, a console printer)
//! receive events without the simulation waiting on it.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::progress::ProgressEvent;
use crate::ports::progress_port::ProgressSink;

#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        ChannelProgress { tx }
    }

    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelProgress { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn send(&self, event: ProgressEvent) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}
