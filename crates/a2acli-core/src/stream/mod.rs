//! Stream adapter: a background pump from an [`EventStream`] into a
//! bounded channel.
//!
//! The hand-off channel holds a single item, so the producer is never more
//! than one event ahead of the consumer. The pump stops on the first of:
//!
//! - the source ending,
//! - the source yielding an error (forwarded, then nothing more),
//! - the consumer dropping its receiver,
//! - cancellation.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::transport::{EventStream, StreamItem};

/// Capacity of the hand-off between the pump and its consumer.
pub const HANDOFF_CAPACITY: usize = 1;

/// Handle on a running pump.
///
/// Dropping the handle cancels the pump.
#[derive(Debug)]
pub struct EventPump {
    rx: ReceiverStream<StreamItem>,
    cancel: CancellationToken,
}

impl EventPump {
    /// Start pumping `source` on the current runtime.
    pub fn spawn(source: EventStream) -> Self {
        Self::spawn_with_token(source, CancellationToken::new())
    }

    /// Start pumping `source`, stopping when `cancel` fires.
    pub fn spawn_with_token(source: EventStream, cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
        tokio::spawn(pump(source, tx, cancel.clone()));
        Self {
            rx: ReceiverStream::new(rx),
            cancel,
        }
    }

    /// Next item, or `None` once the pump has stopped and the channel is
    /// drained.
    pub async fn recv(&mut self) -> Option<StreamItem> {
        self.rx.next().await
    }

    /// Ask the pump to stop. Items already handed off can still be received.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for EventPump {
    type Item = StreamItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamItem>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn pump(mut source: EventStream, tx: mpsc::Sender<StreamItem>, cancel: CancellationToken) {
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("event pump cancelled");
                return;
            }
            item = source.next() => item,
        };

        let Some(item) = item else {
            debug!("event source exhausted");
            return;
        };
        let is_error = item.is_err();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("event pump cancelled during hand-off");
                return;
            }
            sent = tx.send(item) => {
                if sent.is_err() {
                    debug!("event consumer went away");
                    return;
                }
            }
        }

        if is_error {
            debug!("event source failed, pump stopping");
            return;
        }
    }
}
