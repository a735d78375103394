//! Background receive queue.
//!
//! A spawned task performs the blocking frame reads and publishes each result
//! on a queue in arrival order. A render loop drains it with
//! [`Inbox::try_next`] once per tick and never stalls; protocol steps that
//! must wait for the reply use [`Inbox::next`].

use serde_json::Value;
use tokio::io::AsyncRead;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::task::JoinHandle;

use crate::transport::{FrameReader, TransportError};

pub struct Inbox {
    queue: UnboundedReceiver<Result<Value, TransportError>>,
    reader: JoinHandle<()>,
    failed: bool,
}

impl Inbox {
    /// Start reading frames from `reader` on a new task.
    pub fn spawn<R>(mut reader: FrameReader<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, queue) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            loop {
                let result = reader.read_value().await;
                let stop = result.is_err();
                if let Err(e) = &result {
                    log::debug!("inbox reader stopping: {}", e);
                }
                if tx.send(result).is_err() || stop {
                    break;
                }
            }
        });
        Self {
            queue,
            reader,
            failed: false,
        }
    }

    /// Next queued message without waiting. `None` means nothing has arrived yet.
    pub fn try_next(&mut self) -> Option<Result<Value, TransportError>> {
        match self.queue.try_recv() {
            Ok(result) => Some(self.note(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.note(Err(TransportError::Disconnected))),
        }
    }

    /// Wait for the next message.
    pub async fn next(&mut self) -> Result<Value, TransportError> {
        match self.queue.recv().await {
            Some(result) => self.note(result),
            None => self.note(Err(TransportError::Disconnected)),
        }
    }

    /// Whether the reader has reported an error; the connection is then dead.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Stop the reader task. Messages already queued stay readable.
    pub fn cancel(&self) {
        self.reader.abort();
    }

    fn note(&mut self, result: Result<Value, TransportError>) -> Result<Value, TransportError> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
