//! Dispatch queues.
//!
//! Three bounded FIFO channels connect the command pipeline: submission
//! (new commands awaiting dispatch), execution (commands handed to an
//! executer), and results (execution outcomes returned to callers). A full
//! queue blocks the producer until space is available; there is no
//! drop-oldest policy. After [`DispatchPipeline::shutdown`], every enqueue
//! fails with [`PipelineError::QueueClosed`] while consumers may still drain
//! residual items.

use crate::command::{Command, CommandOutcome};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

/// Default depth for every dispatch queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// The pipeline was torn down during shutdown; the caller must stop
    /// attempting further queue operations.
    #[error("dispatch queue closed")]
    QueueClosed,
}

/// One bounded FIFO channel of the pipeline.
///
/// The receiver sits behind an async mutex so several executer tasks may
/// compete for items; each item is delivered to exactly one consumer.
pub struct DispatchQueue<T> {
    tx: mpsc::Sender<T>,
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for DispatchQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> DispatchQueue<T> {
    pub fn new(depth: usize) -> Self {
        let (tx, rx) = mpsc::channel(depth.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Stores `item`, waiting while the queue is full.
    ///
    /// Ownership transfers atomically: on `Ok` the item is in the queue, on
    /// `Err` it was never enqueued (it is returned to the caller inside the
    /// channel error and dropped here, completing its lifecycle).
    pub async fn enqueue(&self, item: T) -> Result<(), PipelineError> {
        self.tx
            .send(item)
            .await
            .map_err(|_| PipelineError::QueueClosed)
    }

    /// Removes and returns the oldest item, waiting while the queue is empty.
    pub async fn dequeue(&self) -> Result<T, PipelineError> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(PipelineError::QueueClosed)
    }

    /// Closes the queue: pending and future enqueues fail, already-stored
    /// items remain drainable.
    pub async fn close(&self) {
        self.rx.lock().await.close();
    }

    /// True once the queue has been closed for producers.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The three process-wide dispatch queues, created once at startup and
/// cloned into every task. Replaces the flight heritage's global queue
/// variables with an explicitly passed object.
#[derive(Clone)]
pub struct DispatchPipeline {
    pub submission: DispatchQueue<Command>,
    pub execution: DispatchQueue<Command>,
    pub results: DispatchQueue<CommandOutcome>,
}

impl DispatchPipeline {
    pub fn new(depth: usize) -> Self {
        Self {
            submission: DispatchQueue::new(depth),
            execution: DispatchQueue::new(depth),
            results: DispatchQueue::new(depth),
        }
    }

    /// Fire-and-forget submission: returns once the command is stored, with
    /// no guarantee it has executed yet.
    pub async fn submit(&self, command: Command) -> Result<(), PipelineError> {
        self.submission.enqueue(command).await
    }

    /// Tears down all three queues. Idempotent.
    pub async fn shutdown(&self) {
        self.submission.close().await;
        self.execution.close().await;
        self.results.close().await;
    }
}

impl Default for DispatchPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}
