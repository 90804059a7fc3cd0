//! Closable multi-consumer work queue.
//!
//! A single [`QueueProducer`] feeds any number of cloned [`QueueConsumer`]s.
//! Closing the producer lets consumers drain what is buffered and then see
//! `None`; an empty queue that is still open just makes them wait.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

pub struct QueueProducer<T> {
    tx: mpsc::Sender<T>,
}

pub struct QueueConsumer<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for QueueConsumer<T> {
    fn clone(&self) -> Self {
        Self { rx: self.rx.clone() }
    }
}

/// `capacity` is raised to 1; pushes wait while the buffer is full.
pub fn bounded<T>(capacity: usize) -> (QueueProducer<T>, QueueConsumer<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        QueueProducer { tx },
        QueueConsumer {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl<T> QueueProducer<T> {
    /// Fails only once every consumer is gone.
    pub async fn push(&self, item: T) -> anyhow::Result<()> {
        self.tx
            .send(item)
            .await
            .map_err(|_| anyhow::anyhow!("queue has no consumers left"))
    }

    /// No more items will arrive after this.
    pub fn close(self) {
        drop(self);
    }
}

impl<T> QueueConsumer<T> {
    /// Next item, or `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}
