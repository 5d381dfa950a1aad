//! Bounded multi-consumer work queue.
//!
//! A tokio mpsc channel delivers each item to exactly one receiver; sharing
//! the receiver behind an async mutex lets any number of workers pull from
//! it. Closing is implicit: once the [`WorkSender`] is dropped and the buffer
//! is drained, every [`WorkReceiver::recv`] returns `None`.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

/// Creates a work queue buffering up to `capacity` items (minimum 1).
#[must_use]
pub fn work_queue<T>(capacity: usize) -> (WorkSender<T>, WorkReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        WorkSender { tx },
        WorkReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer side of the work queue.
#[derive(Debug)]
pub struct WorkSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> WorkSender<T> {
    /// Enqueues an item, waiting while the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns the item back if every receiver has been dropped.
    pub async fn send(&self, item: T) -> Result<(), T> {
        self.tx.send(item).await.map_err(|e| e.0)
    }

    /// Closes the queue. Items already buffered are still delivered.
    pub fn close(self) {}
}

/// Consumer side of the work queue, cloned once per worker.
#[derive(Debug)]
pub struct WorkReceiver<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for WorkReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> WorkReceiver<T> {
    /// Takes the next item, or `None` once the queue is closed and empty.
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[tokio::test]
    async fn test_closed_queue_drains_before_returning_none() {
        let (tx, rx) = work_queue(4);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        tx.close();

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_each_item_delivered_to_exactly_one_consumer() {
        let (tx, rx) = work_queue(2);
        let mut consumers = Vec::new();
        for _ in 0..4 {
            let rx = rx.clone();
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(item) = rx.recv().await {
                    seen.push(item);
                }
                seen
            }));
        }
        drop(rx);

        for item in 0..100 {
            tx.send(item).await.unwrap();
        }
        tx.close();

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }
        assert_eq!(all.len(), 100);
        let unique: HashSet<_> = all.into_iter().collect();
        assert_eq!(unique.len(), 100);
    }

    #[tokio::test]
    async fn test_send_fails_when_all_receivers_dropped() {
        let (tx, rx) = work_queue(1);
        drop(rx);
        assert_eq!(tx.send(7).await, Err(7));
    }
}
