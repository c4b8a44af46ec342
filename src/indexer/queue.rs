//! Bounded in-process queue between score persistence and index dispatch.
//!
//! Enqueueing never blocks: when the queue is full the event is dropped and
//! the drop counted, so a slow index channel cannot stall score updates.
//! The queue lives for exactly one aggregation run and is drained before the
//! run reports its result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::indexer::dispatcher::IndexDispatcher;
use crate::indexer::event::IndexEvent;

/// Delivery accounting for one run's dispatch queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DispatchStats {
    /// Failures reported to operators: channel errors plus back-pressure
    /// drops.
    pub fn misses(&self) -> u64 {
        self.failed + self.dropped
    }
}

pub struct DispatchQueue {
    tx: mpsc::Sender<IndexEvent>,
    dropped: Arc<AtomicU64>,
    worker: JoinHandle<(u64, u64)>,
}

impl DispatchQueue {
    /// Starts the background worker draining events into the dispatcher.
    pub fn start(dispatcher: Arc<dyn IndexDispatcher>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<IndexEvent>(capacity);

        let worker = tokio::spawn(async move {
            let mut delivered: u64 = 0;
            let mut failed: u64 = 0;
            while let Some(event) = rx.recv().await {
                match dispatcher.dispatch(&event).await {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(
                            error = %e,
                            dispatcher = dispatcher.name(),
                            destination = event.destination.as_str(),
                            "Index dispatch failed"
                        );
                    }
                }
            }
            (delivered, failed)
        });

        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            worker,
        }
    }

    /// Hands an event to the background worker without waiting.
    pub fn enqueue(&self, event: IndexEvent) {
        if let Err(err) = self.tx.try_send(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            let destination = match &err {
                TrySendError::Full(event) | TrySendError::Closed(event) => {
                    event.destination.as_str()
                }
            };
            tracing::warn!(destination, "Dispatch queue full, index event dropped");
        }
    }

    /// Closes the queue, waits for in-flight dispatches, and returns the
    /// final accounting.
    pub async fn close(self) -> DispatchStats {
        drop(self.tx);
        let dropped = self.dropped.load(Ordering::Relaxed);

        match self.worker.await {
            Ok((delivered, failed)) => DispatchStats {
                delivered,
                failed,
                dropped,
            },
            Err(e) => {
                tracing::error!(error = %e, "Dispatch worker terminated abnormally");
                DispatchStats {
                    delivered: 0,
                    failed: 0,
                    dropped,
                }
            }
        }
    }
}
