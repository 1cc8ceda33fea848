//! Fixed-size worker pool over a queue of items.
//!
//! A producer task fills a bounded channel sized to the whole input, so it
//! never waits on workers. Each worker pulls one item, processes it fully,
//! and writes the results before pulling the next. A failed item is recorded
//! and skipped; it never stops the run.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::sinks::Sinks;
use crate::transform::{Transformer, WorkerContext};

/// Outcome counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub items: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub recipes_written: usize,
}

impl RunSummary {
    fn merge(&mut self, other: RunSummary) {
        self.items += other.items;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.recipes_written += other.recipes_written;
    }
}

#[derive(Debug)]
pub struct Coordinator<T: Transformer> {
    transformer: Arc<T>,
    sinks: Arc<Sinks>,
}

impl<T: Transformer> Coordinator<T> {
    pub fn new(transformer: T, sinks: Arc<Sinks>) -> Self {
        Self {
            transformer: Arc::new(transformer),
            sinks,
        }
    }

    /// Process every item with `worker_count` workers (at least one) and
    /// wait for all of them to finish.
    pub async fn run(&self, items: Vec<T::Item>, worker_count: usize) -> RunSummary {
        let worker_count = worker_count.max(1);
        let total = items.len();

        tracing::info!(items = total, workers = worker_count, "starting run");

        let (tx, rx) = mpsc::channel(total.max(1));
        let producer = tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        let queue = Arc::new(Mutex::new(rx));
        let mut workers = JoinSet::new();
        for worker in 0..worker_count {
            let transformer = Arc::clone(&self.transformer);
            let sinks = Arc::clone(&self.sinks);
            let queue = Arc::clone(&queue);
            workers.spawn(
                work(worker, transformer, sinks, queue)
                    .instrument(tracing::info_span!("worker", worker)),
            );
        }

        let mut summary = RunSummary::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(partial) => summary.merge(partial),
                Err(e) => tracing::error!(error = %e, "worker task panicked"),
            }
        }

        if let Err(e) = producer.await {
            tracing::error!(error = %e, "producer task failed");
        }

        tracing::info!(
            items = summary.items,
            succeeded = summary.succeeded,
            failed = summary.failed,
            recipes_written = summary.recipes_written,
            "run finished"
        );
        summary
    }
}

async fn work<T: Transformer>(
    worker: usize,
    transformer: Arc<T>,
    sinks: Arc<Sinks>,
    queue: Arc<Mutex<mpsc::Receiver<T::Item>>>,
) -> RunSummary {
    let mut summary = RunSummary::default();

    loop {
        // Guard is dropped before processing so other workers can pull
        let next = queue.lock().await.recv().await;
        let Some(item) = next else {
            break;
        };
        summary.items += 1;

        let name = T::display_name(&item).to_string();
        let source_url = T::source_url(&item).to_string();

        // Own task per item so a panic is recorded against the item
        let task = tokio::spawn({
            let transformer = Arc::clone(&transformer);
            let sinks = Arc::clone(&sinks);
            async move {
                let ctx = WorkerContext {
                    worker,
                    sinks: sinks.as_ref(),
                };
                transformer.process(&item, ctx).await
            }
            .in_current_span()
        });

        match task.await {
            Ok(Ok(recipes)) => {
                let (written, errors) = sinks.write_recipes(&recipes);
                for error in &errors {
                    tracing::error!(worker, recipe = %name, error = %error, "failed to write recipe");
                    sinks.record_write_failure(worker, error);
                }
                summary.recipes_written += written;
                summary.succeeded += 1;
                sinks.record_success(worker, &name, &source_url);
                tracing::debug!(worker, recipe = %name, recipes = written, "item done");
            }
            Ok(Err(e)) => {
                summary.failed += 1;
                tracing::error!(worker, recipe = %name, error = %e, "failed to process item");
                sinks.record_failure(worker, &name, &e);
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(worker, recipe = %name, error = %e, "item task panicked");
                sinks.record_failure(worker, &name, &e);
            }
        }
    }

    summary
}
