// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Worker pool draining the work queue into the Service reconciler.

use crate::config::Settings;
use crate::error::{ControllerError, ErrorReporter};
use crate::queue::WorkQueue;
use crate::reconcilers::service::ServiceReconciler;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Marks a key done when the worker leaves its scope, whatever the exit path.
struct InFlight<'a> {
    queue: &'a WorkQueue,
    key: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.queue.done(self.key);
    }
}

pub struct Controller {
    queue: WorkQueue,
    reconciler: ServiceReconciler,
    reporter: Arc<dyn ErrorReporter>,
    settings: Arc<Settings>,
}

impl Controller {
    pub fn new(
        queue: WorkQueue,
        reconciler: ServiceReconciler,
        reporter: Arc<dyn ErrorReporter>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            queue,
            reconciler,
            reporter,
            settings,
        }
    }

    /// Run the worker pool until `shutdown` completes, then drain and wait for
    /// every worker to finish its current key.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let workers = self.settings.workers;
        let controller = Arc::new(self);
        let mut pool = JoinSet::new();

        info!("Starting {} workers", workers);
        for id in 0..workers {
            let controller = controller.clone();
            pool.spawn(async move { controller.worker(id).await });
        }

        shutdown.await;
        info!("Shutting down work queue");
        controller.queue.shut_down();

        while let Some(res) = pool.join_next().await {
            if let Err(e) = res {
                error!("Worker terminated abnormally: {}", e);
            }
        }
        info!("All workers stopped");
    }

    async fn worker(&self, id: usize) {
        debug!(worker = id, "Worker started");
        while self.process_next_item().await {}
        debug!(worker = id, "Worker stopped");
    }

    /// Handle one key. Returns false once the queue is shut down.
    async fn process_next_item(&self) -> bool {
        let Some(key) = self.queue.get().await else {
            return false;
        };
        let _in_flight = InFlight {
            queue: &self.queue,
            key: &key,
        };

        match self.reconciler.reconcile(&key).await {
            Ok(outcome) => {
                debug!(key = %key, ?outcome, "Reconciled");
                self.queue.forget(&key);
            }
            Err(e) => self.handle_error(&key, e),
        }
        true
    }

    /// Requeue with backoff until `max_retries` requeues are spent, then report and drop.
    fn handle_error(&self, key: &str, error: ControllerError) {
        let requeues = self.queue.num_requeues(key);
        if requeues < self.settings.max_retries {
            warn!(
                key = %key,
                attempt = requeues + 1,
                "Reconcile failed, retrying: {}",
                error
            );
            self.queue.add_rate_limited(key);
            return;
        }

        self.reporter.report(key, &error);
        self.queue.forget(key);
    }
}
