//! Bounded background execution for document processing.
//!
//! `submit` pushes a [`ProcessingJob`] onto a bounded channel and returns at
//! once. A dispatcher task pulls jobs off the channel and runs at most
//! `worker_concurrency` of them at a time, each recording its outcome through
//! [`DocumentLifecycle`]. Jobs live only in memory; a process exit drops
//! whatever is queued or running and the affected documents stay in
//! `PROCESSING`.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::domain::ports::ProcessingQueue;
use crate::domain::processing::{ProcessingFailure, ProcessingJob, ProcessingStrategy};
use crate::domain::{DocumentLifecycle, TraceId};

/// Pool and queue sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    worker_concurrency: usize,
    queue_capacity: usize,
}

/// Invalid pool or queue sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerConfigError {
    /// `worker_concurrency` was zero.
    #[error("worker concurrency must be at least 1")]
    ZeroWorkers,
    /// `queue_capacity` was zero.
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
}

impl SchedulerConfig {
    /// Validated pool sizing.
    pub fn new(
        worker_concurrency: usize,
        queue_capacity: usize,
    ) -> Result<Self, SchedulerConfigError> {
        if worker_concurrency == 0 {
            return Err(SchedulerConfigError::ZeroWorkers);
        }
        if queue_capacity == 0 {
            return Err(SchedulerConfigError::ZeroCapacity);
        }
        Ok(Self {
            worker_concurrency,
            queue_capacity,
        })
    }

    /// Jobs allowed to run at once.
    pub fn worker_concurrency(&self) -> usize {
        self.worker_concurrency
    }

    /// Submissions that may wait in the queue.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: 4,
            queue_capacity: 64,
        }
    }
}

/// Why a job was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Every queue slot is taken.
    #[error("processing queue is full")]
    QueueFull,
    /// [`ProcessingScheduler::shutdown`] has been called.
    #[error("processing scheduler has shut down")]
    Closed,
}

struct QueuedJob {
    job: ProcessingJob,
    trace_id: Option<TraceId>,
}

struct JobExecutor {
    lifecycle: DocumentLifecycle,
    strategy: Arc<dyn ProcessingStrategy>,
}

impl JobExecutor {
    async fn run(&self, queued: QueuedJob) {
        let QueuedJob { job, trace_id } = queued;
        match trace_id {
            Some(trace_id) => TraceId::scope(trace_id, self.execute(job)).await,
            None => self.execute(job).await,
        }
    }

    async fn execute(&self, job: ProcessingJob) {
        let document_id = job.document_id;
        debug!(%document_id, "processing job picked up");
        let outcome = AssertUnwindSafe(async { self.strategy.process(&job).await })
            .catch_unwind()
            .await
            .unwrap_or(Err(ProcessingFailure::Panicked));

        let recorded = match outcome {
            Ok(result) => self.lifecycle.complete(document_id, result).await,
            Err(failure) => {
                warn!(%document_id, error = %failure, "document processing failed");
                self.lifecycle.fail(document_id).await
            }
        };
        if let Err(err) = recorded {
            error!(
                %document_id,
                error = %err,
                "failed to record processing outcome"
            );
        }
    }
}

/// Worker pool fed by a bounded queue.
///
/// Must be started from within a Tokio runtime.
pub struct ProcessingScheduler {
    sender: Mutex<Option<mpsc::Sender<QueuedJob>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessingScheduler {
    /// Spawn the dispatcher and return a handle accepting submissions.
    pub fn start(
        lifecycle: DocumentLifecycle,
        strategy: Arc<dyn ProcessingStrategy>,
        config: SchedulerConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let executor = Arc::new(JobExecutor {
            lifecycle,
            strategy,
        });
        let dispatcher = tokio::spawn(dispatch(receiver, executor, config.worker_concurrency));
        info!(
            worker_concurrency = config.worker_concurrency,
            queue_capacity = config.queue_capacity,
            "processing scheduler started"
        );
        Self {
            sender: Mutex::new(Some(sender)),
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Stop accepting jobs and wait for queued and running ones to finish.
    ///
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);
        let dispatcher = match self.dispatcher.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = dispatcher {
            if let Err(err) = handle.await {
                error!(error = %err, "processing dispatcher terminated abnormally");
            }
            info!("processing scheduler drained");
        }
    }
}

impl ProcessingQueue for ProcessingScheduler {
    fn submit(&self, job: ProcessingJob) -> Result<(), SubmitError> {
        let guard = self.sender.lock().map_err(|_| SubmitError::Closed)?;
        let sender = guard.as_ref().ok_or(SubmitError::Closed)?;
        let document_id = job.document_id;
        let queued = QueuedJob {
            job,
            trace_id: TraceId::current(),
        };
        sender.try_send(queued).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                warn!(%document_id, "processing queue full");
                SubmitError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })?;
        debug!(%document_id, "processing job queued");
        Ok(())
    }
}

async fn dispatch(
    mut receiver: mpsc::Receiver<QueuedJob>,
    executor: Arc<JobExecutor>,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut running = JoinSet::new();
    loop {
        // Acquire before receiving so waiting jobs stay counted by the queue.
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let Some(queued) = receiver.recv().await else {
            break;
        };
        while let Some(finished) = running.try_join_next() {
            log_join(finished);
        }
        let executor = executor.clone();
        running.spawn(async move {
            let _permit = permit;
            executor.run(queued).await;
        });
    }
    while let Some(finished) = running.join_next().await {
        log_join(finished);
    }
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        error!(error = %err, "processing task aborted");
    }
}

#[cfg(test)]
#[path = "processing_scheduler_tests.rs"]
mod tests;
