//! Pluggable document processing strategies.
//!
//! The scheduler runs a [`ProcessingStrategy`] per job and records the
//! outcome through the document lifecycle. [`SimulatedProcessor`] stands in
//! for real extraction; [`FixedProcessor`] gives tests a deterministic
//! duration and outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Document, DocumentFilename, DocumentId, ProcessingResult, StoredFileLocation};

mod simulated;

pub use simulated::{SimulatedProcessor, SimulationConfig, SimulationConfigError};

/// Self-contained description of one processing run.
///
/// Jobs carry copies of the fields they need so background execution never
/// shares state with the submitting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingJob {
    /// Document being processed.
    pub document_id: DocumentId,
    /// Original client filename.
    pub filename: DocumentFilename,
    /// Where the upload bytes live.
    pub location: StoredFileLocation,
}

impl From<&Document> for ProcessingJob {
    fn from(document: &Document) -> Self {
        Self {
            document_id: document.id(),
            filename: document.filename().clone(),
            location: document.location().clone(),
        }
    }
}

/// Reasons a processing run produced no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessingFailure {
    /// Injected failure unrelated to the input.
    #[error("simulated processing failure for '{filename}'")]
    Simulated { filename: String },
    /// The stored file disappeared before processing.
    #[error("stored file not found at {location}")]
    MissingFile { location: String },
    /// The file store could not be queried.
    #[error("file storage unavailable: {message}")]
    Storage { message: String },
    /// The strategy produced an unusable result.
    #[error("processing produced an invalid result: {message}")]
    InvalidResult { message: String },
    /// The strategy panicked.
    #[error("processing panicked")]
    Panicked,
}

/// One way of turning a stored document into a result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessingStrategy: Send + Sync {
    /// Run to completion. There is no cancellation or timeout.
    async fn process(&self, job: &ProcessingJob) -> Result<ProcessingResult, ProcessingFailure>;
}

/// Async sleeping abstraction so simulated work can be shortened in tests.
#[async_trait]
pub trait ProcessingSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl ProcessingSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic strategy: waits `delay`, then returns `outcome`.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use backend::domain::FixedProcessor;
///
/// let processor = FixedProcessor::succeeding("done", Duration::ZERO).unwrap();
/// assert_eq!(processor.calls(), 0);
/// ```
#[derive(Debug)]
pub struct FixedProcessor {
    outcome: Result<ProcessingResult, ProcessingFailure>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FixedProcessor {
    /// Always succeed with `text`.
    pub fn succeeding(
        text: impl Into<String>,
        delay: Duration,
    ) -> Result<Self, crate::domain::DocumentValidationError> {
        Ok(Self::new(Ok(ProcessingResult::new(text)?), delay))
    }

    /// Always fail with `failure`.
    pub fn failing(failure: ProcessingFailure, delay: Duration) -> Self {
        Self::new(Err(failure), delay)
    }

    fn new(outcome: Result<ProcessingResult, ProcessingFailure>, delay: Duration) -> Self {
        Self {
            outcome,
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of jobs processed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessingStrategy for FixedProcessor {
    async fn process(&self, _job: &ProcessingJob) -> Result<ProcessingResult, ProcessingFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}
