//! Port for handing documents to out-of-request processing.

use crate::domain::{ProcessingJob, SubmitError};

/// Non-blocking handoff into background processing.
///
/// Implementations must return without waiting for the job to run.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessingQueue: Send + Sync {
    /// Enqueue `job`, failing immediately when the queue cannot accept it.
    fn submit(&self, job: ProcessingJob) -> Result<(), SubmitError>;
}
