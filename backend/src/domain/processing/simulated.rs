//! Simulated extraction with random duration and failure.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{ProcessingFailure, ProcessingJob, ProcessingSleeper, ProcessingStrategy, TokioSleeper};
use crate::domain::ProcessingResult;
use crate::domain::ports::FileStorage;

/// Invalid simulation parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationConfigError {
    /// `min` is longer than `max`.
    #[error("minimum duration {min:?} exceeds maximum {max:?}")]
    InvertedRange { min: Duration, max: Duration },
    /// Rate outside `[0, 1]`.
    #[error("failure rate {rate} must lie within [0, 1]")]
    FailureRateOutOfRange { rate: f64 },
}

/// Duration range and failure probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    min_duration: Duration,
    max_duration: Duration,
    failure_rate: f64,
}

impl SimulationConfig {
    /// Validated simulation parameters.
    pub fn new(
        min_duration: Duration,
        max_duration: Duration,
        failure_rate: f64,
    ) -> Result<Self, SimulationConfigError> {
        if min_duration > max_duration {
            return Err(SimulationConfigError::InvertedRange {
                min: min_duration,
                max: max_duration,
            });
        }
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(SimulationConfigError::FailureRateOutOfRange { rate: failure_rate });
        }
        Ok(Self {
            min_duration,
            max_duration,
            failure_rate,
        })
    }

    /// Shortest simulated run.
    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    /// Longest simulated run.
    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Probability of a simulated failure.
    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_millis(500),
            max_duration: Duration::from_millis(1500),
            failure_rate: 0.05,
        }
    }
}

struct Draw {
    duration: Duration,
    fails: bool,
    pages: u32,
}

/// Stand-in for OCR and parsing.
///
/// Fails when the stored file is gone, otherwise sleeps for a random
/// duration and fails with the configured probability.
pub struct SimulatedProcessor {
    storage: Arc<dyn FileStorage>,
    config: SimulationConfig,
    sleeper: Arc<dyn ProcessingSleeper>,
    rng: Mutex<SmallRng>,
}

impl SimulatedProcessor {
    /// Build a processor seeded from OS entropy that sleeps on the Tokio timer.
    pub fn new(storage: Arc<dyn FileStorage>, config: SimulationConfig) -> Self {
        Self::with_runtime(
            storage,
            config,
            Arc::new(TokioSleeper),
            SmallRng::from_entropy(),
        )
    }

    /// Build a processor with an injected sleeper and random source.
    pub fn with_runtime(
        storage: Arc<dyn FileStorage>,
        config: SimulationConfig,
        sleeper: Arc<dyn ProcessingSleeper>,
        rng: SmallRng,
    ) -> Self {
        Self {
            storage,
            config,
            sleeper,
            rng: Mutex::new(rng),
        }
    }

    // The guard must not outlive this call; it is never held across await.
    fn draw(&self) -> Draw {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let min_ms = duration_millis(self.config.min_duration);
        let max_ms = duration_millis(self.config.max_duration);
        Draw {
            duration: Duration::from_millis(rng.gen_range(min_ms..=max_ms)),
            fails: rng.gen_bool(self.config.failure_rate),
            pages: rng.gen_range(1..=10),
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl ProcessingStrategy for SimulatedProcessor {
    async fn process(&self, job: &ProcessingJob) -> Result<ProcessingResult, ProcessingFailure> {
        let present = self
            .storage
            .exists(&job.location)
            .await
            .map_err(|err| ProcessingFailure::Storage {
                message: err.to_string(),
            })?;
        if !present {
            return Err(ProcessingFailure::MissingFile {
                location: job.location.to_string(),
            });
        }

        let draw = self.draw();
        debug!(
            document_id = %job.document_id,
            duration_ms = draw.duration.as_millis(),
            "simulating document processing"
        );
        self.sleeper.sleep(draw.duration).await;

        if draw.fails {
            return Err(ProcessingFailure::Simulated {
                filename: job.filename.to_string(),
            });
        }

        let text = format!(
            "Simulated extracted text from '{}'. This document contains {} page(s).",
            job.filename, draw.pages
        );
        ProcessingResult::new(text).map_err(|err| ProcessingFailure::InvalidResult {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{FileStorageError, MockFileStorage};
    use crate::domain::{DocumentFilename, DocumentId, StoredFileLocation};
    use crate::test_support::RecordingSleeper;
    use rstest::rstest;

    fn job() -> ProcessingJob {
        ProcessingJob {
            document_id: DocumentId::random(),
            filename: DocumentFilename::new("report.pdf").expect("valid filename"),
            location: StoredFileLocation::new("abc.pdf").expect("valid location"),
        }
    }

    fn storage_reporting(present: bool) -> Arc<dyn FileStorage> {
        let mut storage = MockFileStorage::new();
        storage.expect_exists().returning(move |_| Ok(present));
        Arc::new(storage)
    }

    fn processor(
        storage: Arc<dyn FileStorage>,
        failure_rate: f64,
        sleeper: Arc<RecordingSleeper>,
    ) -> SimulatedProcessor {
        let config = SimulationConfig::new(
            Duration::from_millis(500),
            Duration::from_millis(1500),
            failure_rate,
        )
        .expect("valid config");
        SimulatedProcessor::with_runtime(storage, config, sleeper, SmallRng::seed_from_u64(7))
    }

    #[rstest]
    #[tokio::test]
    async fn success_describes_filename_and_page_count() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let result = processor(storage_reporting(true), 0.0, sleeper.clone())
            .process(&job())
            .await
            .expect("processing succeeds");

        let text = result.as_ref();
        assert!(text.starts_with("Simulated extracted text from 'report.pdf'. This document contains "));
        assert!(text.ends_with(" page(s)."));
        let pages: u32 = text
            .trim_start_matches("Simulated extracted text from 'report.pdf'. This document contains ")
            .trim_end_matches(" page(s).")
            .parse()
            .expect("page count is numeric");
        assert!((1..=10).contains(&pages));
    }

    #[rstest]
    #[tokio::test]
    async fn sleeps_within_configured_range() {
        let sleeper = Arc::new(RecordingSleeper::default());
        processor(storage_reporting(true), 0.0, sleeper.clone())
            .process(&job())
            .await
            .expect("processing succeeds");

        let recorded = sleeper.0.lock().expect("sleeper mutex").clone();
        assert_eq!(recorded.len(), 1);
        let slept = recorded.first().copied().expect("one sleep");
        assert!(slept >= Duration::from_millis(500) && slept <= Duration::from_millis(1500));
    }

    #[rstest]
    #[tokio::test]
    async fn certain_failure_rate_always_fails() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = processor(storage_reporting(true), 1.0, sleeper)
            .process(&job())
            .await
            .expect_err("processing fails");
        assert_eq!(
            err,
            ProcessingFailure::Simulated {
                filename: "report.pdf".to_owned()
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn missing_file_fails_without_sleeping() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = processor(storage_reporting(false), 0.0, sleeper.clone())
            .process(&job())
            .await
            .expect_err("processing fails");
        assert_eq!(
            err,
            ProcessingFailure::MissingFile {
                location: "abc.pdf".to_owned()
            }
        );
        assert!(sleeper.0.lock().expect("sleeper mutex").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn storage_errors_become_failures() {
        let mut storage = MockFileStorage::new();
        storage
            .expect_exists()
            .returning(|_| Err(FileStorageError::io("disk gone")));
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = processor(Arc::new(storage), 0.0, sleeper)
            .process(&job())
            .await
            .expect_err("processing fails");
        assert!(matches!(err, ProcessingFailure::Storage { .. }));
    }

    #[rstest]
    #[case(Duration::from_secs(2), Duration::from_secs(1), 0.1)]
    #[case(Duration::ZERO, Duration::from_secs(1), -0.1)]
    #[case(Duration::ZERO, Duration::from_secs(1), 1.5)]
    #[case(Duration::ZERO, Duration::from_secs(1), f64::NAN)]
    fn config_rejects_invalid_parameters(
        #[case] min: Duration,
        #[case] max: Duration,
        #[case] rate: f64,
    ) {
        assert!(SimulationConfig::new(min, max, rate).is_err());
    }
}
