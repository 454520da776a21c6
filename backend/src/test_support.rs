//! Shared test doubles for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::processing::ProcessingSleeper;
use crate::domain::{BeginProcessing, Document};

/// Clock whose value only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Fixed, arbitrary starting instant.
    pub fn at_epoch_offset() -> Self {
        let start = match Utc.timestamp_opt(1_700_000_000, 0).single() {
            Some(start) => start,
            None => panic!("valid fixture timestamp"),
        };
        Self::new(start)
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(TimeDelta::seconds(seconds));
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Sleeper that returns at once and remembers every requested duration.
#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

#[async_trait]
impl ProcessingSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut entries = match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        };
        entries.push(duration);
    }
}

impl BeginProcessing {
    /// Document carried by either outcome.
    pub(crate) fn document(&self) -> &Document {
        match self {
            Self::Started(document) | Self::Unchanged(document) => document,
        }
    }

    pub(crate) fn into_document(self) -> Document {
        match self {
            Self::Started(document) | Self::Unchanged(document) => document,
        }
    }

    pub(crate) fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}
