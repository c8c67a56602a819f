use crate::sequence::vocabulary::{EventId, EventVocabulary};
use crate::source::reader::LogRecord;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window width must be at least one second")]
    TooSmall,

    #[error("window width must be a whole number of seconds, got {0:?}")]
    Fractional(Duration),

    #[error("window width {0:?} is too large")]
    TooLarge(Duration),
}

/// Width of a time window, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowWidth(i64);

impl WindowWidth {
    pub const ONE_MINUTE: WindowWidth = WindowWidth(60);

    pub fn seconds(self) -> i64 {
        self.0
    }

    /// Start of the window containing `local_secs`, both in wall-clock
    /// seconds of the reference offset.
    fn floor(self, local_secs: i64) -> i64 {
        local_secs.div_euclid(self.0) * self.0
    }
}

impl Default for WindowWidth {
    fn default() -> Self {
        Self::ONE_MINUTE
    }
}

impl TryFrom<Duration> for WindowWidth {
    type Error = WindowError;

    fn try_from(width: Duration) -> Result<Self, Self::Error> {
        if width.subsec_nanos() != 0 {
            return if width.as_secs() == 0 {
                Err(WindowError::TooSmall)
            } else {
                Err(WindowError::Fractional(width))
            };
        }
        if width.as_secs() == 0 {
            return Err(WindowError::TooSmall);
        }
        i64::try_from(width.as_secs())
            .map(WindowWidth)
            .map_err(|_| WindowError::TooLarge(width))
    }
}

/// Events of one window, in original log order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub events: Vec<EventId>,
}

impl TimeWindow {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Group a dataset's records into consecutive fixed-width windows.
///
/// Windows cover every bucket from the earliest to the latest record, empty
/// ones included. Boundaries are computed on the wall clock of the first
/// record's offset, so one-minute windows start on whole minutes of the log's
/// local time. Keys missing from `vocabulary` become [`EventId::UNKNOWN`].
pub fn aggregate(
    records: &[LogRecord],
    vocabulary: &EventVocabulary,
    width: WindowWidth,
) -> Vec<TimeWindow> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    let offset = *first.timestamp.offset();
    let offset_secs = i64::from(offset.local_minus_utc());

    let bucket_of = |record: &LogRecord| width.floor(record.timestamp.timestamp() + offset_secs);

    let (min_bucket, max_bucket) = records
        .iter()
        .map(bucket_of)
        .fold((i64::MAX, i64::MIN), |(lo, hi), b| (lo.min(b), hi.max(b)));

    let earliest = records
        .iter()
        .min_by_key(|r| r.timestamp)
        .map(|r| r.timestamp.with_timezone(&offset))
        .unwrap_or_else(|| first.timestamp);
    let first_start = earliest
        - ChronoDuration::seconds(earliest.timestamp() + offset_secs - min_bucket)
        - ChronoDuration::nanoseconds(i64::from(earliest.timestamp_subsec_nanos()));

    let count = ((max_bucket - min_bucket) / width.seconds() + 1) as usize;
    let mut windows: Vec<TimeWindow> = (0..count)
        .map(|i| TimeWindow {
            start: first_start + ChronoDuration::seconds(i as i64 * width.seconds()),
            events: Vec::new(),
        })
        .collect();

    let mut reported = HashSet::new();
    for record in records {
        let id = vocabulary.resolve(&record.template_key);
        if id.is_unknown() && reported.insert(record.template_key.as_str()) {
            warn!(
                line = record.line,
                template = %record.template_key,
                "Template key missing from vocabulary, using unknown event id"
            );
        }

        let idx = ((bucket_of(record) - min_bucket) / width.seconds()) as usize;
        windows[idx].events.push(id);
    }

    windows
}
