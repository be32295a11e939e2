use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::{info, warn};

use crate::catalog::{FIRST_EVENT_TS_QUERY, LAST_EVENT_TS_QUERY, UNMATCHED_EVENTS_QUERY};
use crate::pipeline::Session;

/// Calendar parts of an epoch timestamp, as stored in `dim_time`.
///
/// Week is the ISO week and weekday counts from Sunday = 0, matching the
/// warehouse's `EXTRACT(WEEK ...)` and `EXTRACT(DOW ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub hour: u32,
    pub day: u32,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: u32,
}

impl TimeParts {
    /// Decodes epoch milliseconds. Sub-second precision is truncated toward
    /// zero, as the warehouse does with bigint `ts / 1000`.
    pub fn from_epoch_millis(ts: i64) -> Option<Self> {
        let at = DateTime::<Utc>::from_timestamp(ts / 1000, 0)?;
        Some(Self {
            hour: at.hour(),
            day: at.day(),
            week: at.iso_week().week(),
            month: at.month(),
            year: at.year(),
            weekday: at.weekday().num_days_from_sunday(),
        })
    }
}

/// Time range covered by the staged events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventWindow {
    /// The range queries failed; a warning has already been logged.
    #[default]
    Unknown,
    /// The range queries succeeded and `stg_events` has no timestamps.
    Empty,
    Span { first: TimeParts, last: TimeParts },
}

impl EventWindow {
    fn from_bounds(first: Option<i64>, last: Option<i64>) -> Self {
        match (first, last) {
            (None, None) => EventWindow::Empty,
            (Some(first), Some(last)) => {
                match (
                    TimeParts::from_epoch_millis(first),
                    TimeParts::from_epoch_millis(last),
                ) {
                    (Some(first), Some(last)) => EventWindow::Span { first, last },
                    _ => {
                        warn!("Staged event timestamps {first}..{last} are out of range");
                        EventWindow::Unknown
                    }
                }
            }
            _ => EventWindow::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub statements_executed: usize,
    /// Staged events with a song that matched no staged song. `None` when not
    /// requested or the count could not be read.
    pub unmatched_events: Option<i64>,
    pub event_window: EventWindow,
}

/// Outer `None` means the query failed and the failure was logged.
async fn query_or_warn<S: Session>(
    session: &mut S,
    label: &str,
    sql: &str,
) -> Option<Option<i64>> {
    match session.query_i64(sql).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Could not read {label}: {e}");
            None
        }
    }
}

/// Reads the post-load diagnostics. Failures here are logged, never fatal:
/// the load itself has already committed.
pub async fn collect<S: Session>(
    session: &mut S,
    statements_executed: usize,
    report_unmatched: bool,
) -> PipelineReport {
    let unmatched_events = if report_unmatched {
        query_or_warn(session, "unmatched event count", UNMATCHED_EVENTS_QUERY)
            .await
            .flatten()
    } else {
        None
    };
    match unmatched_events {
        Some(0) => info!("Every staged event matched a staged song"),
        Some(n) => {
            warn!("{n} staged events matched no staged song and were left out of songplay")
        }
        None => {}
    }

    let first = query_or_warn(session, "first event ts", FIRST_EVENT_TS_QUERY).await;
    let last = query_or_warn(session, "last event ts", LAST_EVENT_TS_QUERY).await;
    let event_window = match (first, last) {
        (Some(first), Some(last)) => EventWindow::from_bounds(first, last),
        _ => EventWindow::Unknown,
    };

    PipelineReport {
        statements_executed,
        unmatched_events,
        event_window,
    }
}

impl PipelineReport {
    pub fn log(&self) {
        info!("Statements executed: {}", self.statements_executed);
        match self.event_window {
            EventWindow::Span { first, last } => info!(
                "Staged events span {:04}-{:02}-{:02} {:02}h to {:04}-{:02}-{:02} {:02}h UTC",
                first.year,
                first.month,
                first.day,
                first.hour,
                last.year,
                last.month,
                last.day,
                last.hour
            ),
            EventWindow::Empty => info!("No staged events"),
            EventWindow::Unknown => {}
        }
    }
}
