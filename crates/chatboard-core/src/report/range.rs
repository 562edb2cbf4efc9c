//! Report periods and ISO-8601 input parsing.

use chrono::{
    DateTime, Datelike, Days, Local, LocalResult, Months, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use thiserror::Error;

use chatboard_store::TimeRange;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("cannot parse {0:?} as an ISO-8601 date or datetime")]
    Unparseable(String),

    #[error("{0} does not exist in the local timezone")]
    Nonexistent(NaiveDateTime),

    #[error("empty range: {since} is not before {until}")]
    Empty { since: String, until: String },

    #[error("a date range is required: pass --since and --until, or one of --day, --week, --month")]
    Missing,
}

/// Calendar periods relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Yesterday.
    Day,
    /// Monday to Monday of the previous week.
    Week,
    /// The previous calendar month.
    Month,
}

/// Half-open reporting window with a human label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub label: String,
}

impl DateRange {
    pub fn explicit(since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Self, RangeError> {
        if since >= until {
            return Err(RangeError::Empty {
                since: since.to_rfc3339(),
                until: until.to_rfc3339(),
            });
        }
        let label = format!(
            "{} to {}",
            since.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            until.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
        Ok(Self { since, until, label })
    }

    /// The period before the one containing `now`, in `now`'s timezone.
    pub fn previous<Tz: TimeZone>(period: Period, now: &DateTime<Tz>) -> Result<Self, RangeError> {
        let tz = now.timezone();
        let today = now.date_naive();

        let (start, end, label) = match period {
            Period::Day => {
                let start = today - Days::new(1);
                (start, today, start.format("%Y-%m-%d").to_string())
            }
            Period::Week => {
                let monday =
                    today - Days::new(u64::from(today.weekday().num_days_from_monday()));
                let start = monday - Days::new(7);
                let last = monday - Days::new(1);
                let label = format!("{} to {}", start.format("%Y-%m-%d"), last.format("%Y-%m-%d"));
                (start, monday, label)
            }
            Period::Month => {
                let first = today.with_day(1).unwrap_or(today);
                let start = first - Months::new(1);
                (start, first, start.format("%Y-%m").to_string())
            }
        };

        Ok(Self {
            since: local_midnight(&tz, start)?,
            until: local_midnight(&tz, end)?,
            label,
        })
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            since: self.since.timestamp_micros() as f64 / 1_000_000.0,
            until: self.until.timestamp_micros() as f64 / 1_000_000.0,
        }
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<DateTime<Utc>, RangeError> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| RangeError::Unparseable(date.to_string()))?;
    localize(tz, naive)
}

fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Utc>, RangeError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(RangeError::Nonexistent(naive)),
    }
}

/// Parse an ISO-8601 date or datetime. Values without an offset are taken
/// as local time.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, RangeError> {
    parse_datetime_in(input, &Local)
}

pub fn parse_datetime_in<Tz: TimeZone>(
    input: &str,
    tz: &Tz,
) -> Result<DateTime<Utc>, RangeError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    const FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return localize(tz, naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return local_midnight(tz, date);
    }
    Err(RangeError::Unparseable(input.to_string()))
}
