use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chrono::Local;
use clap::Args;

use chatboard_core::report::{parse_datetime, DateRange, Period, RangeError};
use chatboard_core::Settings;
use chatboard_store::Store;

pub mod collect;
pub mod leaderboard;
pub mod team;

/// Reporting window: an explicit pair, or one calendar period back from today.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Start of the window (ISO-8601, local time unless an offset is given)
    #[arg(long, value_name = "DATETIME", requires = "until")]
    pub since: Option<String>,

    /// End of the window, exclusive
    #[arg(long, value_name = "DATETIME", requires = "since")]
    pub until: Option<String>,

    /// Yesterday
    #[arg(long, conflicts_with_all = ["since", "until", "week", "month"])]
    pub day: bool,

    /// Previous Monday-to-Monday week
    #[arg(long, conflicts_with_all = ["since", "until", "day", "month"])]
    pub week: bool,

    /// Previous calendar month
    #[arg(long, conflicts_with_all = ["since", "until", "day", "week"])]
    pub month: bool,
}

impl RangeArgs {
    pub fn resolve(&self) -> Result<DateRange, RangeError> {
        let period = if self.day {
            Some(Period::Day)
        } else if self.week {
            Some(Period::Week)
        } else if self.month {
            Some(Period::Month)
        } else {
            None
        };
        if let Some(period) = period {
            return DateRange::previous(period, &Local::now());
        }

        match (&self.since, &self.until) {
            (Some(since), Some(until)) => {
                DateRange::explicit(parse_datetime(since)?, parse_datetime(until)?)
            }
            _ => Err(RangeError::Missing),
        }
    }
}

/// Settings from `config`, with `--db` taking precedence over `db_path`.
pub fn load_settings(config: &Path, db: Option<PathBuf>) -> Result<Settings> {
    let mut settings = Settings::load(config)?;
    if let Some(db) = db {
        settings.db_path = db;
    }
    Ok(settings)
}

/// Open the database for reporting. Unlike `collect`, reports never create it.
pub async fn open_existing_store(path: &Path) -> Result<Store> {
    if !path.exists() {
        bail!(
            "No database at {}. Run `chatboard collect` first.",
            path.display()
        );
    }
    Store::open(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_args_require_a_choice() {
        assert_eq!(RangeArgs::default().resolve(), Err(RangeError::Missing));
    }

    #[test]
    fn test_explicit_range_args() {
        let args = RangeArgs {
            since: Some("2024-01-01T00:00:00Z".into()),
            until: Some("2024-01-02T00:00:00Z".into()),
            ..RangeArgs::default()
        };
        let range = args.resolve().unwrap();
        assert_eq!(range.since.timestamp(), 1704067200);
        assert_eq!(range.until.timestamp(), 1704153600);

        let backwards = RangeArgs {
            since: args.until.clone(),
            until: args.since.clone(),
            ..RangeArgs::default()
        };
        assert!(matches!(backwards.resolve(), Err(RangeError::Empty { .. })));
    }

    #[test]
    fn test_period_range_args() {
        let args = RangeArgs {
            day: true,
            ..RangeArgs::default()
        };
        let range = args.resolve().unwrap();
        // 23 or 25 across a DST change
        let hours = (range.until - range.since).num_hours();
        assert!((23..=25).contains(&hours));
        assert!(range.until <= chrono::Utc::now());
    }

    #[test]
    fn test_db_flag_overrides_settings() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("chatboard.toml");
        std::fs::write(&config, "db_path = \"history.sqlite\"\n").unwrap();

        let settings = load_settings(&config, None).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("history.sqlite"));

        let settings = load_settings(&config, Some(PathBuf::from("other.sqlite"))).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("other.sqlite"));
    }

    #[tokio::test]
    async fn test_reports_do_not_create_a_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("slack.sqlite");
        assert!(open_existing_store(&path).await.is_err());
        assert!(!path.exists());
    }
}
