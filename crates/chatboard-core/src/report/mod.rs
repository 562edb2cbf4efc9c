//! Reports over collected history.

pub mod leaderboard;
pub mod range;
pub mod sink;
pub mod team;

pub use leaderboard::{leaderboard, Ranking};
pub use range::{parse_datetime, DateRange, Period, RangeError};
pub use sink::{publish_rankings, ConsoleSink, ReportSink};
pub use team::{team_ranking, Roster, TeamSort};
