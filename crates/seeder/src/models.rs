//! Rows written by the seeder and the plan that groups them.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::config::CompetitionFile;
use crate::errors::SeedError;

/// Competition id used when no data file is given.
pub const DEFAULT_COMPETITION_ID: i64 = 1234;

/// Number of problems in the default competition.
pub const DEFAULT_PROBLEM_COUNT: i64 = 5;

const CANONICAL_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const NAIVE_ISO_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Tables touched by the seeder, in the order they must be cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Submissions,
    Problems,
    Competitions,
}

impl Table {
    /// Delete order that keeps every foreign key satisfied.
    pub const RESET_ORDER: [Table; 3] = [Table::Submissions, Table::Problems, Table::Competitions];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Submissions => "submissions",
            Table::Problems => "problems",
            Table::Competitions => "competitions",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamp in the form the `competitions` table stores:
/// UTC, whole seconds, rendered `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalTimestamp(PrimitiveDateTime);

impl CanonicalTimestamp {
    /// Parses an ISO-8601 string.
    ///
    /// Inputs carrying an offset (`Z`, `+02:00`) are shifted to UTC. Inputs
    /// without one are taken as already canonical. Fractional seconds are
    /// dropped, and a leap second (`23:59:60`) is clamped to `23:59:59`.
    /// A value whose UTC form falls outside the supported date range is a
    /// format error.
    pub fn parse(field: &'static str, value: &str) -> Result<Self, SeedError> {
        let format_err = || SeedError::Format {
            field,
            value: value.to_string(),
        };
        let trimmed = value.trim();

        if let Ok(with_offset) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Self::from_offset(with_offset).ok_or_else(format_err);
        }

        PrimitiveDateTime::parse(trimmed, NAIVE_ISO_FORMAT)
            .or_else(|_| PrimitiveDateTime::parse(trimmed, CANONICAL_FORMAT))
            .map(Self)
            .map_err(|_| format_err())
    }

    /// Converts to UTC and truncates to whole seconds. `None` if the UTC
    /// date is out of range.
    pub fn from_offset(at: OffsetDateTime) -> Option<Self> {
        let utc = at.checked_to_offset(UtcOffset::UTC)?;
        PrimitiveDateTime::new(utc.date(), utc.time())
            .replace_nanosecond(0)
            .ok()
            .map(Self)
    }

    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        let utc = PrimitiveDateTime::new(now.date(), now.time());
        Self(utc.replace_nanosecond(0).unwrap_or(utc))
    }

    pub fn as_datetime(&self) -> PrimitiveDateTime {
        self.0
    }

    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add(duration).map(Self)
    }
}

impl fmt::Display for CanonicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.0.format(CANONICAL_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// A problem's correct answer. The schema stores integers, but a data file
/// may also carry the answer as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Integer(n) => write!(f, "{n}"),
            Answer::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Answer {
    fn from(value: i64) -> Self {
        Answer::Integer(value)
    }
}

/// A row of the `competitions` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Competition {
    pub id: i64,
    pub start_timestamp: CanonicalTimestamp,
    pub end_timestamp: CanonicalTimestamp,
}

/// A row of the `problems` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub id: i64,
    pub competition_id: i64,
    pub number: i64,
    pub correct_answer: Answer,
}

/// One competition and its problems, ready to be written.
///
/// Problems keep the order they were given in; every problem points at the
/// plan's competition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub competition: Competition,
    pub problems: Vec<Problem>,
}

impl SeedPlan {
    /// The built-in competition: starts now, lasts an hour, problems 1 through
    /// 5 whose answer is their own number.
    pub fn default_competition() -> Self {
        let start = CanonicalTimestamp::now();
        let end = start.checked_add(Duration::hours(1)).unwrap_or(start);

        let problems = (1..=DEFAULT_PROBLEM_COUNT)
            .map(|n| Problem {
                id: n,
                competition_id: DEFAULT_COMPETITION_ID,
                number: n,
                correct_answer: Answer::Integer(n),
            })
            .collect();

        Self {
            competition: Competition {
                id: DEFAULT_COMPETITION_ID,
                start_timestamp: start,
                end_timestamp: end,
            },
            problems,
        }
    }

    /// Builds a plan from a parsed data file, canonicalizing its timestamps.
    pub fn from_file(file: &CompetitionFile) -> Result<Self, SeedError> {
        let competition = Competition {
            id: file.id,
            start_timestamp: CanonicalTimestamp::parse("start_timestamp", &file.start_timestamp)?,
            end_timestamp: CanonicalTimestamp::parse("end_timestamp", &file.end_timestamp)?,
        };

        let problems = file
            .problems
            .iter()
            .map(|entry| Problem {
                id: entry.id,
                competition_id: competition.id,
                number: entry.number,
                correct_answer: entry.answer.clone(),
            })
            .collect();

        Ok(Self {
            competition,
            problems,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProblemEntry;

    #[test]
    fn test_utc_timestamp_canonicalizes() {
        let ts = CanonicalTimestamp::parse("start_timestamp", "2024-01-01T10:00:00Z").unwrap();
        assert_eq!(ts.to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_offset_timestamp_shifts_to_utc() {
        let ts = CanonicalTimestamp::parse("start_timestamp", "2024-06-01T09:30:00+02:00").unwrap();
        assert_eq!(ts.to_string(), "2024-06-01 07:30:00");
    }

    #[test]
    fn test_fractional_seconds_are_truncated() {
        let ts = CanonicalTimestamp::parse("end_timestamp", "2024-06-01T10:00:00.987Z").unwrap();
        assert_eq!(ts.to_string(), "2024-06-01 10:00:00");
    }

    #[test]
    fn test_naive_timestamps_are_kept() {
        let iso = CanonicalTimestamp::parse("start_timestamp", "2024-03-05T08:07:06").unwrap();
        let canonical = CanonicalTimestamp::parse("start_timestamp", "2024-03-05 08:07:06").unwrap();
        assert_eq!(iso, canonical);
        assert_eq!(iso.to_string(), "2024-03-05 08:07:06");
    }

    #[test]
    fn test_garbage_timestamp_is_format_error() {
        let err = CanonicalTimestamp::parse("end_timestamp", "next tuesday").unwrap_err();
        match err {
            SeedError::Format { field, value } => {
                assert_eq!(field, "end_timestamp");
                assert_eq!(value, "next tuesday");
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_utc_date_is_format_error() {
        let err = CanonicalTimestamp::parse("end_timestamp", "9999-12-31T23:30:00-01:00").unwrap_err();
        assert!(matches!(
            err,
            SeedError::Format {
                field: "end_timestamp",
                ..
            }
        ));
    }

    #[test]
    fn test_leap_second_is_clamped() {
        let ts = CanonicalTimestamp::parse("end_timestamp", "2016-12-31T23:59:60Z").unwrap();
        assert_eq!(ts.to_string(), "2016-12-31 23:59:59");
    }

    #[test]
    fn test_default_competition() {
        let plan = SeedPlan::default_competition();

        assert_eq!(plan.competition.id, DEFAULT_COMPETITION_ID);
        assert_eq!(
            plan.competition.end_timestamp.as_datetime() - plan.competition.start_timestamp.as_datetime(),
            Duration::hours(1)
        );
        assert_eq!(plan.competition.start_timestamp.as_datetime().nanosecond(), 0);

        let numbers: Vec<i64> = plan.problems.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        for problem in &plan.problems {
            assert_eq!(problem.id, problem.number);
            assert_eq!(problem.correct_answer, Answer::Integer(problem.number));
            assert_eq!(problem.competition_id, DEFAULT_COMPETITION_ID);
        }
    }

    #[test]
    fn test_plan_from_file_keeps_problem_order() {
        let file = CompetitionFile {
            id: 77,
            start_timestamp: "2024-06-01T09:00:00Z".to_string(),
            end_timestamp: "2024-06-01T10:00:00Z".to_string(),
            problems: vec![
                ProblemEntry {
                    id: 30,
                    number: 3,
                    answer: Answer::Integer(9),
                },
                ProblemEntry {
                    id: 10,
                    number: 1,
                    answer: Answer::Text("17".to_string()),
                },
            ],
            database: None,
        };

        let plan = SeedPlan::from_file(&file).unwrap();

        assert_eq!(plan.competition.start_timestamp.to_string(), "2024-06-01 09:00:00");
        assert_eq!(plan.competition.end_timestamp.to_string(), "2024-06-01 10:00:00");
        let ids: Vec<i64> = plan.problems.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![30, 10]);
        assert!(plan.problems.iter().all(|p| p.competition_id == 77));
    }

    #[test]
    fn test_reset_order_clears_dependents_first() {
        assert_eq!(
            Table::RESET_ORDER.map(|t| t.as_str()),
            ["submissions", "problems", "competitions"]
        );
    }
}
