//! Writes a [`SeedPlan`] to storage as one unit of work.

use tracing::{debug, info, warn};

use super::backend::{Backend, Session};
use crate::config::ConnectionConfig;
use crate::errors::SeedError;
use crate::models::{SeedPlan, Table};

/// Rows removed by the reset step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedRows {
    pub submissions: u64,
    pub problems: u64,
    pub competitions: u64,
}

impl ClearedRows {
    fn set(&mut self, table: Table, count: u64) {
        match table {
            Table::Submissions => self.submissions = count,
            Table::Problems => self.problems = count,
            Table::Competitions => self.competitions = count,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub competition_id: i64,
    /// `None` when the reset step was skipped.
    pub cleared: Option<ClearedRows>,
    pub problems_inserted: usize,
}

/// Seeds a competition through any [`Backend`].
pub struct Seeder<B> {
    backend: B,
    reset: bool,
}

impl<B: Backend> Seeder<B> {
    /// Creates a seeder that clears existing competition data before inserting.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            reset: true,
        }
    }

    /// Whether to delete existing submissions, problems and competitions first.
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Connects, optionally resets, inserts the plan and commits.
    ///
    /// On any failure after connecting the open work is rolled back. The
    /// connection is closed on every path.
    pub async fn run(
        &self,
        plan: &SeedPlan,
        connection: &ConnectionConfig,
    ) -> Result<SeedReport, SeedError> {
        let mut session = self.backend.connect(connection).await?;

        let outcome = match self.write(&mut session, plan).await {
            Ok(report) => session.commit().await.map(|_| report),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(report) => {
                info!("Committed competition {}", report.competition_id);
                if let Err(e) = session.close().await {
                    warn!("Failed to close connection after commit: {e}");
                }
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback_err) = session.rollback().await {
                    warn!("Rollback failed: {rollback_err}");
                }
                if let Err(close_err) = session.close().await {
                    warn!("Failed to close connection: {close_err}");
                }
                Err(e)
            }
        }
    }

    async fn write(
        &self,
        session: &mut B::Session,
        plan: &SeedPlan,
    ) -> Result<SeedReport, SeedError> {
        let cleared = if self.reset {
            Some(reset(session).await?)
        } else {
            None
        };

        let competition = &plan.competition;
        session.insert_competition(competition).await?;
        info!(
            "Inserted competition {} ({} to {})",
            competition.id, competition.start_timestamp, competition.end_timestamp
        );

        for problem in &plan.problems {
            session.insert_problem(problem).await?;
            debug!(
                "  Problem {} (#{}) answer {}",
                problem.id, problem.number, problem.correct_answer
            );
        }
        info!("Inserted {} problems", plan.problems.len());

        Ok(SeedReport {
            competition_id: competition.id,
            cleared,
            problems_inserted: plan.problems.len(),
        })
    }
}

/// Deletes all competition data, dependents first.
pub async fn reset<S: Session>(session: &mut S) -> Result<ClearedRows, SeedError> {
    let mut cleared = ClearedRows::default();
    for table in Table::RESET_ORDER {
        let count = session.delete_all(table).await?;
        info!("Cleared {count} rows from {table}");
        cleared.set(table, count);
    }
    Ok(cleared)
}
