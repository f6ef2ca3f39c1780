//! In-memory storage with the same contract as the MySQL backend.
//!
//! Used for dry runs and tests. Each session works on a private copy of the
//! tables that replaces the shared state only on commit. Primary keys and the
//! submissions -> problems -> competitions foreign keys are enforced.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::backend::{Backend, Session};
use crate::config::ConnectionConfig;
use crate::errors::SeedError;
use crate::models::{Competition, Problem, Table};

/// A pre-existing row of the `submissions` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSubmission {
    pub id: i64,
    pub problem_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTables {
    pub competitions: Vec<Competition>,
    pub problems: Vec<Problem>,
    pub submissions: Vec<StoredSubmission>,
}

impl MemoryTables {
    fn row_count(&self, table: Table) -> usize {
        match table {
            Table::Submissions => self.submissions.len(),
            Table::Problems => self.problems.len(),
            Table::Competitions => self.competitions.len(),
        }
    }
}

/// What happened to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub config: ConnectionConfig,
    pub committed: bool,
    pub rolled_back: bool,
    pub closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    committed: MemoryTables,
    connections: Vec<ConnectionRecord>,
    refuse_connections: Option<String>,
    reject_next_commit: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing committed rows.
    pub fn with_tables(tables: MemoryTables) -> Self {
        let backend = Self::new();
        backend.lock().committed = tables;
        backend
    }

    /// Every connection attempt fails with `reason`.
    pub fn refusing_connections(reason: impl Into<String>) -> Self {
        let backend = Self::new();
        backend.lock().refuse_connections = Some(reason.into());
        backend
    }

    /// The next commit on any session fails with `reason`.
    pub fn reject_next_commit(&self, reason: impl Into<String>) {
        self.lock().reject_next_commit = Some(reason.into());
    }

    /// Snapshot of the committed rows.
    pub fn tables(&self) -> MemoryTables {
        self.lock().committed.clone()
    }

    pub fn connections(&self) -> Vec<ConnectionRecord> {
        self.lock().connections.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    type Session = MemorySession;

    async fn connect(&self, config: &ConnectionConfig) -> Result<MemorySession, SeedError> {
        let mut shared = self.lock();
        if let Some(reason) = &shared.refuse_connections {
            return Err(SeedError::Connection(reason.clone()));
        }

        let working = shared.committed.clone();
        shared.connections.push(ConnectionRecord {
            config: config.clone(),
            committed: false,
            rolled_back: false,
            closed: false,
        });
        let index = shared.connections.len() - 1;
        debug!("Opened in-memory session {index}");

        Ok(MemorySession {
            backend: self.clone(),
            index,
            working: Some(working),
        })
    }
}

pub struct MemorySession {
    backend: MemoryBackend,
    index: usize,
    working: Option<MemoryTables>,
}

impl MemorySession {
    fn working(&mut self) -> Result<&mut MemoryTables, SeedError> {
        self.working
            .as_mut()
            .ok_or_else(|| SeedError::Connection("transaction already finished".to_string()))
    }

    fn record(&self, update: impl FnOnce(&mut ConnectionRecord)) {
        if let Some(record) = self.backend.lock().connections.get_mut(self.index) {
            update(record);
        }
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn delete_all(&mut self, table: Table) -> Result<u64, SeedError> {
        let tables = self.working()?;
        let removed = tables.row_count(table) as u64;

        match table {
            Table::Submissions => tables.submissions.clear(),
            Table::Problems => {
                if let Some(sub) = tables.submissions.first() {
                    return Err(SeedError::Constraint(format!(
                        "cannot delete problems: submission {} references problem {}",
                        sub.id, sub.problem_id
                    )));
                }
                tables.problems.clear();
            }
            Table::Competitions => {
                if let Some(problem) = tables.problems.first() {
                    return Err(SeedError::Constraint(format!(
                        "cannot delete competitions: problem {} references competition {}",
                        problem.id, problem.competition_id
                    )));
                }
                tables.competitions.clear();
            }
        }

        Ok(removed)
    }

    async fn insert_competition(&mut self, competition: &Competition) -> Result<(), SeedError> {
        let tables = self.working()?;
        if tables.competitions.iter().any(|c| c.id == competition.id) {
            return Err(SeedError::Constraint(format!(
                "Duplicate entry '{}' for key 'competitions.PRIMARY'",
                competition.id
            )));
        }
        tables.competitions.push(competition.clone());
        Ok(())
    }

    async fn insert_problem(&mut self, problem: &Problem) -> Result<(), SeedError> {
        let tables = self.working()?;
        if tables.problems.iter().any(|p| p.id == problem.id) {
            return Err(SeedError::Constraint(format!(
                "Duplicate entry '{}' for key 'problems.PRIMARY'",
                problem.id
            )));
        }
        if !tables
            .competitions
            .iter()
            .any(|c| c.id == problem.competition_id)
        {
            return Err(SeedError::Constraint(format!(
                "problem {} references missing competition {}",
                problem.id, problem.competition_id
            )));
        }
        tables.problems.push(problem.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SeedError> {
        if self.working.is_none() {
            return Err(SeedError::Commit("transaction already finished".to_string()));
        }

        {
            let mut shared = self.backend.lock();
            if let Some(reason) = shared.reject_next_commit.take() {
                return Err(SeedError::Commit(reason));
            }
            if let Some(working) = self.working.take() {
                shared.committed = working;
            }
        }

        self.record(|r| r.committed = true);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SeedError> {
        if self.working.take().is_some() {
            self.record(|r| r.rolled_back = true);
        }
        Ok(())
    }

    async fn close(mut self) -> Result<(), SeedError> {
        self.working = None;
        self.record(|r| r.closed = true);
        Ok(())
    }
}
