//! Seeds the competition database.
//!
//! Clears existing submissions, problems and competitions, then inserts one
//! competition and its problems with their correct answers, all in a single
//! transaction.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use competition_seeder::prelude::*;
//!
//! let input = SeedInput::load(Some(Path::new("competition_data.json")))?;
//! let connection = ConnectionConfig::resolve(input.database.as_ref())?;
//!
//! let report = Seeder::new(MySqlBackend::new())
//!     .run(&input.plan, &connection)
//!     .await?;
//! ```

pub mod config;
pub mod db;
pub mod errors;
pub mod models;

use std::path::Path;

use crate::config::{CompetitionFile, ConnectionConfig, ConnectionOverrides};
use crate::db::{Backend, SeedReport, Seeder};
use crate::errors::SeedError;
use crate::models::SeedPlan;

/// What to seed, plus any connection settings the data file carried.
#[derive(Debug, Clone)]
pub struct SeedInput {
    pub plan: SeedPlan,
    pub database: Option<ConnectionOverrides>,
}

impl SeedInput {
    /// Reads the data file at `path`, or falls back to the built-in
    /// competition when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, SeedError> {
        match path {
            Some(path) => Self::from_file(CompetitionFile::load(path)?),
            None => Ok(Self {
                plan: SeedPlan::default_competition(),
                database: None,
            }),
        }
    }

    pub fn from_file(file: CompetitionFile) -> Result<Self, SeedError> {
        Ok(Self {
            plan: SeedPlan::from_file(&file)?,
            database: file.database,
        })
    }
}

/// Runs the full seed sequence with reset against `backend`.
pub async fn run<B: Backend>(
    backend: B,
    plan: &SeedPlan,
    connection: &ConnectionConfig,
) -> Result<SeedReport, SeedError> {
    Seeder::new(backend).run(plan, connection).await
}

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{CompetitionFile, ConnectionConfig, ConnectionOverrides, ProblemEntry};
    pub use crate::db::{
        Backend, ClearedRows, MemoryBackend, MySqlBackend, SeedReport, Seeder, Session,
    };
    pub use crate::errors::SeedError;
    pub use crate::models::{Answer, CanonicalTimestamp, Competition, Problem, SeedPlan, Table};
    pub use crate::{SeedInput, run};
}
