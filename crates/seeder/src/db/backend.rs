//! The storage capabilities the seeder needs.
//!
//! A [`Backend`] opens [`Session`]s. A session is one connection with one open
//! unit of work: nothing it writes is visible to other sessions until
//! [`Session::commit`] succeeds.

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::errors::SeedError;
use crate::models::{Competition, Problem, Table};

#[async_trait]
pub trait Backend: Send + Sync {
    type Session: Session;

    /// Connects and begins a unit of work.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Self::Session, SeedError>;
}

#[async_trait]
pub trait Session: Send {
    /// Deletes every row of `table`. Returns the number of rows removed.
    async fn delete_all(&mut self, table: Table) -> Result<u64, SeedError>;

    async fn insert_competition(&mut self, competition: &Competition) -> Result<(), SeedError>;

    async fn insert_problem(&mut self, problem: &Problem) -> Result<(), SeedError>;

    async fn commit(&mut self) -> Result<(), SeedError>;

    /// Discards everything written since connecting.
    async fn rollback(&mut self) -> Result<(), SeedError>;

    /// Releases the connection. Uncommitted work is discarded.
    async fn close(self) -> Result<(), SeedError>;
}
