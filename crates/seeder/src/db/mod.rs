//! Storage for seeding.
//!
//! [`Seeder`] drives the write sequence against any [`Backend`]:
//! [`MySqlBackend`] for a real server, [`MemoryBackend`] for dry runs and
//! tests.

mod backend;
mod memory;
mod mysql;
mod seeder;

pub use backend::{Backend, Session};
pub use memory::{ConnectionRecord, MemoryBackend, MemorySession, MemoryTables, StoredSubmission};
pub use mysql::{MySqlBackend, MySqlSession};
pub use seeder::{ClearedRows, SeedReport, Seeder, reset};
