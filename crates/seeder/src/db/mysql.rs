//! MySQL storage through sqlx.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{debug, info};

use super::backend::{Backend, Session};
use crate::config::ConnectionConfig;
use crate::errors::SeedError;
use crate::models::{Answer, Competition, Problem, Table};

/// Connects to a MySQL server. Each session holds a single connection.
#[derive(Debug, Clone, Default)]
pub struct MySqlBackend;

impl MySqlBackend {
    pub fn new() -> Self {
        Self
    }

    fn connect_options(config: &ConnectionConfig) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.database);

        if config.password.is_empty() {
            options
        } else {
            options.password(&config.password)
        }
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    type Session = MySqlSession;

    async fn connect(&self, config: &ConnectionConfig) -> Result<MySqlSession, SeedError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(Self::connect_options(config))
            .await
            .map_err(SeedError::from_connect)?;

        let tx = pool.begin().await.map_err(SeedError::from_connect)?;

        info!("Connected to {}", config);

        Ok(MySqlSession {
            pool,
            tx: Some(tx),
        })
    }
}

pub struct MySqlSession {
    pool: MySqlPool,
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlSession {
    fn transaction(&mut self) -> Result<&mut Transaction<'static, MySql>, SeedError> {
        self.tx
            .as_mut()
            .ok_or_else(|| SeedError::Connection("transaction already finished".to_string()))
    }
}

#[async_trait]
impl Session for MySqlSession {
    async fn delete_all(&mut self, table: Table) -> Result<u64, SeedError> {
        let tx = self.transaction()?;
        let sql = format!("DELETE FROM {}", table.as_str());

        let result = sqlx::query(&sql)
            .execute(&mut **tx)
            .await
            .map_err(SeedError::from_statement)?;

        Ok(result.rows_affected())
    }

    async fn insert_competition(&mut self, competition: &Competition) -> Result<(), SeedError> {
        let tx = self.transaction()?;

        sqlx::query(
            r#"
            INSERT INTO competitions (id, start_timestamp, end_timestamp)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(competition.id)
        .bind(competition.start_timestamp.as_datetime())
        .bind(competition.end_timestamp.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(SeedError::from_statement)?;

        Ok(())
    }

    async fn insert_problem(&mut self, problem: &Problem) -> Result<(), SeedError> {
        let tx = self.transaction()?;

        let query = sqlx::query(
            r#"
            INSERT INTO problems (id, competition_id, number, correct_answer)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(problem.id)
        .bind(problem.competition_id)
        .bind(problem.number);

        let query = match &problem.correct_answer {
            Answer::Integer(n) => query.bind(*n),
            Answer::Text(s) => query.bind(s.as_str()),
        };

        query
            .execute(&mut **tx)
            .await
            .map_err(SeedError::from_statement)?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SeedError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| SeedError::Commit("transaction already finished".to_string()))?;

        tx.commit().await.map_err(SeedError::from_commit)
    }

    async fn rollback(&mut self) -> Result<(), SeedError> {
        match self.tx.take() {
            Some(tx) => {
                tx.rollback().await?;
                debug!("Rolled back");
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn close(mut self) -> Result<(), SeedError> {
        let rolled_back = self.rollback().await;
        self.pool.close().await;
        debug!("Connection closed");
        rolled_back
    }
}
