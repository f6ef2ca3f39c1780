use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid timestamp for {field}: {value:?}")]
    Format { field: &'static str, value: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Commit rejected: {0}")]
    Commit(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SeedError {
    pub fn from_connect(err: sqlx::Error) -> Self {
        SeedError::Connection(err.to_string())
    }

    /// Classifies a failed statement: constraint violations are reported as
    /// [`SeedError::Constraint`], everything else stays a database error.
    pub fn from_statement(err: sqlx::Error) -> Self {
        let violation = err
            .as_database_error()
            .filter(|db_err| {
                matches!(
                    db_err.kind(),
                    ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::CheckViolation
                )
            })
            .map(|db_err| db_err.message().to_string());

        match violation {
            Some(message) => SeedError::Constraint(message),
            None => SeedError::Database(err),
        }
    }

    /// Any failure on commit is a [`SeedError::Commit`].
    pub fn from_commit(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db_err) => SeedError::Commit(db_err.message().to_string()),
            None => SeedError::Commit(err.to_string()),
        }
    }
}
