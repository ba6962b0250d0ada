//! Error types for the delegate library.

use thiserror::Error;

/// Main error type for delegate operations.
#[derive(Error, Debug)]
pub enum DelegateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend connection could not be established.
    ///
    /// Fatal: the delegate never retries connection creation.
    #[error("Could not obtain {backend} connection")]
    ConnectionCreation {
        backend: &'static str,
        #[source]
        source: DriverError,
    },

    /// A script statement failed and the execution policy did not absorb it.
    #[error("Script execution failed ({script_path}:{line_number}): {statement}")]
    StatementFailed {
        statement: String,
        line_number: usize,
        script_path: String,
        #[source]
        source: Option<DriverError>,
    },

    /// The delegate was already closed and cannot be used again.
    #[error("Delegate has already been closed")]
    Closed,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DelegateError {
    /// Create a ConnectionCreation error for the given backend.
    pub fn connection_creation(backend: &'static str, source: impl Into<DriverError>) -> Self {
        DelegateError::ConnectionCreation {
            backend,
            source: source.into(),
        }
    }

    /// Create a StatementFailed error.
    pub fn statement_failed(
        statement: impl Into<String>,
        line_number: usize,
        script_path: impl Into<String>,
        source: Option<DriverError>,
    ) -> Self {
        DelegateError::StatementFailed {
            statement: statement.into(),
            line_number,
            script_path: script_path.into(),
            source,
        }
    }

    /// Process exit code used by the CLI for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            DelegateError::Config(_) | DelegateError::Yaml(_) => 2,
            DelegateError::ConnectionCreation { .. } => 3,
            DelegateError::StatementFailed { .. } => 4,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Errors raised by the underlying database drivers.
#[derive(Error, Debug)]
pub enum DriverError {
    /// PostgreSQL error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// SQL Server error
    #[error("SQL Server error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    /// MySQL/MariaDB error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// Cassandra query error
    #[error("Cassandra query error: {0}")]
    CassandraQuery(#[from] scylla::transport::errors::QueryError),

    /// Cassandra session could not be established
    #[error("Cassandra session error: {0}")]
    CassandraSession(#[from] scylla::transport::errors::NewSessionError),

    /// TLS setup failed
    #[error("TLS error: {0}")]
    Tls(String),

    /// IO error (sockets)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure
    #[error("{0}")]
    Other(String),
}

/// Result type alias for delegate operations.
pub type Result<T> = std::result::Result<T, DelegateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_failed_message() {
        let err = DelegateError::statement_failed(
            "DROP TABLE nonexistent",
            3,
            "init.sql",
            Some(DriverError::Other("table does not exist".into())),
        );
        assert_eq!(
            err.to_string(),
            "Script execution failed (init.sql:3): DROP TABLE nonexistent"
        );
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let err = DelegateError::connection_creation(
            "SQL",
            DriverError::Other("connection refused".into()),
        );
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Could not obtain SQL connection"));
        assert!(detailed.contains("Caused by:\n  1: connection refused"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_statement_failed_without_cause() {
        let err = DelegateError::statement_failed(
            "INSERT INTO t (x) VALUES (1) IF NOT EXISTS",
            1,
            "init.cql",
            None,
        );
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(err.format_detailed().matches("Caused by").count(), 0);
    }

    #[test]
    fn test_config_exit_code() {
        assert_eq!(DelegateError::Config("bad".into()).exit_code(), 2);
        assert_eq!(DelegateError::Closed.exit_code(), 1);
    }
}
