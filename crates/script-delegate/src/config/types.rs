//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::core::ExecutionPolicy;
use crate::reuse::ReuseConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database the scripts run against.
    pub target: TargetConfig,

    /// Default error tolerance for script runs.
    #[serde(default)]
    pub execution: ExecutionPolicy,

    /// Container reuse settings, handed to the container manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reuse: Option<ReuseConfig>,
}

/// Target database configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database type: postgres, mssql, mysql or cassandra.
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port. Defaults to the standard port of the database type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name (SQL targets).
    #[serde(default)]
    pub database: String,

    /// Username (SQL targets).
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// SSL mode (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Supported database kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Mssql,
    Mysql,
    Cassandra,
}

impl DatabaseKind {
    /// Parse a database type string, accepting common aliases.
    pub fn from_db_type(db_type: &str) -> Option<Self> {
        match db_type.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(DatabaseKind::Postgres),
            "mssql" | "sqlserver" | "sql_server" => Some(DatabaseKind::Mssql),
            "mysql" | "mariadb" => Some(DatabaseKind::Mysql),
            "cassandra" | "scylla" | "scylladb" => Some(DatabaseKind::Cassandra),
            _ => None,
        }
    }

    /// Standard port of the database.
    pub fn default_port(&self) -> u16 {
        match self {
            DatabaseKind::Postgres => 5432,
            DatabaseKind::Mssql => 1433,
            DatabaseKind::Mysql => 3306,
            DatabaseKind::Cassandra => 9042,
        }
    }

    /// Whether statements are SQL (as opposed to CQL).
    pub fn is_sql(&self) -> bool {
        !matches!(self, DatabaseKind::Cassandra)
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "postgres",
            DatabaseKind::Mssql => "mssql",
            DatabaseKind::Mysql => "mysql",
            DatabaseKind::Cassandra => "cassandra",
        }
    }
}

fn default_disable() -> String {
    "disable".to_string()
}
