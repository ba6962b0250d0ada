//! Backend implementations of the delegate contract.
//!
//! - [`sql`]: container-bound and containerless SQL delegates
//! - [`cassandra`]: CQL delegate with lightweight-transaction checks
//! - [`postgres`], [`mssql`], [`mysql`]: concrete SQL connections
//! - [`common`]: TLS settings shared by the SQL connections
//!
//! [`DelegateImpl`] picks a backend from a [`TargetConfig`] and dispatches
//! with a `match` instead of a trait object.

pub mod cassandra;
pub mod common;
pub mod mssql;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod postgres;
pub mod sql;

pub use cassandra::{
    CassandraBackend, CassandraContainer, CassandraDelegate, CqlConnector, CqlSession,
    QueryOutcome, ScyllaConnector, ScyllaSession, CQL_PORT,
};
pub use common::SslMode;
pub use mssql::MssqlConnection;
#[cfg(feature = "mysql")]
pub use mysql::MysqlConnection;
pub use postgres::PgConnection;
pub use sql::{
    ContainerlessSqlBackend, ContainerlessSqlDelegate, SqlBackend, SqlConnection, SqlContainer,
    SqlDelegate,
};

use async_trait::async_trait;

use crate::config::{DatabaseKind, TargetConfig};
use crate::core::{DatabaseDelegate, ExecutionPolicy, ScriptSummary, StatementOutcome};
use crate::error::{DelegateError, DriverError, Result};

/// A SQL connection to any supported engine.
pub enum AnySqlConnection {
    Postgres(PgConnection),
    Mssql(MssqlConnection),
    #[cfg(feature = "mysql")]
    Mysql(MysqlConnection),
}

#[async_trait]
impl SqlConnection for AnySqlConnection {
    async fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
        match self {
            Self::Postgres(c) => c.execute(sql).await,
            Self::Mssql(c) => c.execute(sql).await,
            #[cfg(feature = "mysql")]
            Self::Mysql(c) => c.execute(sql).await,
        }
    }

    async fn close(self) -> std::result::Result<(), DriverError> {
        match self {
            Self::Postgres(c) => c.close().await,
            Self::Mssql(c) => c.close().await,
            #[cfg(feature = "mysql")]
            Self::Mysql(c) => c.close().await,
        }
    }
}

/// A SQL database reachable at a configured address.
#[derive(Debug, Clone)]
pub struct SqlEndpoint {
    target: TargetConfig,
    kind: DatabaseKind,
    port: u16,
}

impl SqlEndpoint {
    /// Resolve a SQL target. Fails for Cassandra and unknown types.
    pub fn from_target(target: &TargetConfig) -> Result<Self> {
        let kind = target.kind()?;
        if !kind.is_sql() {
            return Err(DelegateError::Config(format!(
                "{} is not a SQL database",
                kind.name()
            )));
        }
        Ok(Self {
            target: target.clone(),
            kind,
            port: target.effective_port()?,
        })
    }

    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }
}

#[async_trait]
impl SqlContainer for SqlEndpoint {
    type Connection = AnySqlConnection;

    async fn create_connection(&self) -> std::result::Result<AnySqlConnection, DriverError> {
        match self.kind {
            DatabaseKind::Postgres => Ok(AnySqlConnection::Postgres(
                PgConnection::connect(&self.target, self.port).await?,
            )),
            DatabaseKind::Mssql => Ok(AnySqlConnection::Mssql(
                MssqlConnection::connect(&self.target, self.port).await?,
            )),
            #[cfg(feature = "mysql")]
            DatabaseKind::Mysql => Ok(AnySqlConnection::Mysql(
                MysqlConnection::connect(&self.target, self.port).await?,
            )),
            other => Err(DriverError::Other(format!(
                "no SQL driver available for {}",
                other.name()
            ))),
        }
    }
}

/// A Cassandra node reachable at a configured address.
///
/// The configured port is used as is; no container port mapping applies.
#[derive(Debug, Clone)]
pub struct CassandraEndpoint {
    host: String,
    port: u16,
}

impl CassandraEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl CassandraContainer for CassandraEndpoint {
    fn host(&self) -> String {
        self.host.clone()
    }

    fn mapped_port(&self, _exposed_port: u16) -> u16 {
        self.port
    }
}

/// Delegate for whichever backend a [`TargetConfig`] names.
pub enum DelegateImpl {
    Sql(SqlDelegate<SqlEndpoint>),
    Cassandra(CassandraDelegate<CassandraEndpoint>),
}

impl DelegateImpl {
    /// Create an unconnected delegate for `target`.
    pub fn from_config(target: &TargetConfig) -> Result<Self> {
        let kind = target.kind()?;
        if kind.is_sql() {
            return Ok(Self::Sql(SqlDelegate::new(SqlEndpoint::from_target(target)?)));
        }

        let endpoint = CassandraEndpoint::new(&target.host, target.effective_port()?);
        let mut connector = ScyllaConnector::new();
        if !target.user.is_empty() {
            connector = connector.with_credentials(&target.user, &target.password);
        }
        Ok(Self::Cassandra(crate::core::Delegate::with_backend(
            CassandraBackend::new(endpoint, connector),
        )))
    }

    /// Backend name used in logs and errors.
    pub fn backend_name(&self) -> &'static str {
        use crate::core::DelegateBackend;
        match self {
            Self::Sql(d) => d.backend().backend_name(),
            Self::Cassandra(d) => d.backend().backend_name(),
        }
    }

    /// Cheap statement used to check that the database answers.
    pub fn health_check_statement(&self) -> &'static str {
        match self {
            Self::Sql(_) => "SELECT 1",
            Self::Cassandra(_) => "SELECT release_version FROM system.local",
        }
    }
}

#[async_trait]
impl DatabaseDelegate for DelegateImpl {
    async fn execute_one(
        &mut self,
        statement: &str,
        script_path: &str,
        line_number: usize,
        policy: ExecutionPolicy,
    ) -> Result<StatementOutcome> {
        match self {
            Self::Sql(d) => {
                d.execute_one(statement, script_path, line_number, policy)
                    .await
            }
            Self::Cassandra(d) => {
                d.execute_one(statement, script_path, line_number, policy)
                    .await
            }
        }
    }

    async fn execute_script(
        &mut self,
        statements: &[String],
        script_path: &str,
        policy: ExecutionPolicy,
    ) -> Result<ScriptSummary> {
        match self {
            Self::Sql(d) => d.execute_script(statements, script_path, policy).await,
            Self::Cassandra(d) => d.execute_script(statements, script_path, policy).await,
        }
    }

    async fn close(&mut self) {
        match self {
            Self::Sql(d) => d.close().await,
            Self::Cassandra(d) => d.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(db_type: &str) -> TargetConfig {
        TargetConfig {
            r#type: db_type.to_string(),
            host: "localhost".to_string(),
            port: None,
            database: "app".to_string(),
            user: "app".to_string(),
            password: "secret".to_string(),
            ssl_mode: "disable".to_string(),
        }
    }

    #[test]
    fn test_from_config_selects_backend() {
        let sql = DelegateImpl::from_config(&target("postgres")).unwrap();
        assert!(matches!(sql, DelegateImpl::Sql(_)));
        assert_eq!(sql.backend_name(), "SQL");
        assert_eq!(sql.health_check_statement(), "SELECT 1");

        let cql = DelegateImpl::from_config(&target("cassandra")).unwrap();
        assert!(matches!(cql, DelegateImpl::Cassandra(_)));
        assert_eq!(cql.backend_name(), "cassandra");
    }

    #[test]
    fn test_from_config_rejects_unknown_type() {
        let err = DelegateImpl::from_config(&target("db2")).err().unwrap();
        assert!(matches!(err, DelegateError::Config(_)));
    }

    #[test]
    fn test_sql_endpoint_rejects_cassandra() {
        assert!(SqlEndpoint::from_target(&target("cassandra")).is_err());
        let endpoint = SqlEndpoint::from_target(&target("sqlserver")).unwrap();
        assert_eq!(endpoint.kind(), DatabaseKind::Mssql);
    }

    #[test]
    fn test_cassandra_endpoint_uses_configured_port() {
        let endpoint = CassandraEndpoint::new("node1", 19042);
        assert_eq!(endpoint.contact_point(), "node1:19042");
    }

    #[tokio::test]
    async fn test_closed_impl_delegate_opens_nothing() {
        let mut delegate = DelegateImpl::from_config(&target("postgres")).unwrap();
        delegate.close().await;
        let err = delegate
            .execute_one("SELECT 1", "health-check", 1, ExecutionPolicy::strict())
            .await
            .unwrap_err();
        assert!(matches!(err, DelegateError::Closed));
    }
}
