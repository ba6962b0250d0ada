//! Cassandra delegate.
//!
//! Statements are CQL. A statement fails when the driver raises an error or
//! when the server answers a lightweight transaction with `[applied] = false`.
//! Execution policy flags are accepted but never absorb a Cassandra failure.

use async_trait::async_trait;
use scylla::frame::response::result::CqlValue;
use scylla::{QueryResult, Session, SessionBuilder};
use tracing::{debug, error};

use crate::core::{Delegate, DelegateBackend, ExecutionPolicy, Statement, StatementOutcome};
use crate::error::{DelegateError, DriverError, Result};

const BACKEND_NAME: &str = "cassandra";

/// Native protocol port inside a Cassandra container.
pub const CQL_PORT: u16 = 9042;

/// What a running Cassandra container exposes to a delegate.
pub trait CassandraContainer: Send + Sync {
    /// Host the container is reachable on.
    fn host(&self) -> String;

    /// Host port mapped to `exposed_port` inside the container.
    fn mapped_port(&self, exposed_port: u16) -> u16;

    /// `host:port` contact point for the native protocol.
    fn contact_point(&self) -> String {
        format!("{}:{}", self.host(), self.mapped_port(CQL_PORT))
    }
}

/// Server answer to one CQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    /// `false` only when a conditional statement was not applied.
    pub applied: bool,
}

/// An open CQL session.
#[async_trait]
pub trait CqlSession: Send + Sync {
    async fn execute(&self, cql: &str) -> std::result::Result<QueryOutcome, DriverError>;

    async fn close(self) -> std::result::Result<(), DriverError>;
}

/// Opens CQL sessions against a contact point.
#[async_trait]
pub trait CqlConnector: Send + Sync {
    type Session: CqlSession;

    async fn connect(&self, contact_point: &str) -> std::result::Result<Self::Session, DriverError>;
}

/// Connector backed by the scylla driver.
#[derive(Debug, Clone, Default)]
pub struct ScyllaConnector {
    credentials: Option<(String, String)>,
}

impl ScyllaConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate with username and password.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }
}

#[async_trait]
impl CqlConnector for ScyllaConnector {
    type Session = ScyllaSession;

    async fn connect(&self, contact_point: &str) -> std::result::Result<ScyllaSession, DriverError> {
        let mut builder = SessionBuilder::new().known_node(contact_point);
        if let Some((user, password)) = &self.credentials {
            builder = builder.user(user, password);
        }
        let session = builder.build().await?;
        debug!("Cassandra session opened to {}", contact_point);
        Ok(ScyllaSession { session })
    }
}

/// Session opened by [`ScyllaConnector`].
pub struct ScyllaSession {
    session: Session,
}

#[async_trait]
impl CqlSession for ScyllaSession {
    async fn execute(&self, cql: &str) -> std::result::Result<QueryOutcome, DriverError> {
        let result = self.session.query_unpaged(cql, ()).await?;
        Ok(QueryOutcome {
            applied: was_applied(&result),
        })
    }

    async fn close(self) -> std::result::Result<(), DriverError> {
        // Dropping the session shuts its connection pool down.
        drop(self.session);
        Ok(())
    }
}

/// Read the `[applied]` column of a conditional statement result.
///
/// Results without that column count as applied.
fn was_applied(result: &QueryResult) -> bool {
    let Some((index, _)) = result.get_column_spec("[applied]") else {
        return true;
    };
    let first_row = result.rows.as_ref().and_then(|rows| rows.first());
    match first_row.and_then(|row| row.columns.get(index)) {
        Some(Some(CqlValue::Boolean(applied))) => *applied,
        _ => true,
    }
}

/// Cassandra backend bound to a container.
pub struct CassandraBackend<C, K> {
    container: C,
    connector: K,
}

impl<C: CassandraContainer, K: CqlConnector> CassandraBackend<C, K> {
    pub fn new(container: C, connector: K) -> Self {
        Self {
            container,
            connector,
        }
    }

    pub fn container(&self) -> &C {
        &self.container
    }
}

#[async_trait]
impl<C: CassandraContainer, K: CqlConnector> DelegateBackend for CassandraBackend<C, K> {
    type Connection = K::Session;

    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn create_new_connection(&mut self) -> Result<K::Session> {
        let contact_point = self.container.contact_point();
        self.connector.connect(&contact_point).await.map_err(|e| {
            error!("Could not obtain cassandra connection: {}", e);
            DelegateError::connection_creation(BACKEND_NAME, e)
        })
    }

    async fn execute_statement(
        &self,
        session: &mut K::Session,
        statement: &Statement<'_>,
        _policy: ExecutionPolicy,
    ) -> Result<StatementOutcome> {
        match session.execute(statement.text).await {
            Ok(outcome) if outcome.applied => {
                debug!("Statement {} was applied", statement.text);
                Ok(StatementOutcome::Executed)
            }
            Ok(_) => {
                error!(
                    "Statement at line {} of {} was not applied: {}",
                    statement.line_number, statement.script_path, statement.text
                );
                Err(DelegateError::statement_failed(
                    statement.text,
                    statement.line_number,
                    statement.script_path,
                    None,
                ))
            }
            Err(e) => Err(DelegateError::statement_failed(
                statement.text,
                statement.line_number,
                statement.script_path,
                Some(e),
            )),
        }
    }

    async fn close_connection_quietly(&self, session: K::Session) {
        if let Err(e) = session.close().await {
            error!("Could not close cassandra connection: {}", e);
        }
    }
}

/// Delegate bound to a Cassandra container through the scylla driver.
pub type CassandraDelegate<C> = Delegate<CassandraBackend<C, ScyllaConnector>>;

impl<C: CassandraContainer> Delegate<CassandraBackend<C, ScyllaConnector>> {
    /// Create a delegate that connects to `container` on first use.
    pub fn new(container: C) -> Self {
        Delegate::with_backend(CassandraBackend::new(container, ScyllaConnector::new()))
    }
}
