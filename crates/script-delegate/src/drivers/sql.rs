//! SQL delegates.
//!
//! Two variants share execution and failure classification:
//!
//! - [`SqlDelegate`]: bound to a [`SqlContainer`] that opens a fresh
//!   connection on demand
//! - [`ContainerlessSqlDelegate`]: wraps a connection the caller already
//!   opened and never creates one itself
//!
//! A rejected statement is absorbed when the [`ExecutionPolicy`] allows it
//! (any failure with `continue_on_error`, DROP failures with
//! `ignore_failed_drops`); otherwise it aborts the script with
//! [`DelegateError::StatementFailed`].

use async_trait::async_trait;
use tracing::{debug, error};

use crate::core::{Delegate, DelegateBackend, ExecutionPolicy, Statement, StatementOutcome};
use crate::error::{DelegateError, DriverError, Result};

const BACKEND_NAME: &str = "SQL";

/// An open SQL connection able to run statement text verbatim.
#[async_trait]
pub trait SqlConnection: Send {
    /// Execute one statement and return the number of rows affected.
    async fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError>;

    /// Close the connection.
    async fn close(self) -> std::result::Result<(), DriverError>;
}

/// What a running SQL database container exposes to a delegate.
#[async_trait]
pub trait SqlContainer: Send + Sync {
    /// Connection type produced by this container.
    type Connection: SqlConnection;

    /// Open a fresh connection to the database.
    async fn create_connection(&self) -> std::result::Result<Self::Connection, DriverError>;
}

/// Container-bound SQL backend.
pub struct SqlBackend<C> {
    container: C,
}

impl<C: SqlContainer> SqlBackend<C> {
    /// Bind to a container.
    pub fn new(container: C) -> Self {
        Self { container }
    }

    /// The bound container.
    pub fn container(&self) -> &C {
        &self.container
    }
}

#[async_trait]
impl<C: SqlContainer> DelegateBackend for SqlBackend<C> {
    type Connection = C::Connection;

    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn create_new_connection(&mut self) -> Result<Self::Connection> {
        self.container.create_connection().await.map_err(|e| {
            error!("Could not obtain SQL connection: {}", e);
            DelegateError::connection_creation(BACKEND_NAME, e)
        })
    }

    async fn execute_statement(
        &self,
        connection: &mut Self::Connection,
        statement: &Statement<'_>,
        policy: ExecutionPolicy,
    ) -> Result<StatementOutcome> {
        execute_sql(connection, statement, policy).await
    }

    async fn close_connection_quietly(&self, connection: Self::Connection) {
        close_quietly(connection).await;
    }
}

/// SQL backend over a connection supplied at construction.
///
/// The backend holds the connection until first use, so the connection type
/// must be `Sync`.
pub struct ContainerlessSqlBackend<S> {
    connection: Option<S>,
}

impl<S: SqlConnection + Sync> ContainerlessSqlBackend<S> {
    /// Wrap an already open connection.
    pub fn new(connection: S) -> Self {
        Self {
            connection: Some(connection),
        }
    }
}

#[async_trait]
impl<S: SqlConnection + Sync> DelegateBackend for ContainerlessSqlBackend<S> {
    type Connection = S;

    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn create_new_connection(&mut self) -> Result<S> {
        self.connection.take().ok_or_else(|| {
            error!("Could not obtain SQL connection: supplied connection already released");
            DelegateError::connection_creation(
                BACKEND_NAME,
                DriverError::Other("supplied connection already released".into()),
            )
        })
    }

    async fn execute_statement(
        &self,
        connection: &mut S,
        statement: &Statement<'_>,
        policy: ExecutionPolicy,
    ) -> Result<StatementOutcome> {
        execute_sql(connection, statement, policy).await
    }

    async fn close_connection_quietly(&self, connection: S) {
        close_quietly(connection).await;
    }

    fn supplied_connection(&mut self) -> Option<S> {
        self.connection.take()
    }
}

/// Delegate bound to a SQL container.
pub type SqlDelegate<C> = Delegate<SqlBackend<C>>;

/// Delegate over a caller-supplied SQL connection.
pub type ContainerlessSqlDelegate<S> = Delegate<ContainerlessSqlBackend<S>>;

impl<C: SqlContainer> Delegate<SqlBackend<C>> {
    /// Create a delegate that opens its connection through `container`.
    pub fn new(container: C) -> Self {
        Delegate::with_backend(SqlBackend::new(container))
    }
}

impl<S: SqlConnection + Sync> Delegate<ContainerlessSqlBackend<S>> {
    /// Create a delegate that runs statements on `connection`.
    pub fn new(connection: S) -> Self {
        Delegate::with_backend(ContainerlessSqlBackend::new(connection))
    }
}

async fn execute_sql<S: SqlConnection>(
    connection: &mut S,
    statement: &Statement<'_>,
    policy: ExecutionPolicy,
) -> Result<StatementOutcome> {
    match connection.execute(statement.text).await {
        Ok(rows_affected) => {
            debug!("{} rows affected for SQL: {}", rows_affected, statement.text);
            Ok(StatementOutcome::Executed)
        }
        Err(e) if policy.absorbs(statement) => {
            debug!(
                "Failed to execute SQL script statement at line {} of resource {}: {}: {}",
                statement.line_number, statement.script_path, statement.text, e
            );
            Ok(StatementOutcome::Absorbed)
        }
        Err(e) => Err(DelegateError::statement_failed(
            statement.text,
            statement.line_number,
            statement.script_path,
            Some(e),
        )),
    }
}

async fn close_quietly<S: SqlConnection>(connection: S) {
    if let Err(e) = connection.close().await {
        error!("Could not close SQL connection: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DatabaseDelegate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NullConnection {
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SqlConnection for NullConnection {
        async fn execute(&mut self, _sql: &str) -> std::result::Result<u64, DriverError> {
            Ok(0)
        }

        async fn close(self) -> std::result::Result<(), DriverError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn assert_delegate<D: DatabaseDelegate>(_delegate: &D) {}

    #[tokio::test]
    async fn test_containerless_delegate_runs_on_supplied_connection() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut delegate = ContainerlessSqlDelegate::new(NullConnection {
            closes: Arc::clone(&closes),
        });
        assert_delegate(&delegate);

        let outcome = delegate
            .execute_one("SELECT 1", "inline", 1, ExecutionPolicy::strict())
            .await
            .unwrap();
        assert_eq!(outcome, StatementOutcome::Executed);

        delegate.close().await;
        delegate.close().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
