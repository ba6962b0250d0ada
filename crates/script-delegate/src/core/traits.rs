//! Core traits for backend-agnostic script execution.
//!
//! - [`DatabaseDelegate`]: the capability contract exposed to callers
//! - [`DelegateBackend`]: the hooks a backend variant supplies to the
//!   connection-lifecycle base ([`Delegate`](super::Delegate))
//!
//! # Design Patterns
//!
//! - **Template Method**: `Delegate<B>` owns memoization, iteration and
//!   cleanup; backends only create, use and close their connection
//! - **Strategy**: each backend classifies statement failures its own way

use async_trait::async_trait;

use crate::error::Result;

use super::statement::{ExecutionPolicy, ScriptSummary, Statement, StatementOutcome};

/// Execute scripts against one database through a single owned connection.
///
/// Every operation takes `&mut self`: a delegate is driven by one logical
/// task at a time. Each call awaits the backend to completion before
/// returning; statements are never pipelined.
#[async_trait]
pub trait DatabaseDelegate: Send {
    /// Execute exactly one statement.
    ///
    /// Opens the connection if it is not open yet. Fails with
    /// [`DelegateError::StatementFailed`](crate::DelegateError::StatementFailed)
    /// when the backend rejects the statement and `policy` does not absorb it.
    async fn execute_one(
        &mut self,
        statement: &str,
        script_path: &str,
        line_number: usize,
        policy: ExecutionPolicy,
    ) -> Result<StatementOutcome>;

    /// Execute `statements` in order, numbering lines from 1, then close.
    ///
    /// The delegate is closed exactly once however the run ends. No statement
    /// runs after an escalated failure.
    async fn execute_script(
        &mut self,
        statements: &[String],
        script_path: &str,
        policy: ExecutionPolicy,
    ) -> Result<ScriptSummary>;

    /// Release the connection if open. Idempotent and infallible.
    async fn close(&mut self);
}

/// Backend-specific hooks used by the connection-lifecycle base.
#[async_trait]
pub trait DelegateBackend: Send + Sync {
    /// Backend connection or session handle.
    type Connection: Send;

    /// Backend name used in logs and connection errors.
    fn backend_name(&self) -> &'static str;

    /// Open a new connection.
    ///
    /// Called at most once per delegate. Failures surface as
    /// [`DelegateError::ConnectionCreation`](crate::DelegateError::ConnectionCreation).
    async fn create_new_connection(&mut self) -> Result<Self::Connection>;

    /// Execute one statement on `connection` and classify any failure.
    async fn execute_statement(
        &self,
        connection: &mut Self::Connection,
        statement: &Statement<'_>,
        policy: ExecutionPolicy,
    ) -> Result<StatementOutcome>;

    /// Close `connection`. Errors are logged and suppressed.
    async fn close_connection_quietly(&self, connection: Self::Connection);

    /// Hand back an externally supplied connection that was never used.
    ///
    /// Lets `close()` release it even when no statement ran.
    fn supplied_connection(&mut self) -> Option<Self::Connection> {
        None
    }
}
