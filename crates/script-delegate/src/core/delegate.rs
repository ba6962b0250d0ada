//! Connection-lifecycle base shared by every backend variant.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, info};

use crate::error::{DelegateError, Result};

use super::statement::{ExecutionPolicy, ScriptSummary, Statement, StatementOutcome};
use super::traits::{DatabaseDelegate, DelegateBackend};

/// Delegate owning at most one lazily opened backend connection.
///
/// The connection slot starts empty and is filled by the first operation
/// that needs it. Once [`close`](DatabaseDelegate::close) has run, the
/// delegate refuses further statements with [`DelegateError::Closed`].
pub struct Delegate<B: DelegateBackend> {
    backend: B,
    connection: Option<B::Connection>,
    closed: bool,
}

impl<B: DelegateBackend> Delegate<B> {
    /// Wrap a backend. No connection is opened yet.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            connection: None,
            closed: false,
        }
    }

    /// The backend variant driving this delegate.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Whether the delegate has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Get the memoized connection, creating it on first use.
    pub async fn get_connection(&mut self) -> Result<&mut B::Connection> {
        if self.closed {
            return Err(DelegateError::Closed);
        }
        if self.connection.is_none() {
            let connection = self.backend.create_new_connection().await?;
            info!("Opened {} connection", self.backend.backend_name());
            self.connection = Some(connection);
        }
        self.connection.as_mut().ok_or(DelegateError::Closed)
    }

    async fn run_statements(
        &mut self,
        statements: &[String],
        script_path: &str,
        policy: ExecutionPolicy,
    ) -> Result<ScriptSummary> {
        let mut summary = ScriptSummary::new(script_path);
        for (index, statement) in statements.iter().enumerate() {
            let outcome = self
                .execute_one(statement, script_path, index + 1, policy)
                .await?;
            summary.record(outcome);
        }
        Ok(summary)
    }
}

#[async_trait]
impl<B: DelegateBackend> DatabaseDelegate for Delegate<B> {
    async fn execute_one(
        &mut self,
        statement: &str,
        script_path: &str,
        line_number: usize,
        policy: ExecutionPolicy,
    ) -> Result<StatementOutcome> {
        let statement = Statement::new(statement, line_number, script_path);
        self.get_connection().await?;

        let Self {
            backend,
            connection,
            ..
        } = self;
        let connection = connection.as_mut().ok_or(DelegateError::Closed)?;
        backend.execute_statement(connection, &statement, policy).await
    }

    async fn execute_script(
        &mut self,
        statements: &[String],
        script_path: &str,
        policy: ExecutionPolicy,
    ) -> Result<ScriptSummary> {
        info!(
            "Executing {} statements from {} on {}",
            statements.len(),
            script_path,
            self.backend.backend_name()
        );

        // Close on every exit path, including a panicking backend.
        let outcome = AssertUnwindSafe(self.run_statements(statements, script_path, policy))
            .catch_unwind()
            .await;
        self.close().await;

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        let connection = self
            .connection
            .take()
            .or_else(|| self.backend.supplied_connection());
        if let Some(connection) = connection {
            self.backend.close_connection_quietly(connection).await;
            debug!("Closed {} connection", self.backend.backend_name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingBackend {
        created: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        panics: bool,
    }

    #[async_trait]
    impl DelegateBackend for CountingBackend {
        type Connection = usize;

        fn backend_name(&self) -> &'static str {
            "counting"
        }

        async fn create_new_connection(&mut self) -> Result<usize> {
            Ok(self.created.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn execute_statement(
            &self,
            _connection: &mut usize,
            _statement: &Statement<'_>,
            _policy: ExecutionPolicy,
        ) -> Result<StatementOutcome> {
            if self.panics {
                panic!("backend fault");
            }
            Ok(StatementOutcome::Executed)
        }

        async fn close_connection_quietly(&self, _connection: usize) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_get_connection_is_memoized() {
        let backend = CountingBackend::default();
        let created = backend.created.clone();
        let mut delegate = Delegate::with_backend(backend);

        for _ in 0..5 {
            assert_eq!(*delegate.get_connection().await.unwrap(), 1);
        }
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(delegate.is_connected());
    }

    #[tokio::test]
    async fn test_close_without_connection_is_noop() {
        let backend = CountingBackend::default();
        let (created, closed) = (backend.created.clone(), backend.closed.clone());
        let mut delegate = Delegate::with_backend(backend);

        delegate.close().await;
        delegate.close().await;

        assert!(delegate.is_closed());
        assert_eq!(created.load(Ordering::SeqCst), 0);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_closed_delegate_rejects_statements() {
        let mut delegate = Delegate::with_backend(CountingBackend::default());
        delegate.close().await;

        let err = delegate
            .execute_one("SELECT 1", "check.sql", 1, ExecutionPolicy::strict())
            .await
            .unwrap_err();
        assert!(matches!(err, DelegateError::Closed));
        assert!(matches!(
            delegate.get_connection().await,
            Err(DelegateError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_empty_script_opens_nothing() {
        let backend = CountingBackend::default();
        let created = backend.created.clone();
        let mut delegate = Delegate::with_backend(backend);

        let summary = delegate
            .execute_script(&[], "empty.sql", ExecutionPolicy::strict())
            .await
            .unwrap();

        assert_eq!(summary.total(), 0);
        assert_eq!(created.load(Ordering::SeqCst), 0);
        assert!(delegate.is_closed());
    }

    #[tokio::test]
    async fn test_panicking_backend_still_closes_connection() {
        let backend = CountingBackend {
            panics: true,
            ..Default::default()
        };
        let (created, closed) = (backend.created.clone(), backend.closed.clone());
        let mut delegate = Delegate::with_backend(backend);

        let statements = vec!["SELECT 1".to_string(), "SELECT 2".to_string()];
        let outcome = AssertUnwindSafe(delegate.execute_script(
            &statements,
            "fault.sql",
            ExecutionPolicy::strict(),
        ))
        .catch_unwind()
        .await;

        let panic = outcome.err().unwrap();
        assert_eq!(panic.downcast_ref::<&str>(), Some(&"backend fault"));
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(delegate.is_closed());
        assert!(!delegate.is_connected());
    }
}
