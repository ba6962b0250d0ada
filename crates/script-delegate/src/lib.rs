//! # script-delegate
//!
//! Run ordered database initialization scripts through one delegate contract.
//!
//! A delegate owns at most one lazily opened connection, executes statements
//! strictly in order, classifies failures per backend, and always releases
//! its connection when a script run ends. Backends:
//!
//! - **SQL** bound to a container that opens connections on demand
//! - **SQL** over a connection the caller already holds
//! - **Cassandra**, where an unapplied conditional statement is a failure
//!
//! ## Example
//!
//! ```rust,no_run
//! use script_delegate::{Config, DatabaseDelegate, DelegateImpl};
//!
//! #[tokio::main]
//! async fn main() -> script_delegate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut delegate = DelegateImpl::from_config(&config.target)?;
//!     let statements = vec![
//!         "DROP TABLE IF EXISTS users".to_string(),
//!         "CREATE TABLE users (id int primary key)".to_string(),
//!     ];
//!     let summary = delegate
//!         .execute_script(&statements, "init.sql", config.execution)
//!         .await?;
//!     println!("Executed {} statements", summary.statements_executed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod reuse;

// Re-exports for convenient access
pub use config::{load_script, Config, DatabaseKind, TargetConfig};
pub use self::core::{
    DatabaseDelegate, Delegate, DelegateBackend, ExecutionPolicy, ScriptSummary, Statement,
    StatementOutcome,
};
pub use drivers::{
    CassandraContainer, CassandraDelegate, ContainerlessSqlDelegate, DelegateImpl, SqlConnection,
    SqlContainer, SqlDelegate,
};
pub use error::{DelegateError, DriverError, Result};
pub use reuse::{ConflictBehaviour, ReuseConfig, ReuseConfigBuilder};
