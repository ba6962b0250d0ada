//! Core abstractions for backend-agnostic script execution.
//!
//! - [`statement`]: statements, execution policy and run outcomes
//! - [`traits`]: the delegate contract and the backend hooks
//! - [`delegate`]: the connection-lifecycle base every backend plugs into
//!
//! Backend variants live in the `drivers` module and only implement
//! [`DelegateBackend`]; memoization, ordering and cleanup stay here.

pub mod delegate;
pub mod statement;
pub mod traits;

pub use delegate::Delegate;
pub use statement::{ExecutionPolicy, ScriptSummary, Statement, StatementOutcome};
pub use traits::{DatabaseDelegate, DelegateBackend};
