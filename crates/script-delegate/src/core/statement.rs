//! Statements, execution policy, and per-run outcomes.

use serde::{Deserialize, Serialize};

/// One statement of a script, as handed to a backend.
///
/// The line number is 1-based and, together with the script path, is only
/// used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    /// Literal statement text, executed verbatim.
    pub text: &'a str,
    /// 1-based position of the statement within its script.
    pub line_number: usize,
    /// Path of the originating script.
    pub script_path: &'a str,
}

impl<'a> Statement<'a> {
    /// Create a statement reference.
    pub fn new(text: &'a str, line_number: usize, script_path: &'a str) -> Self {
        Self {
            text,
            line_number,
            script_path,
        }
    }

    /// Whether this is a DROP statement (trimmed, case-insensitive prefix).
    pub fn is_drop(&self) -> bool {
        self.text.trim().to_lowercase().starts_with("drop")
    }
}

/// Error tolerance for one script run.
///
/// Passed per call and never stored on a delegate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// Absorb any statement failure, log it, and continue.
    #[serde(default)]
    pub continue_on_error: bool,

    /// Absorb only failures of DROP statements.
    #[serde(default)]
    pub ignore_failed_drops: bool,
}

impl ExecutionPolicy {
    /// Create a policy from the two flags.
    pub fn new(continue_on_error: bool, ignore_failed_drops: bool) -> Self {
        Self {
            continue_on_error,
            ignore_failed_drops,
        }
    }

    /// Policy that escalates every failure.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Whether a backend rejection of `statement` is absorbed under this policy.
    pub fn absorbs(&self, statement: &Statement<'_>) -> bool {
        self.continue_on_error || (statement.is_drop() && self.ignore_failed_drops)
    }
}

/// Result of executing a single statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOutcome {
    /// The backend accepted the statement.
    Executed,
    /// The backend rejected the statement and the policy absorbed the failure.
    Absorbed,
}

/// Summary of a completed script run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSummary {
    /// Path of the script that was run.
    pub script_path: String,
    /// Statements accepted by the backend.
    pub statements_executed: usize,
    /// Statements whose failure was absorbed by the policy.
    pub statements_absorbed: usize,
}

impl ScriptSummary {
    /// Create an empty summary for a script.
    pub fn new(script_path: impl Into<String>) -> Self {
        Self {
            script_path: script_path.into(),
            ..Default::default()
        }
    }

    /// Record the outcome of one statement.
    pub fn record(&mut self, outcome: StatementOutcome) {
        match outcome {
            StatementOutcome::Executed => self.statements_executed += 1,
            StatementOutcome::Absorbed => self.statements_absorbed += 1,
        }
    }

    /// Total statements run.
    pub fn total(&self) -> usize {
        self.statements_executed + self.statements_absorbed
    }
}
