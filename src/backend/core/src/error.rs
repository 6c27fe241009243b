//! Error handling for Cutline Core.
//!
//! This module provides:
//! - A single error type with machine-readable codes and context chaining
//! - Severity classification driving the log level an error is emitted at
//! - Error logging with tracing integration
//! - Metrics integration for error tracking
//!
//! Contract violations (an out-of-range process id, a clock of the wrong
//! width, a second termination signal from the same process) are not
//! represented here: they panic at the call site.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cutline_core::error::{CutlineError, Result};
//!
//! fn load(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .map_err(|e| CutlineError::from(e).with_context("path", path))
//! }
//! ```

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::predicate::PredicateId;

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for Cutline operations.
pub type Result<T> = std::result::Result<T, CutlineError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Detection Errors (1000-1099)
    PredicateNotRegistered,
    PredicateEvaluationFailed,
    DuplicatePredicateBinding,
    InvalidProcessPair,
    UnknownPredicate,

    // Trace Errors (1100-1199)
    InvalidTrace,
    ClockWidthMismatch,
    NonMonotonicClock,

    // Serialization Errors (2200-2299)
    SerializationError,
    DeserializationError,
    InvalidJson,

    // I/O Errors (2300-2399)
    IoError,
    FileNotFound,

    // Configuration Errors (5000-5099)
    ConfigurationError,
    MissingConfiguration,
    InvalidConfiguration,

    // Internal Errors (9000-9099)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::PredicateNotRegistered => 1000,
            Self::PredicateEvaluationFailed => 1001,
            Self::DuplicatePredicateBinding => 1002,
            Self::InvalidProcessPair => 1003,
            Self::UnknownPredicate => 1004,

            Self::InvalidTrace => 1100,
            Self::ClockWidthMismatch => 1101,
            Self::NonMonotonicClock => 1102,

            Self::SerializationError => 2200,
            Self::DeserializationError => 2201,
            Self::InvalidJson => 2202,

            Self::IoError => 2300,
            Self::FileNotFound => 2301,

            Self::ConfigurationError => 5000,
            Self::MissingConfiguration => 5001,
            Self::InvalidConfiguration => 5002,

            Self::InternalError => 9000,
        }
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            1000..=1099 => "detection",
            1100..=1199 => "trace",
            2200..=2299 => "serialization",
            2300..=2399 => "io",
            5000..=5099 => "configuration",
            9000..=9099 => "internal",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Bad input: malformed traces, invalid configuration
    Low,
    /// A single predicate check failed; other results stand
    Medium,
    /// I/O and serialization failures
    High,
    /// Bugs
    Critical,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::InvalidTrace
            | ErrorCode::ClockWidthMismatch
            | ErrorCode::NonMonotonicClock
            | ErrorCode::DuplicatePredicateBinding
            | ErrorCode::InvalidProcessPair
            | ErrorCode::UnknownPredicate
            | ErrorCode::PredicateNotRegistered
            | ErrorCode::ConfigurationError
            | ErrorCode::MissingConfiguration
            | ErrorCode::InvalidConfiguration => Self::Low,

            ErrorCode::PredicateEvaluationFailed => Self::Medium,

            ErrorCode::SerializationError
            | ErrorCode::DeserializationError
            | ErrorCode::InvalidJson
            | ErrorCode::IoError
            | ErrorCode::FileNotFound => Self::High,

            ErrorCode::InternalError => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Details
// ═══════════════════════════════════════════════════════════════════════════════

/// Additional structured details about an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Additional context key-value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    /// Suggested action for resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggested_action = Some(suggestion.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for Cutline Core.
#[derive(Error, Debug)]
pub struct CutlineError {
    /// Machine-readable error code
    code: ErrorCode,

    /// Short message describing what went wrong
    message: Cow<'static, str>,

    /// Detailed internal message (for logging)
    internal_message: Option<String>,

    /// Additional structured details
    details: ErrorDetails,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for CutlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl CutlineError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new error with code and message.
    pub fn new(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            message: message.into(),
            internal_message: None,
            details: ErrorDetails::default(),
            source: None,
        };
        error.record_metrics();
        error
    }

    /// Create an error with both a short and an internal message.
    pub fn with_internal(
        code: ErrorCode,
        message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(ErrorCode::InternalError, "An internal error occurred", message)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Add error details.
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = details;
        self
    }

    /// Add context to details.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.context.insert(key.into(), v);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();

        match self.severity() {
            ErrorSeverity::Critical => {
                error!(
                    error_code = %code,
                    category = category,
                    message = %self.message,
                    internal_message = ?self.internal_message,
                    details = ?self.details,
                    source = ?self.source,
                    "CRITICAL ERROR"
                );
            }
            ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    message = %self.message,
                    internal_message = ?self.internal_message,
                    "High severity error"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    message = %self.message,
                    internal_message = ?self.internal_message,
                    "Medium severity error"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    message = %self.message,
                    "Low severity error"
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Metrics
    // ─────────────────────────────────────────────────────────────────────────

    fn record_metrics(&self) {
        counter!(
            "cutline_errors_total",
            "code" => self.code.to_string(),
            "category" => self.code.category().to_string(),
            "severity" => format!("{:?}", self.severity()),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Common Error Types
// ═══════════════════════════════════════════════════════════════════════════════

impl From<serde_json::Error> for CutlineError {
    fn from(error: serde_json::Error) -> Self {
        let code = if error.is_syntax() || error.is_data() {
            ErrorCode::DeserializationError
        } else if error.is_eof() {
            ErrorCode::InvalidJson
        } else {
            ErrorCode::SerializationError
        };

        Self::with_internal(code, "Failed to process JSON data", error.to_string())
            .with_source(error)
    }
}

impl From<std::io::Error> for CutlineError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let (code, msg) = match error.kind() {
            ErrorKind::NotFound => (ErrorCode::FileNotFound, "File not found"),
            _ => (ErrorCode::IoError, "An I/O error occurred"),
        };

        Self::with_internal(code, msg, error.to_string()).with_source(error)
    }
}

impl From<anyhow::Error> for CutlineError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<CutlineError>() {
            Ok(cutline_error) => cutline_error,
            Err(error) => Self::internal(error.to_string()),
        }
    }
}

impl From<config::ConfigError> for CutlineError {
    fn from(error: config::ConfigError) -> Self {
        let (code, msg) = match &error {
            config::ConfigError::NotFound(_) => (
                ErrorCode::MissingConfiguration,
                "Required configuration not found",
            ),
            config::ConfigError::PathParse(_) | config::ConfigError::FileParse { .. } => (
                ErrorCode::InvalidConfiguration,
                "Configuration file is invalid",
            ),
            _ => (ErrorCode::ConfigurationError, "Configuration error occurred"),
        };

        Self::with_internal(code, msg, error.to_string())
    }
}

impl From<tokio::task::JoinError> for CutlineError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "Detection task did not complete",
            error.to_string(),
        )
        .with_source(error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Convenience Constructors for Domain Errors
// ═══════════════════════════════════════════════════════════════════════════════

impl CutlineError {
    /// A predicate is bound in the configuration but no callback was registered.
    pub fn predicate_not_registered(predicate: PredicateId) -> Self {
        Self::new(
            ErrorCode::PredicateNotRegistered,
            format!("No callback registered for {}", predicate),
        )
        .with_details(
            ErrorDetails::new()
                .with_context("predicate", predicate.index())
                .with_suggestion("Register the predicate in the PredicateTable or drop its binding"),
        )
    }

    /// A predicate callback panicked while being evaluated.
    pub fn predicate_evaluation_failed(predicate: PredicateId, reason: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::PredicateEvaluationFailed,
            format!("Evaluation of {} failed", predicate),
            reason,
        )
        .with_context("predicate", predicate.index())
    }

    /// The same predicate appears in more than one binding.
    pub fn duplicate_predicate_binding(predicate: PredicateId) -> Self {
        Self::new(
            ErrorCode::DuplicatePredicateBinding,
            format!("{} is bound more than once", predicate),
        )
        .with_context("predicate", predicate.index())
    }

    /// A binding names a process pair that cannot exist in this run.
    pub fn invalid_process_pair(i: usize, j: usize, process_count: usize) -> Self {
        Self::new(
            ErrorCode::InvalidProcessPair,
            format!(
                "Invalid process pair ({}, {}) for {} processes",
                i, j, process_count
            ),
        )
        .with_context("process_i", i)
        .with_context("process_j", j)
        .with_context("process_count", process_count)
    }

    /// A predicate number outside the closed set.
    pub fn unknown_predicate(index: usize) -> Self {
        Self::new(
            ErrorCode::UnknownPredicate,
            format!(
                "Unknown predicate {}: expected 0..={}",
                index,
                PredicateId::COUNT - 1
            ),
        )
        .with_context("predicate", index)
    }

    /// A recorded trace is structurally malformed.
    pub fn invalid_trace(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTrace, message.into())
    }

    /// A clock in a trace does not have one slot per process.
    pub fn clock_width_mismatch(process: usize, event: usize, width: usize, expected: usize) -> Self {
        Self::new(
            ErrorCode::ClockWidthMismatch,
            format!(
                "Event {} of process {} has a clock of width {}, expected {}",
                event, process, width, expected
            ),
        )
        .with_context("process", process)
        .with_context("event", event)
    }

    /// A process's own clock slot did not strictly increase between events.
    pub fn non_monotonic_clock(process: usize, event: usize, previous: u64, current: u64) -> Self {
        Self::new(
            ErrorCode::NonMonotonicClock,
            format!(
                "Event {} of process {} does not advance its own clock slot ({} -> {})",
                event, process, previous, current
            ),
        )
        .with_context("process", process)
        .with_context("event", event)
    }

    /// An event's clock forgets part of what the previous event of the same
    /// process had already seen.
    pub fn clock_regression(process: usize, event: usize) -> Self {
        Self::new(
            ErrorCode::NonMonotonicClock,
            format!(
                "Event {} of process {} does not causally follow the event before it",
                event, process
            ),
        )
        .with_context("process", process)
        .with_context("event", event)
    }

    /// Configuration values that parse but make no sense together.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
