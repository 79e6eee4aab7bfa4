//! Core error types for dayweave-core.
//!
//! Pure engine components reject malformed input through [`ValidationError`].
//! "Nothing fits" is never an error: it is reported as data by the assigner.
//! Remote failures surface as [`PersistenceError`] and are recovered by the
//! caller (the drag path rolls back its optimistic mutation).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dayweave-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed input rejected at the boundary
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Remote confirmation or storage failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An external collaborator (calendar, task extraction) failed
    #[error("Collaborator '{service}' failed: {message}")]
    Collaborator { service: String, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A time string that is neither `HH:MM` nor RFC 3339
    #[error("Malformed time '{value}': expected HH:MM or an ISO-8601 timestamp")]
    MalformedTime { value: String },

    /// A date string that is not `YYYY-MM-DD`
    #[error("Malformed date '{value}': expected YYYY-MM-DD")]
    MalformedDate { value: String },

    /// Interval whose end does not come after its start
    #[error("Invalid interval: end ({end}) must be greater than start ({start})")]
    InvalidInterval { start: u32, end: u32 },

    /// Minute value outside the day
    #[error("Minute {value} lies outside the day [0, 1440]")]
    OutOfDay { value: u32 },

    /// Sleep window covering the whole day
    #[error("Sleep window {start}-{end} covers 24 hours or more")]
    SleepWindowTooLong { start: String, end: String },

    /// Duration that is zero or longer than a day
    #[error("Invalid duration for '{task}': {minutes} minutes (expected 1..=1440)")]
    InvalidDuration { task: String, minutes: u32 },

    /// Too many tasks for a single pass
    #[error("Too many tasks: {count} (maximum {max} per pass)")]
    TooManyTasks { count: usize, max: usize },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Persistence errors raised by a [`ProposalRepository`](crate::repository::ProposalRepository).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The remote side refused the change
    #[error("Remote rejected the change: {0}")]
    Rejected(String),

    /// No response within the policy timeout
    #[error("Remote call timed out after {timeout_ms} ms ({attempts} attempt(s))")]
    Timeout { timeout_ms: u64, attempts: u32 },

    /// Unknown proposal id
    #[error("Proposal not found: {0}")]
    NotFound(String),

    /// Local storage failure
    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Storage(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
