//! Error types for pdtlog.
//!
//! This module defines all error types used throughout the pdtlog crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pdtlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// A field value was rejected before it reached storage.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Which rule the value broke.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record, e.g. `aircraft`.
        entity: &'static str,
        /// Requested identifier.
        id: i64,
    },

    /// A unique field already holds this value.
    #[error("{entity} with {field} '{value}' already exists")]
    Conflict {
        /// Kind of record.
        entity: &'static str,
        /// The unique field.
        field: &'static str,
        /// The duplicated value.
        value: String,
    },

    /// A referenced aircraft or pilot is marked inactive.
    #[error("{entity} {id} is not active")]
    Inactive {
        /// Kind of record.
        entity: &'static str,
        /// Identifier of the inactive record.
        id: i64,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for pdtlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a field validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a unique-constraint conflict error.
    #[must_use]
    pub fn conflict(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Check if this error means a record was missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a unique-constraint conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if this error came from field validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
