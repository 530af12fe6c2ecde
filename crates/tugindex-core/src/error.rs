//! Error types and error code constants for tugindex.
//!
//! This module provides a unified error type (`IndexError`) for everything that
//! can abort an indexing pass, plus the program builder's structural checks.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid input (malformed program or options)
//! - `3`: Identity conflicts (two symbols claiming one moniker identifier)
//! - `10`: Internal errors (broken engine invariants)
//!
//! ## Fatal vs Skipped
//!
//! Unresolvable references are never errors: the engine skips them and counts
//! them in its stats. Every variant here aborts the pass, because continuing
//! would produce a graph with duplicate or missing canonical identities.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Error Codes
// ============================================================================

/// Stable numeric codes for [`IndexError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// The semantic model or the options are malformed.
    InvalidInput = 2,
    /// Two distinct sources claim the same moniker identifier.
    IdentityConflict = 3,
    /// The engine reached a state its invariants rule out.
    InternalError = 10,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for an indexing pass.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The program handed to the engine is structurally invalid.
    #[error("invalid program: {message}")]
    InvalidProgram { message: String },

    /// Index options failed validation.
    #[error("invalid options: {message}")]
    InvalidOptions { message: String },

    /// A symbol's parent chain loops back on itself.
    #[error("parent cycle detected at symbol {symbol}")]
    ParentCycle { symbol: String },

    /// Two distinct symbols claim the same export identifier.
    #[error("moniker '{identifier}' claimed by {existing} and {incoming} (in {document})")]
    MonikerConflict {
        identifier: String,
        existing: String,
        incoming: String,
        document: String,
    },

    /// Two distinct canonical keys hashed to the same local identifier.
    #[error("local moniker '{identifier}' collides: {first} vs {second}")]
    LocalMonikerCollision {
        identifier: String,
        first: String,
        second: String,
    },

    /// An engine invariant was violated.
    #[error("internal invariant violated: {message}")]
    Invariant { message: String },

    /// JSON (de)serialization error, e.g. while loading options.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout tugindex.
pub type Result<T> = std::result::Result<T, IndexError>;

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&IndexError> for ErrorCode {
    fn from(err: &IndexError) -> Self {
        match err {
            IndexError::InvalidProgram { .. } => ErrorCode::InvalidInput,
            IndexError::InvalidOptions { .. } => ErrorCode::InvalidInput,
            IndexError::Json(_) => ErrorCode::InvalidInput,
            IndexError::ParentCycle { .. } => ErrorCode::InvalidInput,
            IndexError::MonikerConflict { .. } => ErrorCode::IdentityConflict,
            IndexError::LocalMonikerCollision { .. } => ErrorCode::IdentityConflict,
            IndexError::Invariant { .. } => ErrorCode::InternalError,
        }
    }
}

impl From<IndexError> for ErrorCode {
    fn from(err: IndexError) -> Self {
        ErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl IndexError {
    /// Create an invalid program error.
    pub fn invalid_program(message: impl Into<String>) -> Self {
        IndexError::InvalidProgram {
            message: message.into(),
        }
    }

    /// Create an invalid options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        IndexError::InvalidOptions {
            message: message.into(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        IndexError::Invariant {
            message: message.into(),
        }
    }

    /// Get the stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
