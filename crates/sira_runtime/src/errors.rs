use serde::{Deserialize, Serialize};
use std::fmt;

/// Main result type for SIRA runtime operations
pub type SiraResult<T> = Result<T, SiraError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Lookup
    EntityNotFound,

    // Data
    DimensionMismatch,
    InvalidData,
    IoError,

    // Cache
    CacheError,

    // Config & Init
    ConfigError,

    // Serialization
    SerializationError,
    DeserializationError,

    InternalError,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCategory {
    System,
    Configuration,
    Lookup,
    Data,
    Cache,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone)]
pub struct SiraError {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub message: String,
}

impl SiraError {
    pub fn new(
        code: ErrorCode,
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: &str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for SiraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.category, self.code, self.message)
    }
}

impl std::error::Error for SiraError {}

impl SiraError {
    pub fn category(&self) -> &ErrorCategory {
        &self.category
    }

    pub fn severity(&self) -> &ErrorSeverity {
        &self.severity
    }

    /// True when the queried entity does not exist in the vector store.
    pub fn is_not_found(&self) -> bool {
        matches!(self.code, ErrorCode::EntityNotFound)
    }

    /// Creates a "student not found" error
    pub fn not_found(student_id: i64) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            ErrorCategory::Lookup,
            ErrorSeverity::Low,
            &format!("Student {} not found", student_id),
        )
    }

    /// Creates an error for two vectors of differing length
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(
            ErrorCode::DimensionMismatch,
            ErrorCategory::Data,
            ErrorSeverity::High,
            &format!("Dimension mismatch: expected {}, got {}", expected, actual),
        )
    }

    /// Creates an error for a malformed vector table
    pub fn invalid_data(message: &str) -> Self {
        Self::new(
            ErrorCode::InvalidData,
            ErrorCategory::Data,
            ErrorSeverity::High,
            message,
        )
    }

    /// Creates an error for a failing result cache
    pub fn cache_error(message: &str) -> Self {
        Self::new(
            ErrorCode::CacheError,
            ErrorCategory::Cache,
            ErrorSeverity::High,
            message,
        )
    }

    /// Creates a configuration error
    pub fn config_error(message: &str) -> Self {
        Self::new(
            ErrorCode::ConfigError,
            ErrorCategory::Configuration,
            ErrorSeverity::Critical,
            message,
        )
    }
}

impl From<std::io::Error> for SiraError {
    fn from(err: std::io::Error) -> Self {
        SiraError::new(
            ErrorCode::IoError,
            ErrorCategory::Data,
            ErrorSeverity::High,
            &format!("IO error: {}", err),
        )
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SiraError {
    fn from(err: serde_json::Error) -> Self {
        let code = if err.is_data() || err.is_syntax() || err.is_eof() {
            ErrorCode::DeserializationError
        } else {
            ErrorCode::SerializationError
        };
        SiraError::new(
            code,
            ErrorCategory::System,
            ErrorSeverity::Medium,
            &format!("JSON serialization error: {}", err),
        )
    }
}
