//! Error types for the DI container

use thiserror::Error;

/// Result type alias for DI operations
pub type DiResult<T> = Result<T, DiError>;

/// Broad error categories callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A definition or parameter does not exist
    NotFound,
    /// A type or method could not be used to construct an instance
    Construction,
    /// A definition reference cycle was found
    Cycle,
    /// A configuration document or reference could not be parsed
    Config,
}

/// Errors that can occur during DI operations
#[derive(Error, Debug)]
pub enum DiError {
    /// Definition not found in the configuration
    #[error("Definition not found: {id}")]
    DefinitionNotFound { id: String },

    /// Parameter path not found in the configuration
    #[error("Parameter not found: {path}")]
    ParameterNotFound { path: String },

    /// Class name has no registered constructor
    #[error("Unknown class: {class}")]
    UnknownClass { class: String },

    /// Method does not exist on the instance's type
    #[error("Method {method} does not exist in {class}")]
    UnknownMethod { class: String, method: String },

    /// A constructor or method rejected one of its arguments
    #[error("Invalid argument {position} for {target}: {reason}")]
    InvalidArgument {
        target: String,
        position: usize,
        reason: String,
    },

    /// Instance exists but is not of the requested type
    #[error("Instance {id} is a {actual}, not a {expected}")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Circular dependency detected
    #[error("Circular dependency detected: {path}")]
    CycleDetected { path: String },

    /// A reference sigil with nothing after it
    #[error("Malformed reference: {value:?}")]
    MalformedReference { value: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiError::DefinitionNotFound { .. } | DiError::ParameterNotFound { .. } => {
                ErrorKind::NotFound
            }
            DiError::UnknownClass { .. }
            | DiError::UnknownMethod { .. }
            | DiError::InvalidArgument { .. }
            | DiError::TypeMismatch { .. } => ErrorKind::Construction,
            DiError::CycleDetected { .. } => ErrorKind::Cycle,
            DiError::MalformedReference { .. } | DiError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_construction_error(&self) -> bool {
        self.kind() == ErrorKind::Construction
    }
}
