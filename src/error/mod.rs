//! The unified error handling system for the certificate store.

// 1. Core Types
pub use types::{CertDbError, RecordKind};

/// A unified `Result` type for the entire crate.
///
/// Every accessor operation returns this type.
pub type Result<T> = std::result::Result<T, CertDbError>;

// 2. Module declarations
pub mod macros;
pub mod types;

// 3. Context Trait for adding context to errors.
pub trait Context<T, E> {
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<CertDbError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => {
                let context_message = context().to_string();
                Err(CertDbError::Context {
                    context: context_message,
                    source: Box::new(error.into()),
                })
            }
        }
    }
}

// 4. Error kind, the caller-facing taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No record exists for a key on an operation that requires one.
    NotFound,
    /// An insert hit a key that is already taken.
    DuplicateKey,
    /// Lost a concurrent-write race after exhausting retries. Retryable.
    Conflict,
    /// Malformed or incomplete backend configuration.
    Configuration,
    /// Transport failure or unreadable stored data.
    BackendUnavailable,
    /// The caller supplied a record that violates the record model.
    InvalidRecord,
}

impl ErrorKind {
    /// Stable code used in logs and CLI output.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::Conflict => "CONFLICT",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::BackendUnavailable => "BACKEND_UNAVAILABLE",
            Self::InvalidRecord => "INVALID_RECORD",
        }
    }
}
