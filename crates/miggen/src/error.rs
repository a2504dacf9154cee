//! Error types for miggen

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for miggen operations
pub type MiggenResult<T> = Result<T, MiggenError>;

/// Coarse classification of a [`MiggenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A model, struct or field the action needs does not exist.
    NotFound,
    /// An argument is malformed (bad identifier, empty column spec, ...).
    InvalidInput,
    /// The filesystem refused a read, write, rename or lock.
    Io,
    /// The registry file no longer has the shape miggen generated.
    CorruptRegistry,
}

/// Error type for generator operations
#[derive(Debug, Error)]
pub enum MiggenError {
    /// Model, struct header or field not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error with the path it happened on
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another invocation holds the lock file
    #[error("another miggen invocation is running (lock file {} exists)", path.display())]
    Locked { path: PathBuf },

    /// Registry anchors missing or duplicated
    #[error("Corrupt registry {}: {message}", path.display())]
    CorruptRegistry { path: PathBuf, message: String },

    /// Template placeholder could not be resolved
    #[error("Template error: {0}")]
    Template(String),
}

impl MiggenError {
    /// Create an IO error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MiggenError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a corrupt-registry error.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MiggenError::CorruptRegistry {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MiggenError::NotFound(_) => ErrorKind::NotFound,
            MiggenError::InvalidInput(_) => ErrorKind::InvalidInput,
            MiggenError::Io { .. } | MiggenError::Locked { .. } => ErrorKind::Io,
            MiggenError::CorruptRegistry { .. } | MiggenError::Template(_) => {
                ErrorKind::CorruptRegistry
            }
        }
    }

    /// `NotFound` and `InvalidInput` leave every file untouched and can be
    /// reported as a warning; everything else aborts the action.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::InvalidInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_kinds() {
        assert!(MiggenError::NotFound("model Order".into()).is_recoverable());
        assert!(MiggenError::InvalidInput("bad".into()).is_recoverable());
        assert!(!MiggenError::corrupt("migration/migration.go", "x").is_recoverable());
        assert!(!MiggenError::Template("x".into()).is_recoverable());

        let err = MiggenError::io(
            "model/order.go",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("model/order.go"));
    }

    #[test]
    fn lock_is_io_class() {
        let err = MiggenError::Locked {
            path: PathBuf::from("migration/.miggen.lock"),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!err.is_recoverable());
    }
}
