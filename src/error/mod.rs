use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;
use crate::tokens::TokenError;
use crate::viewport::ViewportError;

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Machine-readable error category reported alongside every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Persistence,
    MalformedInput,
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Persistence => "persistence",
            Self::MalformedInput => "malformed_input",
            Self::Configuration => "configuration",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode output")]
    Encode(#[from] serde_json::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Token(err) => err.kind(),
            Self::Storage(_) | Self::ReadFile { .. } | Self::WriteFile { .. } | Self::Encode(_) => {
                ErrorKind::Persistence
            }
            Self::Viewport(_) => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenKind;

    #[test]
    fn token_errors_keep_their_kind() {
        let err = AppError::from(TokenError::Conflict {
            kind: TokenKind::Fluid,
            name: "h1".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "fluid token \"h1\" already exists");
    }

    #[test]
    fn storage_errors_are_persistence() {
        let err = AppError::from(StorageError::MissingHomeDirectory);
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn kind_labels_are_snake_case() {
        assert_eq!(ErrorKind::MalformedInput.to_string(), "malformed_input");
        assert_eq!(
            serde_json::to_string(&ErrorKind::NotFound).unwrap(),
            "\"not_found\""
        );
    }
}
