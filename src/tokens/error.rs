use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::fluid::FluidError;

pub type TokenResult<T> = std::result::Result<T, TokenError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Fluid,
    Static,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fluid => f.write_str("fluid token"),
            Self::Static => f.write_str("static token"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TokenError {
    #[error("token name {raw:?} is empty after sanitization")]
    InvalidName { raw: String },
    #[error("{field} must be a positive number, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be at most {limit}, got {value}")]
    TooLarge {
        field: &'static str,
        value: f64,
        limit: f64,
    },
    #[error("max ({max}) must not be smaller than min ({min})")]
    InvalidRange { min: f64, max: f64 },
    #[error("invalid root unit size {value:?}; expected \"62.5%\" or \"100%\"")]
    InvalidRootUnitSize { value: String },
    #[error("{kind} {name:?} not found")]
    NotFound { kind: TokenKind, name: String },
    #[error("{kind} {name:?} already exists")]
    Conflict { kind: TokenKind, name: String },
    #[error("malformed input: {message}")]
    MalformedInput { message: String },
    #[error(transparent)]
    Fluid(#[from] FluidError),
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName { .. }
            | Self::NonPositive { .. }
            | Self::TooLarge { .. }
            | Self::InvalidRange { .. }
            | Self::InvalidRootUnitSize { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::Fluid(FluidError::DegenerateViewport { .. }) => ErrorKind::Configuration,
            Self::Fluid(FluidError::NonPositiveUnit { .. } | FluidError::OutOfRange { .. }) => {
                ErrorKind::Validation
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_machine_readable() {
        let not_found = TokenError::NotFound {
            kind: TokenKind::Static,
            name: "gap".to_string(),
        };
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(not_found.to_string(), "static token \"gap\" not found");

        let degenerate = TokenError::from(FluidError::DegenerateViewport {
            min_px: 900.0,
            max_px: 900.0,
        });
        assert_eq!(degenerate.kind(), ErrorKind::Configuration);

        let range = TokenError::InvalidRange { min: 3.0, max: 2.0 };
        assert_eq!(range.kind(), ErrorKind::Validation);

        let overflow = TokenError::from(FluidError::OutOfRange { value: 1e20 });
        assert_eq!(overflow.kind(), ErrorKind::Validation);
    }
}
