use serde::Serialize;
use thiserror::Error;

use crate::constants::MIN_PASSWORD_LENGTH;

/// A single field-level validation failure, surfaced verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Coarse classification the API layer maps to a fixed status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed on {0}")]
    Validation(FieldError),

    /// Bad credentials. Deliberately silent about which factor failed.
    #[error("unable to authenticate with the provided credentials")]
    Authentication,

    #[error("invalid token")]
    InvalidToken,

    #[error("account is inactive")]
    InactiveAccount,

    /// Also covers ownership violations: a record owned by another account
    /// is indistinguishable from one that does not exist.
    #[error("not found")]
    NotFound,

    #[error("{0} id does not resolve to an entity owned by the caller")]
    InvalidAssociation(&'static str),

    #[error("payload does not decode as a supported raster image")]
    InvalidImage,

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("media i/o failure: {0}")]
    Media(#[from] std::io::Error),

    #[error("password hashing failure")]
    PasswordHash,
}

impl StoreError {
    pub fn invalid_email() -> Self {
        Self::Validation(FieldError::new("email", "must be a valid email address"))
    }

    pub fn duplicate_email() -> Self {
        Self::Validation(FieldError::new("email", "is already registered"))
    }

    pub fn password_too_short() -> Self {
        Self::Validation(FieldError::new(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        ))
    }

    pub fn empty_name(field: &'static str) -> Self {
        Self::Validation(FieldError::new(field, "cannot be blank"))
    }

    pub fn negative_number(field: &'static str) -> Self {
        Self::Validation(FieldError::new(field, "cannot be negative"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidAssociation(_) | Self::InvalidImage => {
                ErrorKind::Validation
            }
            Self::Authentication | Self::InvalidToken | Self::InactiveAccount => {
                ErrorKind::Authentication
            }
            Self::NotFound => ErrorKind::NotFound,
            Self::Storage(_) | Self::Media(_) | Self::PasswordHash => ErrorKind::Internal,
        }
    }
}

impl From<argon2::password_hash::Error> for StoreError {
    fn from(_: argon2::password_hash::Error) -> Self {
        Self::PasswordHash
    }
}
