use thiserror::Error;

use super::store::{StoreError, EMAIL_UNIQUE_CONSTRAINT, SINGLE_ROOT_CONSTRAINT};

/// Failures reported by member operations
///
/// Display strings double as the user-facing messages.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Invalid Sponsor Code")]
    InvalidSponsor,

    #[error("Email already exists.")]
    DuplicateEmail,

    #[error("User Not Found")]
    NotFound,

    #[error("Invalid Login")]
    AuthenticationFailed,

    #[error("Root member already exists")]
    RootExists,

    #[error("Credential hashing failed: {0}")]
    Hashing(String),

    #[error("Storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for TreeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { ref constraint } if constraint == EMAIL_UNIQUE_CONSTRAINT => {
                TreeError::DuplicateEmail
            }
            StoreError::UniqueViolation { ref constraint } if constraint == SINGLE_ROOT_CONSTRAINT => {
                TreeError::RootExists
            }
            other => TreeError::Storage(other),
        }
    }
}
