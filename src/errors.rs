use derive_more::Display;
use diesel::result::{DatabaseErrorKind, Error as DBError};

/// A field constraint a todo failed to satisfy.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[display(fmt = "Title is required")]
    TitleRequired,

    #[display(fmt = "Title cannot be empty")]
    TitleEmpty,

    #[display(fmt = "Title cannot exceed 200 characters")]
    TitleTooLong,

    #[display(fmt = "Description cannot exceed 1000 characters")]
    DescriptionTooLong,
}

impl std::error::Error for ValidationError {}

/// Failure kinds of the data access layer.
///
/// The HTTP layer decides what each kind means for a client, see
/// `api::errors::TodoApiError`.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[display(fmt = "{}", _0)]
    Validation(ValidationError),

    #[display(fmt = "Malformed todo id: {}", _0)]
    MalformedId(String),

    #[display(fmt = "Todo not found")]
    NotFound,

    #[display(fmt = "Duplicate key: {}", _0)]
    DuplicateKey(String),

    #[display(fmt = "Store unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {}

impl From<ValidationError> for StoreError {
    fn from(error: ValidationError) -> Self {
        StoreError::Validation(error)
    }
}

impl From<DBError> for StoreError {
    fn from(error: DBError) -> Self {
        match error {
            DBError::NotFound => StoreError::NotFound,
            DBError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let message = info.details().unwrap_or_else(|| info.message());

                StoreError::DuplicateKey(message.to_string())
            }
            e => StoreError::Unavailable(e.to_string()),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        StoreError::Unavailable(error.to_string())
    }
}

impl From<uuid::Error> for StoreError {
    fn from(error: uuid::Error) -> Self {
        StoreError::MalformedId(error.to_string())
    }
}
