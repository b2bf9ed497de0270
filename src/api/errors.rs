use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use derive_more::Display;

use super::dtos::envelope::Envelope;
use crate::errors::{StoreError, ValidationError};

pub const TOO_MANY_REQUESTS: &str = "Too many requests from this IP, please try again later.";

#[derive(Debug, Display)]
pub enum TodoApiError {
    #[display(fmt = "{}", _0)]
    Validation(ValidationError),

    #[display(fmt = "Invalid todo ID format")]
    MalformedId,

    #[display(fmt = "Todo not found")]
    NotFound,

    #[display(fmt = "Duplicate entry detected")]
    DuplicateKey,

    /// The body or query string could not be read into the expected shape
    #[display(fmt = "Invalid request body: {}", _0)]
    BadRequest(String),

    #[display(fmt = "{}", TOO_MANY_REQUESTS)]
    TooManyRequests,

    #[display(fmt = "Route not found: {}", _0)]
    RouteNotFound(String),

    /// `detail` is only sent to clients outside production
    #[display(fmt = "{}", message)]
    Internal {
        message: &'static str,
        detail: Option<String>,
    },
}

impl TodoApiError {
    /// Translates the kinds a client can act on; everything else becomes a
    /// 500 carrying `context` as its message.
    pub fn from_store(error: StoreError, context: &'static str, expose_detail: bool) -> Self {
        match error {
            StoreError::Validation(e) => TodoApiError::Validation(e),
            StoreError::MalformedId(_) => TodoApiError::MalformedId,
            StoreError::NotFound => TodoApiError::NotFound,
            StoreError::DuplicateKey(_) => TodoApiError::DuplicateKey,
            StoreError::Unavailable(detail) => {
                log::error!("{}: {}", context, detail);

                TodoApiError::Internal {
                    message: context,
                    detail: expose_detail.then(|| detail),
                }
            }
        }
    }

    pub fn to_response(&self) -> HttpResponse {
        self.error_response()
    }

    fn envelope(&self) -> Envelope {
        match self {
            // The two "title missing" checks answer with the reason itself,
            // length violations with a generic message plus the reason.
            TodoApiError::Validation(
                e @ (ValidationError::TitleRequired | ValidationError::TitleEmpty),
            ) => Envelope::failure(e.to_string()),
            TodoApiError::Validation(e) => {
                Envelope::failure("Validation error").error(Some(e.to_string()))
            }
            TodoApiError::BadRequest(detail) => {
                Envelope::failure("Invalid request body").error(Some(detail.clone()))
            }
            TodoApiError::RouteNotFound(path) => {
                Envelope::failure("Route not found").path(path.as_str())
            }
            TodoApiError::Internal { message, detail } => {
                Envelope::failure(*message).error(detail.clone())
            }
            e => Envelope::failure(e.to_string()),
        }
    }
}

impl ResponseError for TodoApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            TodoApiError::Validation(_)
            | TodoApiError::MalformedId
            | TodoApiError::DuplicateKey
            | TodoApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            TodoApiError::NotFound | TodoApiError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            TodoApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            TodoApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.envelope())
    }
}

impl From<ValidationError> for TodoApiError {
    fn from(error: ValidationError) -> Self {
        TodoApiError::Validation(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(error: &TodoApiError) -> serde_json::Value {
        serde_json::to_value(error.envelope()).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            TodoApiError::Validation(ValidationError::TitleTooLong).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(TodoApiError::MalformedId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(TodoApiError::DuplicateKey.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(TodoApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            TodoApiError::TooManyRequests.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_title_required_is_the_message() {
        assert_eq!(
            body(&TodoApiError::Validation(ValidationError::TitleRequired)),
            json!({"success": false, "message": "Title is required"})
        );
    }

    #[test]
    fn test_length_violation_carries_reason_in_error() {
        assert_eq!(
            body(&TodoApiError::Validation(ValidationError::DescriptionTooLong)),
            json!({
                "success": false,
                "message": "Validation error",
                "error": "Description cannot exceed 1000 characters"
            })
        );
    }

    #[test]
    fn test_unavailable_hides_detail_in_production() {
        let err = TodoApiError::from_store(
            StoreError::Unavailable("connection refused".to_string()),
            "Server error while fetching todos",
            false,
        );

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body(&err),
            json!({"success": false, "message": "Server error while fetching todos"})
        );
    }

    #[test]
    fn test_unavailable_shows_detail_in_development() {
        let err = TodoApiError::from_store(
            StoreError::Unavailable("connection refused".to_string()),
            "Server error while fetching todos",
            true,
        );

        assert_eq!(body(&err)["error"], "connection refused");
    }

    #[test]
    fn test_store_kinds_translate() {
        let ctx = "Server error while fetching todo";

        assert!(matches!(
            TodoApiError::from_store(StoreError::NotFound, ctx, false),
            TodoApiError::NotFound
        ));
        assert!(matches!(
            TodoApiError::from_store(StoreError::MalformedId("x".into()), ctx, false),
            TodoApiError::MalformedId
        ));
        assert!(matches!(
            TodoApiError::from_store(StoreError::DuplicateKey("x".into()), ctx, false),
            TodoApiError::DuplicateKey
        ));
    }
}
