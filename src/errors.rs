use std::collections::BTreeMap;

use actix_web::{
    error,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use derive_more::Display;
use serde::Serialize;

use crate::{db::StoreError, service::{notify::NotifyError, payment::PaymentError}};

/// Field name -> human readable problem, reported all at once.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "Validation failed")]
    Validation(FieldErrors),

    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "payment declined: {}", _0)]
    PaymentDeclined(String),

    #[display(fmt = "payment gateway unavailable")]
    PaymentUnavailable,

    #[display(fmt = "timeout")]
    Timeout,

    #[display(fmt = "Server error")]
    InternalError,
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl ApiError {
    pub fn invalid_token() -> Self {
        ApiError::Unauthorized("Token is not valid".to_string())
    }

    pub fn missing_token() -> Self {
        ApiError::Unauthorized("No token, authorization denied".to_string())
    }

    /// Returns `Ok(())` when nothing was collected, the full set otherwise.
    pub fn check(errors: FieldErrors) -> Result<(), ApiError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let errors = match self {
            ApiError::Validation(fields) => Some(fields),
            _ => None,
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(ErrorBody {
                message: self.to_string(),
                errors,
            })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            ApiError::PaymentUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            StoreError::Conflict(msg) => ApiError::BadRequest(msg),
            StoreError::Backend(msg) => {
                log::error!("storage error: {msg}");
                ApiError::InternalError
            }
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Declined(reason) => ApiError::PaymentDeclined(reason),
            PaymentError::Timeout => ApiError::Timeout,
            PaymentError::Unavailable(msg) => {
                log::error!("payment gateway error: {msg}");
                ApiError::PaymentUnavailable
            }
        }
    }
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        log::error!("notification error: {err}");
        ApiError::InternalError
    }
}

/// Body-parsing failures come back as `{message}` like every other error.
pub fn json_error_handler(err: error::JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

/// Malformed path segments (such as a bad UUID) get the same `{message}` body.
pub fn path_error_handler(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid path parameter: {err}")).into()
}
