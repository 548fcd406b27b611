use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use billpay_core::errors::{DatabaseError, Error as CoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Validation(_) | CoreError::AmountOutOfRange { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CoreError::NotFound(_) | CoreError::Database(DatabaseError::NotFound(_)) => {
                    StatusCode::NOT_FOUND
                }
                CoreError::Conflict(_)
                | CoreError::Database(DatabaseError::UniqueViolation(_)) => StatusCode::CONFLICT,
                CoreError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                CoreError::NoProviderAvailable { .. } | CoreError::CommissionNotConfigured(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                CoreError::Vendor(v) if v.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
                CoreError::Vendor(_) => StatusCode::BAD_GATEWAY,
                CoreError::Database(_) | CoreError::Unexpected(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let retry_after = match &self {
            ApiError::Core(CoreError::RateLimitExceeded { retry_after, .. }) => {
                HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()).ok()
            }
            _ => None,
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        let mut response = (status, body).into_response();
        if let Some(value) = retry_after {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use billpay_core::errors::ValidationError;
    use billpay_vendors::{RateWindow, ServiceCategory, VendorError};
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                CoreError::from(ValidationError::MissingField("name".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Conflict("name taken".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                CoreError::NoProviderAvailable {
                    category: ServiceCategory::Data,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CoreError::Vendor(VendorError::Timeout {
                    provider: "vtpass".to_string(),
                }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                CoreError::Vendor(VendorError::ProviderError {
                    provider: "vtpass".to_string(),
                    message: "LOW WALLET BALANCE".to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = ApiError::from(CoreError::RateLimitExceeded {
            provider: "vtpass".to_string(),
            window: RateWindow::Minute,
            retry_after: Duration::from_secs(12),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "12");
    }
}
