//! Mapping of identity API failures onto `AppError`.
//!
//! | HTTP status | AppError |
//! |-------------|----------|
//! | 400, 422 | `BadRequest` |
//! | 401 | `Unauthorized` |
//! | 403 | `Forbidden` |
//! | 404 | `NotFound` |
//! | 409 | `Conflict` |
//! | 429 | `TooManyRequests` |
//! | 502, 504 | `BadGateway` |
//! | 503 | `ServiceUnavailable` |
//! | other 5xx | `InternalError` |

use reqwest::StatusCode;

use super::models::ProblemDetail;
use crate::error::AppError;

/// Build an `AppError` from a failed response's status and body.
pub fn error_from_response(status: StatusCode, body: &str, retry_after: Option<u64>) -> AppError {
    let problem: ProblemDetail = serde_json::from_str(body).unwrap_or_default();
    let message = problem
        .detail
        .or(problem.title)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            }
        });

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::BadRequest(anyhow::anyhow!("{}", message))
        }
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(anyhow::anyhow!("{}", message)),
        StatusCode::FORBIDDEN => AppError::Forbidden(anyhow::anyhow!("{}", message)),
        StatusCode::NOT_FOUND => AppError::NotFound(anyhow::anyhow!("{}", message)),
        StatusCode::CONFLICT => AppError::Conflict(anyhow::anyhow!("{}", message)),
        StatusCode::TOO_MANY_REQUESTS => AppError::TooManyRequests(message, retry_after),
        StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => AppError::BadGateway(message),
        StatusCode::SERVICE_UNAVAILABLE => AppError::ServiceUnavailable,
        _ => AppError::InternalError(anyhow::anyhow!(
            "Unexpected status {}: {}",
            status.as_u16(),
            message
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_detail_is_preferred() {
        let body = r#"{"type":"/identity-management/error-types/2","title":"Not Found","detail":"api client not found","status":404}"#;
        let err = error_from_response(StatusCode::NOT_FOUND, body, None);
        match err {
            AppError::NotFound(e) => assert_eq!(e.to_string(), "api client not found"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_body_falls_back() {
        let err = error_from_response(StatusCode::CONFLICT, "already inactive", None);
        assert_eq!(err.detail(), "already inactive");
    }

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let err = error_from_response(StatusCode::TOO_MANY_REQUESTS, "", Some(30));
        match err {
            AppError::TooManyRequests(_, retry) => assert_eq!(retry, Some(30)),
            other => panic!("Expected TooManyRequests, got {:?}", other),
        }
    }
}
