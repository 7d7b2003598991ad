//! Retry policy and error classification for upstream calls.

use reqwest::{Response, StatusCode};

/// Maximum number of attempts for a single upstream call.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Upstream failures that will not go away by asking again.
#[derive(Debug, Clone, PartialEq)]
pub enum NonRetryableError {
    /// Rate limit exceeded (HTTP 429, or 403 with an exhausted quota or `retry-after`)
    RateLimitExceeded(String),
    /// Authentication failed (HTTP 401)
    AuthenticationFailed(String),
    /// Resource not found (HTTP 404)
    NotFound(String),
    /// Forbidden access (HTTP 403 that is not a rate limit)
    Forbidden(String),
    /// Other client errors that won't succeed on retry
    ClientError(String),
}

impl NonRetryableError {
    /// True when the credential was rejected (401) or lacks access (403).
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            NonRetryableError::AuthenticationFailed(_) | NonRetryableError::Forbidden(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NonRetryableError::NotFound(_))
    }
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimitExceeded(msg) => {
                write!(
                    f,
                    "Rate limit exceeded: {}. Try again later or configure an API token.",
                    msg
                )
            }
            NonRetryableError::AuthenticationFailed(msg) => {
                write!(
                    f,
                    "Authentication failed: {}. Check the configured GitHub token.",
                    msg
                )
            }
            NonRetryableError::NotFound(msg) => {
                write!(f, "Not found: {}", msg)
            }
            NonRetryableError::Forbidden(msg) => {
                write!(
                    f,
                    "Access forbidden: {}. Check the token's scopes and organization access.",
                    msg
                )
            }
            NonRetryableError::ClientError(msg) => {
                write!(f, "Request error: {}", msg)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Maps an HTTP status onto a non-retryable failure.
/// Returns `None` for success and for statuses worth retrying (5xx).
pub fn classify_status(
    status: StatusCode,
    rate_limited: bool,
    url: &str,
) -> Option<NonRetryableError> {
    match status {
        s if s.is_success() => None,
        StatusCode::UNAUTHORIZED => Some(NonRetryableError::AuthenticationFailed(format!(
            "{} rejected the token",
            url
        ))),
        StatusCode::FORBIDDEN if rate_limited => Some(NonRetryableError::RateLimitExceeded(
            "GitHub API rate limit hit".to_string(),
        )),
        StatusCode::FORBIDDEN => Some(NonRetryableError::Forbidden(url.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Some(NonRetryableError::RateLimitExceeded(
            "Too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Some(NonRetryableError::NotFound(url.to_string())),
        s if s.is_client_error() => Some(NonRetryableError::ClientError(format!(
            "HTTP {} from {}",
            s.as_u16(),
            url
        ))),
        _ => None,
    }
}

/// Turns a non-2xx response into an error.
/// Client errors become a [`NonRetryableError`]; server errors stay a
/// `reqwest::Error` so the retry loop gets another go.
///
/// A 403 is a rate limit when the primary quota is exhausted or when the
/// response carries `retry-after` (secondary limit); otherwise it is an
/// authorization failure.
pub fn check_response(response: Response) -> anyhow::Result<Response> {
    let headers = response.headers();
    let quota_exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    let rate_limited = quota_exhausted || headers.contains_key("retry-after");

    if let Some(err) = classify_status(response.status(), rate_limited, response.url().as_str())
    {
        return Err(err.into());
    }

    Ok(response.error_for_status()?)
}

/// Whether another attempt could plausibly succeed.
/// Transport failures and 5xx responses are retried; anything classified
/// as [`NonRetryableError`] and body decoding failures are not.
pub fn is_retryable_error(e: &anyhow::Error) -> bool {
    if e.downcast_ref::<NonRetryableError>().is_some() {
        return false;
    }

    match e.chain().find_map(|c| c.downcast_ref::<reqwest::Error>()) {
        Some(err) if err.is_decode() => false,
        Some(err) => {
            err.is_timeout()
                || err.is_connect()
                || err.is_request()
                || err.is_body()
                || err.status().is_some_and(|s| s.is_server_error())
        }
        None => true,
    }
}

/// Extracts the classified failure from an error chain, if any.
pub fn non_retryable(e: &anyhow::Error) -> Option<&NonRetryableError> {
    e.chain().find_map(|c| c.downcast_ref::<NonRetryableError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::RateLimitExceeded("test".to_string());
        assert!(err.to_string().contains("Rate limit"));

        let err = NonRetryableError::AuthenticationFailed("test".to_string());
        assert!(err.to_string().contains("Authentication"));
        assert!(err.to_string().contains("token"));

        let err = NonRetryableError::NotFound("test".to_string());
        assert!(err.to_string().contains("Not found"));

        let err = NonRetryableError::Forbidden("test".to_string());
        assert!(err.to_string().contains("forbidden"));

        let err = NonRetryableError::ClientError("HTTP 400".to_string());
        assert!(err.to_string().contains("HTTP 400"));
    }

    #[test]
    fn test_classify_status() {
        let url = "https://api.github.com/x";
        assert_eq!(classify_status(StatusCode::OK, false, url), None);
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, false, url),
            Some(NonRetryableError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, false, url),
            Some(NonRetryableError::Forbidden(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, true, url),
            Some(NonRetryableError::RateLimitExceeded(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, false, url),
            Some(NonRetryableError::RateLimitExceeded(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, false, url),
            Some(NonRetryableError::NotFound(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, false, url),
            Some(NonRetryableError::ClientError(_))
        ));
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY, false, url),
            None
        );
    }

    #[test]
    fn test_is_auth_and_not_found() {
        assert!(NonRetryableError::AuthenticationFailed("x".into()).is_auth());
        assert!(NonRetryableError::Forbidden("x".into()).is_auth());
        assert!(!NonRetryableError::RateLimitExceeded("x".into()).is_auth());
        assert!(!NonRetryableError::NotFound("x".into()).is_auth());
        assert!(NonRetryableError::NotFound("x".into()).is_not_found());
    }

    #[test]
    fn test_is_retryable_error() {
        let err = anyhow::Error::from(NonRetryableError::NotFound("test".to_string()));
        assert!(!is_retryable_error(&err));

        let err = anyhow::anyhow!("connection reset by peer");
        assert!(is_retryable_error(&err));
    }

    #[test]
    fn test_non_retryable_survives_context() {
        let err: anyhow::Result<()> =
            Err(NonRetryableError::AuthenticationFailed("bad".into()).into());
        let err = err.context("Listing repositories").unwrap_err();

        assert!(!is_retryable_error(&err));
        assert!(non_retryable(&err).is_some_and(|e| e.is_auth()));
    }

    #[tokio::test]
    async fn test_check_response_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/").with_status(401).create_async().await;

        let response = reqwest::get(server.url()).await.unwrap();
        let err = check_response(response).unwrap_err();

        assert!(non_retryable(&err).is_some_and(|e| e.is_auth()));
    }

    #[tokio::test]
    async fn test_check_response_quota_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        let err = check_response(response).unwrap_err();

        assert!(matches!(
            non_retryable(&err),
            Some(NonRetryableError::RateLimitExceeded(_))
        ));
    }

    #[tokio::test]
    async fn test_check_response_forbidden_with_quota_left_is_auth() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "4999")
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        let err = check_response(response).unwrap_err();

        assert!(matches!(
            non_retryable(&err),
            Some(NonRetryableError::Forbidden(_))
        ));
        assert!(non_retryable(&err).is_some_and(|e| e.is_auth()));
        assert!(!is_retryable_error(&err));
    }

    #[tokio::test]
    async fn test_check_response_secondary_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "4999")
            .with_header("retry-after", "60")
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        let err = check_response(response).unwrap_err();

        assert!(matches!(
            non_retryable(&err),
            Some(NonRetryableError::RateLimitExceeded(_))
        ));
        assert!(!non_retryable(&err).is_some_and(|e| e.is_auth()));
    }

    #[tokio::test]
    async fn test_check_response_server_error_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/").with_status(503).create_async().await;

        let response = reqwest::get(server.url()).await.unwrap();
        let err = check_response(response).unwrap_err();

        assert!(non_retryable(&err).is_none());
        assert!(is_retryable_error(&err));
    }

    #[tokio::test]
    async fn test_check_response_success_passes_through() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        let response = check_response(response).unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }
}
