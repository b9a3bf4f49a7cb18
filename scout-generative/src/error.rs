//! HTTP status / body classification for the generative backend.

use scout_errors::ScoutError;
use reqwest::StatusCode;

/// Classify an HTTP error response from the generative backend into a
/// typed [`ScoutError`], the same layered typed-status-then-body approach
/// `map_http_status` uses for the Anthropic Messages API.
pub fn map_http_status(status: StatusCode, body: &str) -> ScoutError {
    match status.as_u16() {
        401 | 403 => ScoutError::ApiPermissionDenied(body.to_string()),
        400 | 422 => ScoutError::ApiInvalidArgument(body.to_string()),
        404 => ScoutError::ApiNotFound(body.to_string()),
        429 => ScoutError::ApiQuotaExceeded(body.to_string()),
        500..=599 => ScoutError::NetworkError(format!("backend returned {status}: {body}")),
        _ => ScoutError::Other(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("unexpected status {status}: {body}"),
        ))),
    }
}

/// Classify a transport-level `reqwest` failure.
pub fn map_reqwest_error(err: reqwest::Error) -> ScoutError {
    if err.is_timeout() || err.is_connect() {
        ScoutError::NetworkError(err.to_string())
    } else {
        ScoutError::Other(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_401_to_permission_denied() {
        assert!(matches!(map_http_status(StatusCode::UNAUTHORIZED, "no"), ScoutError::ApiPermissionDenied(_)));
    }

    #[test]
    fn maps_429_to_quota_exceeded() {
        assert!(matches!(map_http_status(StatusCode::TOO_MANY_REQUESTS, "slow down"), ScoutError::ApiQuotaExceeded(_)));
    }

    #[test]
    fn maps_5xx_to_network_error() {
        assert!(matches!(map_http_status(StatusCode::BAD_GATEWAY, "oops"), ScoutError::NetworkError(_)));
    }

    #[test]
    fn maps_404_to_not_found() {
        assert!(matches!(map_http_status(StatusCode::NOT_FOUND, "missing"), ScoutError::ApiNotFound(_)));
    }
}
