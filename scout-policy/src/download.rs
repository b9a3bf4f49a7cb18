//! Checked HTTP GET: redirects are disabled at the transport level and
//! re-validated manually, so a malicious `Location` header can never steer a
//! fetch past [`validate_url`] once the initial URL has cleared it.

use crate::url_policy::{validate_url_resolved, UrlPolicyConfig};
use scout_errors::ScoutError;
use tracing::debug;

/// Maximum number of redirect hops [`download_checked`] will follow.
pub const MAX_REDIRECTS: u32 = 5;

/// Issue a GET against `url`, manually following and re-validating redirects.
///
/// Every hop is re-validated through [`validate_url_resolved`] before the
/// client follows it, so a backend that redirects to `http://169.254.169.254/`
/// is caught on the second hop even though the original URL was clean.
pub async fn download_checked(
    client: &reqwest::Client,
    url: &str,
    policy: &UrlPolicyConfig,
) -> Result<reqwest::Response, ScoutError> {
    let mut current = validate_url_resolved(url, policy).await?;

    for hop in 0..=MAX_REDIRECTS {
        debug!(url = %current, hop, "download_checked: issuing request");
        let response = client
            .get(current.clone())
            .send()
            .await
            .map_err(|e| ScoutError::NetworkError(format!("{current}: {e}")))?;

        if !response.status().is_redirection() {
            return Ok(response);
        }
        if hop == MAX_REDIRECTS {
            return Err(ScoutError::UrlPolicyDenied(format!(
                "{url}: exceeded max redirect depth of {MAX_REDIRECTS}"
            )));
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ScoutError::UrlPolicyDenied(format!("{current}: redirect with no Location header")))?;

        let next = current.join(location).map_err(|e| {
            ScoutError::UrlPolicyDenied(format!("{current}: malformed redirect location {location}: {e}"))
        })?;
        current = validate_url_resolved(next.as_str(), policy).await?;
    }

    unreachable!("loop always returns within MAX_REDIRECTS + 1 iterations")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loopback_policy() -> UrlPolicyConfig {
        UrlPolicyConfig { allow_http_loopback: true, deny_private_addresses: false }
    }

    #[tokio::test]
    async fn follows_a_single_redirect_to_a_validated_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", format!("{}/final", server.uri())))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/final"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build().unwrap();
        let response = download_checked(&client, &format!("{}/start", server.uri()), &loopback_policy())
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn fails_closed_on_redirect_loop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", format!("{}/loop", server.uri())))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build().unwrap();
        let err = download_checked(&client, &format!("{}/loop", server.uri()), &loopback_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::UrlPolicyDenied(_)));
    }

    #[tokio::test]
    async fn returns_non_redirect_response_directly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_string("direct"))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build().unwrap();
        let response = download_checked(&client, &format!("{}/direct", server.uri()), &loopback_policy())
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), "direct");
    }
}
