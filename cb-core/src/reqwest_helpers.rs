use anyhow::{anyhow, Result};
use axum::http::Extensions;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use log::{debug, error};
use reqwest::header::HeaderValue;
use reqwest::{Client, Request, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub requests_per_second: u32,
    pub max_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            max_retries: 0,
        }
    }
}

pub fn create_client(maybe_bearer_token: Option<String>, options: ClientOptions) -> Result<ClientWithMiddleware> {
    let reqwest_client = Client::builder().build()?;

    let quota = Quota::per_second(NonZeroU32::new(options.requests_per_second).unwrap_or(NonZeroU32::MIN));
    let rate_limiting_middleware = RateLimitingMiddleware {
        limiter: Arc::new(RateLimiter::direct(quota)),
    };

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(options.max_retries);

    let client_builder = ClientBuilder::new(reqwest_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .with(ErrorLoggingMiddleware)
        .with(rate_limiting_middleware);

    let client = match maybe_bearer_token {
        None => client_builder.build(),
        Some(token) => client_builder
            .with(AuthenticatedHeaderMiddleware::new(&token)?)
            .build(),
    };

    Ok(client)
}

struct AuthenticatedHeaderMiddleware {
    authorization: HeaderValue,
}

impl AuthenticatedHeaderMiddleware {
    pub fn new(bearer_token: &str) -> Result<Self> {
        let authorization = HeaderValue::from_str(&format!("Bearer {}", bearer_token))
            .map_err(|e| anyhow!("Invalid bearer token: {}", e))?;

        Ok(Self { authorization })
    }
}

#[async_trait::async_trait]
impl Middleware for AuthenticatedHeaderMiddleware {
    async fn handle(&self, mut req: Request, extensions: &mut Extensions, next: Next<'_>) -> reqwest_middleware::Result<Response> {
        req.headers_mut()
            .insert(reqwest::header::AUTHORIZATION, self.authorization.clone());

        next.run(req, extensions).await
    }
}

struct RateLimitingMiddleware {
    limiter: Arc<DefaultDirectRateLimiter>,
}

#[async_trait::async_trait]
impl Middleware for RateLimitingMiddleware {
    async fn handle(&self, req: Request, extensions: &mut Extensions, next: Next<'_>) -> reqwest_middleware::Result<Response> {
        self.limiter.until_ready().await;

        next.run(req, extensions).await
    }
}

pub struct ErrorLoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for ErrorLoggingMiddleware {
    async fn handle(&self, req: Request, extensions: &mut Extensions, next: Next<'_>) -> reqwest_middleware::Result<Response> {
        let start = Instant::now();
        let method = req.method().clone();
        let url = req.url().clone();

        let result = next.run(req, extensions).await;

        let duration = start.elapsed();

        match &result {
            Ok(resp) if !resp.status().is_success() => {
                let status = resp.status();

                // a rejected connectivity check is an expected outcome for wrong credentials
                match status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                        debug!("Request rejected: {} {} - Status: {}, Duration: {:?}", method, url, status, duration)
                    }
                    _ => error!("Request failed: {} {} - Status: {}, Duration: {:?}", method, url, status, duration),
                }
            }
            Err(e) => {
                error!("Request error: {} {} - Error: {}, Duration: {:?}", method, url, e, duration);
            }
            _ => {
                debug!("Request succeeded: {} {} - Duration: {:?}", method, url, duration);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/template/chartmogul"))
            .and(header("authorization", "Bearer brew-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_client(Some("brew-token".to_string()), ClientOptions::default()).unwrap();
        let resp = client
            .get(format!("{}/template/chartmogul", mock_server.uri()))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_rejects_token_that_is_no_header_value() {
        assert!(create_client(Some("line\nbreak".to_string()), ClientOptions::default()).is_err());
    }
}
