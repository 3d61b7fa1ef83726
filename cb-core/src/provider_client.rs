use async_trait::async_trait;
use mockall::automock;
use reqwest::header::ACCEPT;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;

/// How a connectivity check authenticates against the third-party API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderAuth {
    None,
    Header { name: String, value: String },
    Basic { user: String, pass: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Send(#[from] reqwest_middleware::Error),
    #[error("{status} - {body}")]
    Status { status: u16, body: String },
    #[error("Error decoding response: '{message}'. Response body was: '{body}'")]
    Decode { message: String, body: String },
}

#[automock]
#[async_trait]
pub trait ProviderClientTrait: Send + Sync + Debug {
    async fn get_json(&self, url: &str, auth: &ProviderAuth) -> Result<Value, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct ProviderClient {
    pub client: ClientWithMiddleware,
}

impl ProviderClient {
    pub fn new(client: ClientWithMiddleware) -> Self {
        ProviderClient { client }
    }

    /// Sends `request` and decodes a successful JSON body into `T`.
    pub async fn make_api_call<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
        let resp = request.send().await?;

        let status = resp.status();
        let body = resp.text().await.map_err(reqwest_middleware::Error::from)?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
            message: e.to_string(),
            body,
        })
    }
}

#[async_trait]
impl ProviderClientTrait for ProviderClient {
    async fn get_json(&self, url: &str, auth: &ProviderAuth) -> Result<Value, ProviderError> {
        let request = self.client.get(url).header(ACCEPT, "application/json");

        let request = match auth {
            ProviderAuth::None => request,
            ProviderAuth::Header { name, value } => request.header(name.as_str(), value.as_str()),
            ProviderAuth::Basic { user, pass } => request.basic_auth(user, Some(pass)),
        };

        Self::make_api_call(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reqwest_helpers::{create_client, ClientOptions};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_client() -> ProviderClient {
        ProviderClient::new(create_client(None, ClientOptions::default()).unwrap())
    }

    #[tokio::test]
    async fn test_get_json_sends_api_key_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/example.com.json"))
            .and(query_param("fields", "histogram"))
            .and(header("Api-Key", "sa_api_key_1"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"histogram": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/example.com.json?version=5&fields=histogram", mock_server.uri());
        let auth = ProviderAuth::Header {
            name: "Api-Key".to_string(),
            value: "sa_api_key_1".to_string(),
        };

        let value = provider_client().get_json(&url, &auth).await.unwrap();

        assert_eq!(value, json!({"histogram": []}));
    }

    #[tokio::test]
    async fn test_get_json_sends_basic_auth() {
        let mock_server = MockServer::start().await;

        // "token:key" base64 encoded
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("authorization", "Basic dG9rZW46a2V5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "pong!"})))
            .mount(&mock_server)
            .await;

        let auth = ProviderAuth::Basic {
            user: "token".to_string(),
            pass: "key".to_string(),
        };

        let value = provider_client()
            .get_json(&format!("{}/ping", mock_server.uri()), &auth)
            .await
            .unwrap();

        assert_eq!(value["data"], "pong!");
    }

    #[tokio::test]
    async fn test_get_json_surfaces_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let err = provider_client()
            .get_json(&format!("{}/ping", mock_server.uri()), &ProviderAuth::None)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
        assert_eq!(err.to_string(), "401 - Unauthorized");
    }

    #[tokio::test]
    async fn test_get_json_rejects_non_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not found</html>"))
            .mount(&mock_server)
            .await;

        let err = provider_client()
            .get_json(&format!("{}/nope.json", mock_server.uri()), &ProviderAuth::None)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Decode { ref body, .. } if body == "<html>not found</html>"));
    }
}
