use cb_core::provider_client::{ProviderClient, ProviderError};
use cb_domain::{GenerateDashboardRequest, GenerateDashboardResponse, ProjectId, Provider, TemplateConfig};
use reqwest_middleware::ClientWithMiddleware;

/// Talks to the template endpoints of a running `cb-server`.
#[derive(Debug, Clone)]
pub struct ChartbrewClient {
    client: ClientWithMiddleware,
    api_host: String,
}

impl ChartbrewClient {
    pub fn new(client: ClientWithMiddleware, api_host: impl Into<String>) -> Self {
        Self {
            client,
            api_host: api_host.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn get_template(&self, provider: Provider) -> Result<TemplateConfig, ProviderError> {
        ProviderClient::make_api_call(self.client.get(format!("{}/template/{}", self.api_host, provider))).await
    }

    pub async fn generate_dashboard(&self, project_id: ProjectId, request: &GenerateDashboardRequest) -> Result<GenerateDashboardResponse, ProviderError> {
        ProviderClient::make_api_call(
            self.client
                .post(format!("{}/project/{}/template/{}", self.api_host, project_id, request.provider))
                .json(&request.body),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_core::reqwest_helpers::{create_client, ClientOptions};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_posts_form_payload_with_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/project/12/template/chartmogul"))
            .and(header("authorization", "Bearer brew"))
            .and(body_json(json!({"token": "t", "key": "k", "charts": [1]})))
            .respond_with(ResponseTemplate::new(403).set_body_string("403"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ChartbrewClient::new(create_client(Some("brew".to_string()), ClientOptions::default()).unwrap(), mock_server.uri());
        let request = GenerateDashboardRequest {
            provider: Provider::ChartMogul,
            body: json!({"token": "t", "key": "k", "charts": [1]}),
        };

        let err = client.generate_dashboard(ProjectId(12), &request).await.unwrap_err();

        assert_eq!(err.to_string(), "403 - 403");
    }

    #[tokio::test]
    async fn test_get_template_decodes_catalog() {
        let mock_server = MockServer::start().await;
        let catalog = cb_core::templates::simple_analytics::template("{website}", None, 0);

        Mock::given(method("GET"))
            .and(path("/template/simpleanalytics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&catalog))
            .mount(&mock_server)
            .await;

        let client = ChartbrewClient::new(create_client(None, ClientOptions::default()).unwrap(), format!("{}/", mock_server.uri()));

        assert_eq!(client.get_template(Provider::SimpleAnalytics).await.unwrap(), catalog);
    }
}
