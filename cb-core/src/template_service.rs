use crate::builder::DashboardBuilder;
use crate::configuration::AppConfiguration;
use crate::error::TemplateError;
use crate::provider_client::{ProviderClient, ProviderClientTrait};
use crate::reqwest_helpers::create_client;
use crate::templates::{ChartMogulTemplate, SimpleAnalyticsTemplate, Template};
use cb_domain::{GenerateDashboardResponse, ProjectId, Provider, StoredChart, TemplateConfig};
use cb_store::ProjectBmcTrait;
use chrono::Utc;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{event, Level};

#[derive(Debug, Clone)]
pub struct TemplateService {
    templates: HashMap<Provider, Arc<dyn Template>>,
    builder: DashboardBuilder,
    bmc: Arc<dyn ProjectBmcTrait>,
}

impl TemplateService {
    pub fn new(templates: Vec<Arc<dyn Template>>, bmc: Arc<dyn ProjectBmcTrait>) -> Self {
        Self {
            templates: templates.into_iter().map(|t| (t.provider(), t)).collect(),
            builder: DashboardBuilder::new(Arc::clone(&bmc)),
            bmc,
        }
    }

    pub fn from_config(cfg: &AppConfiguration, bmc: Arc<dyn ProjectBmcTrait>) -> anyhow::Result<Self> {
        let client: Arc<dyn ProviderClientTrait> = Arc::new(ProviderClient::new(create_client(None, cfg.client_options())?));

        let templates: Vec<Arc<dyn Template>> = vec![
            Arc::new(ChartMogulTemplate::new(Arc::clone(&client), cfg.chartmogul_base_url.clone())),
            Arc::new(SimpleAnalyticsTemplate::new(Arc::clone(&client), cfg.simpleanalytics_base_url.clone())),
        ];

        Ok(Self::new(templates, bmc))
    }

    fn template(&self, provider: &str) -> Result<&Arc<dyn Template>, TemplateError> {
        Provider::from_str(provider)
            .ok()
            .and_then(|p| self.templates.get(&p))
            .ok_or_else(|| TemplateError::UnknownProvider(provider.to_string()))
    }

    pub fn catalog(&self, provider: &str) -> Result<TemplateConfig, TemplateError> {
        Ok(self.template(provider)?.catalog())
    }

    pub async fn generate(&self, provider: &str, project_id: ProjectId, params: serde_json::Value) -> Result<GenerateDashboardResponse, TemplateError> {
        let template = self.template(provider)?;

        let dashboard_order = self.bmc.max_dashboard_order(project_id).await?.unwrap_or(0);
        event!(
            Level::INFO,
            "Generating {} dashboard for project {} after position {}",
            template.provider(),
            project_id,
            dashboard_order
        );

        let prepared = template.prepare(params, dashboard_order).await.inspect_err(|err| {
            event!(Level::WARN, "{} template rejected the connection: {}", template.provider(), err);
        })?;

        self.builder.build(project_id, prepared, Utc::now()).await
    }

    pub async fn list_charts(&self, project_id: ProjectId) -> Result<Vec<StoredChart>, TemplateError> {
        Ok(self.bmc.list_charts(project_id).await?)
    }
}
