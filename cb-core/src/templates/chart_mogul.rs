use crate::error::TemplateError;
use crate::provider_client::{ProviderAuth, ProviderClientTrait};
use crate::templates::{PreparedTemplate, Template};
use async_trait::async_trait;
use cb_domain::{
    Chart, ChartMode, ChartMogulParams, ChartSubType, ChartTid, ChartType, Connection, ConnectionAuth, ConnectionType, DataRequest, Dataset, FillColor,
    Provider, TemplateConfig, TimeInterval, YAxisOperation,
};
use chrono::{Months, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{event, Level};

pub const CHART_MOGUL_HOST: &str = "https://api.chartmogul.com/v1";

#[derive(Debug, Clone)]
pub struct ChartMogulTemplate {
    client: Arc<dyn ProviderClientTrait>,
    api_base_url: String,
}

impl ChartMogulTemplate {
    pub fn new(client: Arc<dyn ProviderClientTrait>, api_base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Metric routes always cover the twelve months up to `today`.
fn metrics_route(metric: &str, today: NaiveDate) -> DataRequest {
    let start = today.checked_sub_months(Months::new(12)).unwrap_or(today);

    DataRequest {
        route: format!(
            "/metrics/{}?start-date={}&end-date={}&interval=month",
            metric,
            start.format("%Y-%m-%d"),
            today.format("%Y-%m-%d")
        ),
    }
}

fn metric_dataset(legend: &str, color: &str, endpoint: &str, field: &str, today: NaiveDate) -> Dataset {
    Dataset {
        legend: legend.to_string(),
        dataset_color: color.to_string(),
        fill: Some(false),
        fill_color: FillColor::Single("rgba(0,0,0,0)".to_string()),
        multi_fill: false,
        date_field: Some("root.entries[].date".to_string()),
        x_axis: "root.entries[].date".to_string(),
        y_axis: format!("root.entries[].{}", field),
        y_axis_operation: YAxisOperation::None,
        data_request: metrics_route(endpoint, today),
    }
}

fn kpi_chart(tid: u32, name: &str, dashboard_order: i32, dataset: Dataset) -> Chart {
    Chart {
        tid: ChartTid(tid),
        name: name.to_string(),
        chart_size: 1,
        current_end_date: Some(false),
        dashboard_order,
        display_legend: false,
        draft: false,
        include_zeros: true,
        mode: ChartMode::Kpi,
        public: false,
        sub_type: ChartSubType::AddTimeseries,
        time_interval: TimeInterval::Month,
        chart_type: ChartType::Line,
        datasets: vec![dataset],
    }
}

fn trend_chart(tid: u32, name: &str, chart_type: ChartType, chart_size: u8, dashboard_order: i32, datasets: Vec<Dataset>) -> Chart {
    Chart {
        tid: ChartTid(tid),
        name: name.to_string(),
        chart_size,
        current_end_date: Some(false),
        dashboard_order,
        display_legend: datasets.len() > 1,
        draft: false,
        include_zeros: true,
        mode: ChartMode::Chart,
        public: false,
        sub_type: ChartSubType::LcTimeseries,
        time_interval: TimeInterval::Month,
        chart_type,
        datasets,
    }
}

/// The ChartMogul catalog. `credentials` is `None` when only the chart list is needed.
pub fn template(credentials: Option<ConnectionAuth>, dashboard_order: i32, today: NaiveDate) -> TemplateConfig {
    TemplateConfig {
        connection: Connection {
            name: "ChartMogul API".to_string(),
            connection_type: ConnectionType::Api,
            host: CHART_MOGUL_HOST.to_string(),
            options: vec![],
            authentication: credentials,
        },
        charts: vec![
            kpi_chart(1, "MRR", dashboard_order.saturating_add(1), metric_dataset("MRR", "#2CA02C", "all", "mrr", today)),
            kpi_chart(2, "ARR", dashboard_order.saturating_add(2), metric_dataset("ARR", "#17BECF", "all", "arr", today)),
            kpi_chart(3, "Customers", dashboard_order.saturating_add(3), metric_dataset("Customers", "#1F77B4", "all", "customers", today)),
            trend_chart(
                4,
                "MRR Movements",
                ChartType::Line,
                2,
                dashboard_order.saturating_add(4),
                vec![
                    metric_dataset("New business", "#2CA02C", "mrr", "mrr-new-business", today),
                    metric_dataset("Expansion", "#17BECF", "mrr", "mrr-expansion", today),
                    metric_dataset("Contraction", "#FF7F0E", "mrr", "mrr-contraction", today),
                    metric_dataset("Churn", "#D62728", "mrr", "mrr-churn", today),
                ],
            ),
            trend_chart(
                5,
                "ARPA & ASP",
                ChartType::Bar,
                2,
                dashboard_order.saturating_add(5),
                vec![
                    metric_dataset("ARPA", "#9467BD", "all", "arpa", today),
                    metric_dataset("ASP", "#8C564B", "all", "asp", today),
                ],
            ),
            trend_chart(
                6,
                "Churn Rates",
                ChartType::Line,
                1,
                dashboard_order.saturating_add(6),
                vec![
                    metric_dataset("Customer churn rate", "#D62728", "all", "customer-churn-rate", today),
                    metric_dataset("MRR churn rate", "#FF7F0E", "all", "mrr-churn-rate", today),
                ],
            ),
            trend_chart(
                7,
                "Customer LTV",
                ChartType::Line,
                1,
                dashboard_order.saturating_add(7),
                vec![metric_dataset("LTV", "#E377C2", "all", "ltv", today)],
            ),
        ],
    }
}

#[async_trait]
impl Template for ChartMogulTemplate {
    fn provider(&self) -> Provider {
        Provider::ChartMogul
    }

    fn catalog(&self) -> TemplateConfig {
        template(None, 0, Utc::now().date_naive())
    }

    async fn prepare(&self, params: serde_json::Value, dashboard_order: i32) -> Result<PreparedTemplate, TemplateError> {
        let params: ChartMogulParams = serde_json::from_value(params)?;

        let token = params.token().ok_or(TemplateError::MissingArgument("token"))?;
        let key = params.key().ok_or(TemplateError::MissingArgument("key"))?;

        let auth = ProviderAuth::Basic {
            user: token.to_string(),
            pass: key.to_string(),
        };

        event!(Level::INFO, "Checking ChartMogul credentials for team {:?}", params.team_id);

        let data = self.client.get_json(&format!("{}/ping", self.api_base_url), &auth).await?;

        if data.get("data").and_then(|d| d.as_str()) != Some("pong!") {
            event!(Level::WARN, "ChartMogul ping did not answer with pong: {}", data);
            return Err(TemplateError::Forbidden);
        }

        let credentials = ConnectionAuth::BasicAuth {
            user: token.to_string(),
            pass: key.to_string(),
        };

        Ok(PreparedTemplate {
            config: template(Some(credentials), dashboard_order, Utc::now().date_naive()),
            selected: params.charts,
        })
    }
}
