use crate::error::TemplateError;
use crate::provider_client::{ProviderAuth, ProviderClientTrait};
use crate::templates::{has_data, PreparedTemplate, Template};
use async_trait::async_trait;
use cb_domain::{
    Chart, ChartMode, ChartSubType, ChartTid, ChartType, Connection, ConnectionType, DataRequest, Dataset, FillColor, Provider, SimpleAnalyticsParams,
    TemplateConfig, TimeInterval, YAxisOperation,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{event, Level};

pub const SIMPLE_ANALYTICS_HOST: &str = "https://simpleanalytics.com";

const TRANSPARENT: &str = "rgba(0,0,0,0)";

#[derive(Debug, Clone)]
pub struct SimpleAnalyticsTemplate {
    client: Arc<dyn ProviderClientTrait>,
    api_base_url: String,
}

impl SimpleAnalyticsTemplate {
    pub fn new(client: Arc<dyn ProviderClientTrait>, api_base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn route(website: &str, fields: &str) -> DataRequest {
    DataRequest {
        route: format!("/{}.json?version=5&fields={}", website, fields),
    }
}

fn histogram_dataset(website: &str, legend: &str, color: &str, metric: &str) -> Dataset {
    Dataset {
        legend: legend.to_string(),
        dataset_color: color.to_string(),
        fill: Some(false),
        fill_color: FillColor::Single(TRANSPARENT.to_string()),
        multi_fill: false,
        date_field: Some("root.histogram[].date".to_string()),
        x_axis: "root.histogram[].date".to_string(),
        y_axis: format!("root.histogram[].{}", metric),
        y_axis_operation: YAxisOperation::None,
        data_request: route(website, "histogram"),
    }
}

fn table_dataset(website: &str, legend: &str, color: &str, field: &str) -> Dataset {
    Dataset {
        legend: legend.to_string(),
        dataset_color: color.to_string(),
        fill: Some(false),
        fill_color: FillColor::Single(TRANSPARENT.to_string()),
        multi_fill: false,
        date_field: None,
        x_axis: format!("root.{}[].value", field),
        y_axis: format!("root.{}[].pageviews", field),
        y_axis_operation: YAxisOperation::None,
        data_request: route(website, field),
    }
}

fn table_chart(tid: u32, name: &str, dashboard_order: i32, datasets: Vec<Dataset>) -> Chart {
    Chart {
        tid: ChartTid(tid),
        name: name.to_string(),
        chart_size: 2,
        current_end_date: None,
        dashboard_order,
        display_legend: false,
        draft: false,
        include_zeros: true,
        mode: ChartMode::Chart,
        public: false,
        sub_type: ChartSubType::Timeseries,
        time_interval: TimeInterval::Day,
        chart_type: ChartType::Table,
        datasets,
    }
}

/// The SimpleAnalytics catalog for `website`. Charts are placed after `dashboard_order`.
pub fn template(website: &str, api_key: Option<&str>, dashboard_order: i32) -> TemplateConfig {
    TemplateConfig {
        connection: Connection {
            name: "SimpleAnalyticsAPI".to_string(),
            connection_type: ConnectionType::Api,
            host: SIMPLE_ANALYTICS_HOST.to_string(),
            options: vec![BTreeMap::from([("Api-Key".to_string(), api_key.unwrap_or("none").to_string())])],
            authentication: None,
        },
        charts: vec![
            Chart {
                tid: ChartTid(1),
                name: "30-day Stats".to_string(),
                chart_size: 1,
                current_end_date: Some(false),
                dashboard_order: dashboard_order.saturating_add(1),
                display_legend: false,
                draft: false,
                include_zeros: true,
                mode: ChartMode::Kpi,
                public: false,
                sub_type: ChartSubType::AddTimeseries,
                time_interval: TimeInterval::Day,
                chart_type: ChartType::Line,
                datasets: vec![
                    histogram_dataset(website, "Pageviews", "rgba(23, 190, 207, 1)", "pageviews"),
                    histogram_dataset(website, "Visitors", "#D62728", "visitors"),
                ],
            },
            Chart {
                tid: ChartTid(2),
                name: "Site Stats".to_string(),
                chart_size: 2,
                current_end_date: Some(false),
                dashboard_order: dashboard_order.saturating_add(2),
                display_legend: false,
                draft: false,
                include_zeros: true,
                mode: ChartMode::Chart,
                public: false,
                sub_type: ChartSubType::LcTimeseries,
                time_interval: TimeInterval::Day,
                chart_type: ChartType::Line,
                datasets: vec![
                    histogram_dataset(website, "Pageviews", "#17BECF", "pageviews"),
                    histogram_dataset(website, "Visitors", "#D62728", "visitors"),
                ],
            },
            Chart {
                tid: ChartTid(3),
                name: "Devices".to_string(),
                chart_size: 1,
                current_end_date: None,
                dashboard_order: dashboard_order.saturating_add(3),
                display_legend: true,
                draft: false,
                include_zeros: true,
                mode: ChartMode::Chart,
                public: false,
                sub_type: ChartSubType::Timeseries,
                time_interval: TimeInterval::Day,
                chart_type: ChartType::Doughnut,
                datasets: vec![Dataset {
                    legend: "Devices".to_string(),
                    dataset_color: "rgba(207, 236, 249, 0)".to_string(),
                    fill: None,
                    fill_color: FillColor::PerSegment(vec![
                        "rgba(208, 2, 27, 0.34)".to_string(),
                        "rgba(126, 211, 33, 0.4)".to_string(),
                        "rgba(74, 144, 226, 0.61)".to_string(),
                    ]),
                    multi_fill: true,
                    date_field: None,
                    x_axis: "root.device_types[].value".to_string(),
                    y_axis: "root.device_types[].visitors".to_string(),
                    y_axis_operation: YAxisOperation::None,
                    data_request: route(website, "device_types"),
                }],
            },
            table_chart(
                5,
                "Referrers Data",
                dashboard_order.saturating_add(4),
                vec![
                    table_dataset(website, "Referrers", "#2CA02C", "referrers"),
                    table_dataset(website, "UTM Sources", "#17BECF", "utm_sources"),
                ],
            ),
            table_chart(
                6,
                "Browsers & Countries",
                dashboard_order.saturating_add(5),
                vec![
                    table_dataset(website, "Browsers", "#2CA02C", "browser_names"),
                    table_dataset(website, "Countries", "#17BECF", "countries"),
                ],
            ),
        ],
    }
}

#[async_trait]
impl Template for SimpleAnalyticsTemplate {
    fn provider(&self) -> Provider {
        Provider::SimpleAnalytics
    }

    fn catalog(&self) -> TemplateConfig {
        template("{website}", None, 0)
    }

    async fn prepare(&self, params: serde_json::Value, dashboard_order: i32) -> Result<PreparedTemplate, TemplateError> {
        let params: SimpleAnalyticsParams = serde_json::from_value(params)?;

        let website = params.website().ok_or(TemplateError::MissingArgument("website"))?;

        let url = format!("{}/{}.json?version=5&fields=histogram", self.api_base_url, website);
        let auth = match params.api_key() {
            Some(api_key) => ProviderAuth::Header {
                name: "Api-Key".to_string(),
                value: api_key.to_string(),
            },
            None => ProviderAuth::None,
        };

        event!(Level::INFO, "Checking SimpleAnalytics website {}", website);

        let data = self.client.get_json(&url, &auth).await?;

        if !has_data(data.get("histogram")) {
            event!(Level::WARN, "SimpleAnalytics response for {} has no histogram", website);
            return Err(TemplateError::Forbidden);
        }

        Ok(PreparedTemplate {
            config: template(website, params.api_key(), dashboard_order),
            selected: params.charts,
        })
    }
}
