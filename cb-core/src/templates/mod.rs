use crate::error::TemplateError;
use async_trait::async_trait;
use cb_domain::{ChartTid, Provider, TemplateConfig};
use serde_json::Value;
use std::fmt::Debug;

pub mod chart_mogul;
pub mod simple_analytics;

pub use chart_mogul::ChartMogulTemplate;
pub use simple_analytics::SimpleAnalyticsTemplate;

/// A rendered catalog that passed the connectivity check, ready for the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTemplate {
    pub config: TemplateConfig,
    pub selected: Option<Vec<ChartTid>>,
}

#[async_trait]
pub trait Template: Send + Sync + Debug {
    fn provider(&self) -> Provider;

    /// The catalog shown to the form before any credentials are known.
    fn catalog(&self) -> TemplateConfig;

    /// Validates the form arguments, checks connectivity with the provider once and renders the catalog
    /// with `dashboard_order` as the position after which the new charts are placed.
    async fn prepare(&self, params: serde_json::Value, dashboard_order: i32) -> Result<PreparedTemplate, TemplateError>;
}

/// Whether a field of a provider response holds usable data. `null`, `false`, `0` and `""`
/// count as missing, as does an absent field.
pub(crate) fn has_data(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
