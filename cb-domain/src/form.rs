//! State of the connector form that collects credentials and a chart selection
//! before asking the server to generate a dashboard.
//!
//! The form is UI agnostic: a front end feeds user input into [`TemplateForm`] and
//! renders whatever state it exposes (field errors, the selected charts, whether the
//! submit button is enabled, the "cannot make the connection" banner).

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::messages::{GenerateDashboardRequest, Provider};
use crate::template_model::{ChartTid, TeamId, TemplateConfig};

pub const CONNECTION_FAILED_TITLE: &str = "Cannot make the connection";
pub const SAVE_FAILED_TITLE: &str = "Server error while trying to save your connection";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub required: bool,
    pub missing_message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSpec {
    pub provider: Provider,
    pub fields: Vec<FieldSpec>,
    pub sends_team_id: bool,
    pub connection_failed_hint: &'static str,
    pub credentials_url: &'static str,
}

impl FormSpec {
    pub fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::ChartMogul => Self::chart_mogul(),
            Provider::SimpleAnalytics => Self::simple_analytics(),
        }
    }

    pub fn chart_mogul() -> Self {
        Self {
            provider: Provider::ChartMogul,
            fields: vec![
                FieldSpec {
                    name: "token",
                    label: "Enter your ChartMogul account token",
                    placeholder: "487cd43d3656609a32e92d1e7d17cd25",
                    required: true,
                    missing_message: "Please enter your ChartMogul account token",
                },
                FieldSpec {
                    name: "key",
                    label: "Enter your ChartMogul secret key",
                    placeholder: "de2bf2bc6de5266d11ea6b918b674780",
                    required: true,
                    missing_message: "Please enter your ChartMogul account API key",
                },
            ],
            sends_team_id: true,
            connection_failed_hint: "Please make sure you copied the right token and API key from your ChartMogul dashboard.",
            credentials_url: "https://app.chartmogul.com/#/admin/api",
        }
    }

    pub fn simple_analytics() -> Self {
        Self {
            provider: Provider::SimpleAnalytics,
            fields: vec![
                FieldSpec {
                    name: "website",
                    label: "Enter your Simple Analytics website",
                    placeholder: "example.com",
                    required: true,
                    missing_message: "Please enter your website",
                },
                FieldSpec {
                    name: "apiKey",
                    label: "Enter your Simple Analytics API key (only needed for private websites)",
                    placeholder: "sa_api_key_xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
                    required: false,
                    missing_message: "",
                },
            ],
            sends_team_id: false,
            connection_failed_hint: "Please make sure the website is registered with Simple Analytics and the API key is correct.",
            credentials_url: "https://simpleanalytics.com/account",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{message}")]
    MissingField { field: String, message: String },
    #[error("Select at least one chart")]
    NoChartsSelected,
}

#[derive(Debug, Clone)]
pub struct TemplateForm {
    spec: FormSpec,
    team_id: Option<TeamId>,
    values: BTreeMap<String, String>,
    errors: BTreeMap<String, String>,
    configuration: Option<TemplateConfig>,
    selected_charts: Vec<ChartTid>,
    loading: bool,
    test_error: bool,
    save_error: bool,
}

impl TemplateForm {
    pub fn new(spec: FormSpec, team_id: Option<TeamId>) -> Self {
        Self {
            spec,
            team_id,
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
            configuration: None,
            selected_charts: Vec::new(),
            loading: false,
            test_error: false,
            save_error: false,
        }
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn set_value(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(|v| v.as_str())
    }

    /// Stores the provider catalog and preselects every chart in it.
    pub fn load_configuration(&mut self, config: TemplateConfig) {
        self.selected_charts = config.chart_tids();
        self.configuration = Some(config);
    }

    pub fn configuration(&self) -> Option<&TemplateConfig> {
        self.configuration.as_ref()
    }

    pub fn toggle_chart(&mut self, tid: ChartTid) {
        match self.selected_charts.iter().position(|t| *t == tid) {
            Some(idx) => {
                self.selected_charts.remove(idx);
            }
            None => self.selected_charts.push(tid),
        }
    }

    pub fn select_all(&mut self) {
        if let Some(config) = &self.configuration {
            self.selected_charts = config.chart_tids();
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected_charts.clear();
    }

    pub fn selected_charts(&self) -> &[ChartTid] {
        &self.selected_charts
    }

    pub fn is_selected(&self, tid: ChartTid) -> bool {
        self.selected_charts.contains(&tid)
    }

    fn is_filled(&self, field: &str) -> bool {
        self.value(field).is_some_and(|v| !v.is_empty())
    }

    /// Whether the "create the charts" action is enabled.
    pub fn can_submit(&self) -> bool {
        self.spec.fields.iter().filter(|f| f.required).all(|f| self.is_filled(f.name)) && !self.selected_charts.is_empty()
    }

    /// Validates the form and builds the payload for the generation endpoint.
    ///
    /// Only the first missing required field is reported, the same way the form
    /// stops at the first problem.
    pub fn submit(&mut self) -> Result<GenerateDashboardRequest, FormError> {
        self.errors.clear();

        if let Some(missing) = self.spec.fields.iter().find(|f| f.required && !self.is_filled(f.name)) {
            self.errors.insert(missing.name.to_string(), missing.missing_message.to_string());
            return Err(FormError::MissingField {
                field: missing.name.to_string(),
                message: missing.missing_message.to_string(),
            });
        }

        if self.selected_charts.is_empty() {
            return Err(FormError::NoChartsSelected);
        }

        let mut body: Map<String, Value> = self
            .values
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        if self.spec.sends_team_id {
            if let Some(team_id) = &self.team_id {
                body.insert("team_id".to_string(), json!(team_id));
            }
        }
        body.insert("charts".to_string(), json!(self.selected_charts));

        self.loading = true;
        self.test_error = false;
        self.save_error = false;

        Ok(GenerateDashboardRequest {
            provider: self.spec.provider,
            body: Value::Object(body),
        })
    }

    pub fn generation_failed(&mut self) {
        self.test_error = true;
        self.loading = false;
    }

    pub fn generation_succeeded(&mut self) {
        self.loading = false;
    }

    /// The credentials were accepted but the server could not store the connection.
    pub fn save_failed(&mut self) {
        self.save_error = true;
        self.loading = false;
    }

    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(|e| e.as_str())
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_test_error(&self) -> bool {
        self.test_error
    }

    pub fn has_save_error(&self) -> bool {
        self.save_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template_model::{Connection, ConnectionType};

    fn catalog(tids: &[u32]) -> TemplateConfig {
        let chart_json = |tid: u32| {
            json!({
                "tid": tid, "name": format!("chart {tid}"), "chartSize": 1, "dashboardOrder": tid,
                "draft": false, "includeZeros": true, "mode": "chart", "public": false,
                "subType": "timeseries", "timeInterval": "day", "type": "line", "Datasets": []
            })
        };
        TemplateConfig {
            connection: Connection {
                name: "ChartMogul API".to_string(),
                connection_type: ConnectionType::Api,
                host: "https://api.chartmogul.com/v1".to_string(),
                options: vec![],
                authentication: None,
            },
            charts: tids.iter().map(|tid| serde_json::from_value(chart_json(*tid)).unwrap()).collect(),
        }
    }

    fn chart_mogul_form() -> TemplateForm {
        let mut form = TemplateForm::new(FormSpec::chart_mogul(), Some(TeamId("42".to_string())));
        form.load_configuration(catalog(&[1, 2, 3]));
        form
    }

    #[test]
    fn test_submit_blocked_without_token() {
        let mut form = chart_mogul_form();
        form.set_value("key", "de2bf2bc6de5266d11ea6b918b674780");

        let result = form.submit();

        assert_eq!(
            result,
            Err(FormError::MissingField {
                field: "token".to_string(),
                message: "Please enter your ChartMogul account token".to_string()
            })
        );
        assert_eq!(form.error_for("token"), Some("Please enter your ChartMogul account token"));
        assert!(!form.is_loading());
        assert!(!form.can_submit());
    }

    #[test]
    fn test_submit_blocked_without_key() {
        let mut form = chart_mogul_form();
        form.set_value("token", "487cd43d3656609a32e92d1e7d17cd25");
        form.set_value("key", "");

        let err = form.submit().unwrap_err();

        assert_eq!(err.to_string(), "Please enter your ChartMogul account API key");
        assert_eq!(form.error_for("key"), Some("Please enter your ChartMogul account API key"));
        assert_eq!(form.error_for("token"), None);
    }

    #[test]
    fn test_submit_reports_only_first_missing_field_and_clears_old_errors() {
        let mut form = chart_mogul_form();
        assert!(form.submit().is_err());
        assert_eq!(form.errors().len(), 1);

        form.set_value("token", "t");
        assert!(form.submit().is_err());
        assert_eq!(form.errors().keys().collect::<Vec<_>>(), vec!["key"]);
    }

    #[test]
    fn test_submit_builds_payload() {
        let mut form = chart_mogul_form();
        form.set_value("token", "487cd43d3656609a32e92d1e7d17cd25");
        form.set_value("key", "de2bf2bc6de5266d11ea6b918b674780");
        form.toggle_chart(ChartTid(2));
        assert!(form.can_submit());

        let request = form.submit().unwrap();

        assert_eq!(request.provider, Provider::ChartMogul);
        assert_eq!(
            request.body,
            json!({
                "token": "487cd43d3656609a32e92d1e7d17cd25",
                "key": "de2bf2bc6de5266d11ea6b918b674780",
                "team_id": "42",
                "charts": [1, 3]
            })
        );
        assert!(form.is_loading());
    }

    #[test]
    fn test_simple_analytics_payload_skips_team_and_empty_api_key() {
        let mut form = TemplateForm::new(FormSpec::simple_analytics(), Some(TeamId("42".to_string())));
        form.load_configuration(catalog(&[1, 5]));
        form.set_value("website", "example.com");
        form.set_value("apiKey", "");

        let request = form.submit().unwrap();

        assert_eq!(request.body, json!({"website": "example.com", "charts": [1, 5]}));
    }

    #[test]
    fn test_toggle_chart_never_duplicates() {
        let mut form = chart_mogul_form();
        assert_eq!(form.selected_charts(), &[ChartTid(1), ChartTid(2), ChartTid(3)]);

        form.toggle_chart(ChartTid(2));
        assert_eq!(form.selected_charts(), &[ChartTid(1), ChartTid(3)]);
        assert!(!form.is_selected(ChartTid(2)));

        form.toggle_chart(ChartTid(2));
        form.toggle_chart(ChartTid(1));
        form.toggle_chart(ChartTid(1));
        assert_eq!(form.selected_charts().iter().filter(|t| **t == ChartTid(1)).count(), 1);
        assert_eq!(form.selected_charts().len(), 3);
    }

    #[test]
    fn test_select_and_deselect_all() {
        let mut form = TemplateForm::new(FormSpec::chart_mogul(), None);
        form.select_all();
        assert!(form.selected_charts().is_empty());

        form.load_configuration(catalog(&[4, 6]));
        form.deselect_all();
        assert!(form.selected_charts().is_empty());
        form.set_value("token", "t");
        form.set_value("key", "k");
        assert!(!form.can_submit());
        assert_eq!(form.submit(), Err(FormError::NoChartsSelected));

        form.select_all();
        assert_eq!(form.selected_charts(), &[ChartTid(4), ChartTid(6)]);
    }

    #[test]
    fn test_generation_failure_shows_banner() {
        let mut form = chart_mogul_form();
        form.set_value("token", "t");
        form.set_value("key", "k");
        form.submit().unwrap();

        form.generation_failed();
        assert!(form.has_test_error());
        assert!(!form.is_loading());

        form.submit().unwrap();
        assert!(!form.has_test_error());
        form.generation_succeeded();
        assert!(!form.is_loading());
    }

    #[test]
    fn test_save_failure_is_separate_from_connection_failure() {
        let mut form = chart_mogul_form();
        form.set_value("token", "t");
        form.set_value("key", "k");
        form.submit().unwrap();

        form.save_failed();
        assert!(form.has_save_error());
        assert!(!form.has_test_error());
        assert!(!form.is_loading());

        form.submit().unwrap();
        assert!(!form.has_save_error());
    }
}
