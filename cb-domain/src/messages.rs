use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::template_model::{Chart, ChartId, ChartTid, Connection, ConnectionId, ProjectId, TeamId};

/// Third-party data sources with a pre-built template. Serialized as the URL path segment.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    ChartMogul,
    SimpleAnalytics,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartMogulParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<ChartTid>>,
}

impl ChartMogulParams {
    pub fn token(&self) -> Option<&str> {
        non_empty(&self.token)
    }

    pub fn key(&self) -> Option<&str> {
        non_empty(&self.key)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimpleAnalyticsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<ChartTid>>,
}

impl SimpleAnalyticsParams {
    pub fn website(&self) -> Option<&str> {
        non_empty(&self.website)
    }

    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.api_key)
    }
}

/// What the connector form posts to `/project/:project_id/template/:provider`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateDashboardRequest {
    pub provider: Provider,
    pub body: serde_json::Value,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredConnection {
    pub id: ConnectionId,
    pub project_id: ProjectId,
    pub connection: Connection,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredChart {
    pub id: ChartId,
    pub project_id: ProjectId,
    pub connection_id: ConnectionId,
    pub chart: Chart,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDashboardResponse {
    pub connection_id: ConnectionId,
    pub charts: Vec<StoredChart>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_provider_path_segments() {
        assert_eq!(Provider::ChartMogul.to_string(), "chartmogul");
        assert_eq!(Provider::from_str("simpleanalytics").unwrap(), Provider::SimpleAnalytics);
        assert!(Provider::from_str("stripe").is_err());
        assert_eq!(Provider::iter().count(), 2);
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let params: SimpleAnalyticsParams = serde_json::from_str(r#"{"website":"","apiKey":"sa_api_key_1","charts":[1,3]}"#).unwrap();
        assert_eq!(params.website(), None);
        assert_eq!(params.api_key(), Some("sa_api_key_1"));
        assert_eq!(params.charts, Some(vec![ChartTid(1), ChartTid(3)]));

        let params: ChartMogulParams = serde_json::from_str(r#"{"token":"487cd43d","team_id":"12","charts":null}"#).unwrap();
        assert_eq!(params.token(), Some("487cd43d"));
        assert_eq!(params.key(), None);
        assert_eq!(params.team_id, Some(TeamId("12".to_string())));
        assert_eq!(params.charts, None);
    }
}
