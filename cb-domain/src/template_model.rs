use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ProjectId(pub i64);

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TeamId(pub String);

/// Template-local chart id. Stable within one provider's catalog, used by the
/// form to tell the server which charts to create.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ChartTid(pub u32);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ConnectionId(pub Uuid);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ChartId(pub Uuid);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChartTid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ConnectionId {
    pub fn new_random() -> Self {
        ConnectionId(Uuid::new_v4())
    }
}

impl ChartId {
    pub fn new_random() -> Self {
        ChartId(Uuid::new_v4())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionType {
    Api,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionAuth {
    BasicAuth { user: String, pass: String },
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub name: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub host: String,
    /// Extra request headers, one map per header as the dashboard stores them.
    #[serde(default)]
    pub options: Vec<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<ConnectionAuth>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartMode {
    Kpi,
    Chart,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Doughnut,
    Table,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartSubType {
    AddTimeseries,
    #[serde(rename = "lcTimeseries")]
    LcTimeseries,
    #[serde(rename = "timeseries")]
    Timeseries,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeInterval {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum YAxisOperation {
    #[default]
    None,
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum FillColor {
    Single(String),
    PerSegment(Vec<String>),
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataRequest {
    pub route: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub legend: String,
    pub dataset_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    pub fill_color: FillColor,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multi_fill: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_field: Option<String>,
    /// Path into the provider's JSON response, e.g. `root.histogram[].date`.
    pub x_axis: String,
    pub y_axis: String,
    #[serde(default)]
    pub y_axis_operation: YAxisOperation,
    #[serde(rename = "DataRequest")]
    pub data_request: DataRequest,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub tid: ChartTid,
    pub name: String,
    pub chart_size: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_end_date: Option<bool>,
    pub dashboard_order: i32,
    #[serde(default)]
    pub display_legend: bool,
    pub draft: bool,
    pub include_zeros: bool,
    pub mode: ChartMode,
    pub public: bool,
    pub sub_type: ChartSubType,
    pub time_interval: TimeInterval,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(rename = "Datasets")]
    pub datasets: Vec<Dataset>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    #[serde(rename = "Connection")]
    pub connection: Connection,
    #[serde(rename = "Charts")]
    pub charts: Vec<Chart>,
}

impl TemplateConfig {
    pub fn chart_tids(&self) -> Vec<ChartTid> {
        self.charts.iter().map(|c| c.tid).collect()
    }

    /// Charts whose tid is part of `selected`, in catalog order. `None` keeps every chart.
    pub fn select(&self, selected: Option<&[ChartTid]>) -> Vec<&Chart> {
        match selected {
            None => self.charts.iter().collect(),
            Some(tids) => self
                .charts
                .iter()
                .filter(|chart| tids.contains(&chart.tid))
                .collect(),
        }
    }

    pub fn num_datasets(&self) -> usize {
        self.charts.iter().map(|c| c.datasets.len()).sum()
    }

    pub fn routes(&self) -> Vec<&str> {
        self.charts
            .iter()
            .flat_map(|c| c.datasets.iter())
            .map(|ds| ds.data_request.route.as_str())
            .unique()
            .collect()
    }
}
