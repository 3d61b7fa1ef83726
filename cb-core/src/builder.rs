use crate::error::TemplateError;
use crate::templates::PreparedTemplate;
use cb_domain::{GenerateDashboardResponse, ProjectId};
use cb_store::ProjectBmcTrait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{event, Level};

/// Persists the selected charts of a prepared template into a project.
#[derive(Debug, Clone)]
pub struct DashboardBuilder {
    bmc: Arc<dyn ProjectBmcTrait>,
}

impl DashboardBuilder {
    pub fn new(bmc: Arc<dyn ProjectBmcTrait>) -> Self {
        Self { bmc }
    }

    pub async fn build(&self, project_id: ProjectId, prepared: PreparedTemplate, now: DateTime<Utc>) -> Result<GenerateDashboardResponse, TemplateError> {
        let PreparedTemplate { config, selected } = prepared;

        let charts = config.select(selected.as_deref());
        if charts.is_empty() {
            return Err(TemplateError::NoChartsSelected);
        }

        let connection = self.bmc.insert_connection(project_id, &config.connection, now).await?;
        event!(
            Level::INFO,
            "Created connection '{}' ({:?}) for project {}",
            connection.connection.name,
            connection.id,
            project_id
        );

        let mut stored_charts = Vec::with_capacity(charts.len());
        for chart in charts {
            let stored = self.bmc.insert_chart(project_id, connection.id, chart, now).await?;
            event!(Level::DEBUG, "Created chart #{} '{}' at position {}", chart.tid, chart.name, chart.dashboard_order);
            stored_charts.push(stored);
        }

        event!(Level::INFO, "Added {} charts to project {}", stored_charts.len(), project_id);

        Ok(GenerateDashboardResponse {
            connection_id: connection.id,
            charts: stored_charts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::simple_analytics;
    use cb_domain::ChartTid;
    use cb_store::{InMemoryProjectBmc, InMemoryProjects, MockProjectBmcTrait};
    use itertools::Itertools;
    use tracing_test::traced_test;

    fn prepared(selected: Option<Vec<ChartTid>>) -> PreparedTemplate {
        PreparedTemplate {
            config: simple_analytics::template("example.com", None, 10),
            selected,
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_build_inserts_all_charts_when_nothing_selected() {
        let bmc = Arc::new(InMemoryProjectBmc::new(InMemoryProjects::new()));
        let builder = DashboardBuilder::new(bmc.clone());

        let response = builder.build(ProjectId(3), prepared(None), Utc::now()).await.unwrap();

        assert_eq!(
            response.charts.iter().map(|c| c.chart.tid).collect_vec(),
            vec![ChartTid(1), ChartTid(2), ChartTid(3), ChartTid(5), ChartTid(6)]
        );
        assert!(response.charts.iter().all(|c| c.connection_id == response.connection_id));
        assert_eq!(bmc.list_connections(ProjectId(3)).await.unwrap().len(), 1);
        assert_eq!(bmc.max_dashboard_order(ProjectId(3)).await.unwrap(), Some(15));
        assert!(logs_contain("Added 5 charts to project 3"));
    }

    #[tokio::test]
    async fn test_build_keeps_catalog_order_and_ignores_unknown_tids() {
        let bmc = Arc::new(InMemoryProjectBmc::new(InMemoryProjects::new()));
        let builder = DashboardBuilder::new(bmc);

        let response = builder
            .build(ProjectId(1), prepared(Some(vec![ChartTid(6), ChartTid(42), ChartTid(2)])), Utc::now())
            .await
            .unwrap();

        assert_eq!(response.charts.iter().map(|c| c.chart.tid).collect_vec(), vec![ChartTid(2), ChartTid(6)]);
    }

    #[tokio::test]
    async fn test_build_without_matching_charts_stores_nothing() {
        let mut bmc = MockProjectBmcTrait::new();
        bmc.expect_insert_connection().never();
        bmc.expect_insert_chart().never();
        let builder = DashboardBuilder::new(Arc::new(bmc));

        let err = builder
            .build(ProjectId(1), prepared(Some(vec![ChartTid(4)])), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, TemplateError::NoChartsSelected));
    }

    #[tokio::test]
    async fn test_build_surfaces_store_failures() {
        let mut bmc = MockProjectBmcTrait::new();
        bmc.expect_insert_connection()
            .returning(|_, _, _| Err(anyhow::anyhow!("connection refused")));
        let builder = DashboardBuilder::new(Arc::new(bmc));

        let err = builder.build(ProjectId(1), prepared(None), Utc::now()).await.unwrap_err();

        assert!(matches!(err, TemplateError::Store(_)));
        assert_eq!(err.to_string(), "connection refused");
    }
}
