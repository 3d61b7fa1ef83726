use crate::DbModelManager;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use cb_domain::{Chart, ChartId, Connection, ConnectionId, ProjectId, StoredChart, StoredConnection};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use mockall::automock;
use sqlx::types::Json;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[automock]
#[async_trait]
pub trait ProjectBmcTrait: Send + Sync + Debug {
    async fn max_dashboard_order(&self, project_id: ProjectId) -> Result<Option<i32>>;
    async fn insert_connection(&self, project_id: ProjectId, connection: &Connection, now: DateTime<Utc>) -> Result<StoredConnection>;
    async fn insert_chart(&self, project_id: ProjectId, connection_id: ConnectionId, chart: &Chart, now: DateTime<Utc>) -> Result<StoredChart>;
    async fn list_charts(&self, project_id: ProjectId) -> Result<Vec<StoredChart>>;
    async fn list_connections(&self, project_id: ProjectId) -> Result<Vec<StoredConnection>>;
}

#[derive(Debug)]
pub struct DbProjectBmc {
    pub(crate) mm: DbModelManager,
}

impl DbProjectBmc {
    pub fn new(mm: DbModelManager) -> Self {
        Self { mm }
    }
}

#[derive(sqlx::FromRow)]
struct DbConnectionEntry {
    id: Uuid,
    project_id: i64,
    entry: Json<Connection>,
    created_at: DateTime<Utc>,
}

impl From<DbConnectionEntry> for StoredConnection {
    fn from(db: DbConnectionEntry) -> Self {
        StoredConnection {
            id: ConnectionId(db.id),
            project_id: ProjectId(db.project_id),
            connection: db.entry.0,
            created_at: db.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DbChartEntry {
    id: Uuid,
    project_id: i64,
    connection_id: Uuid,
    entry: Json<Chart>,
    created_at: DateTime<Utc>,
}

impl From<DbChartEntry> for StoredChart {
    fn from(db: DbChartEntry) -> Self {
        StoredChart {
            id: ChartId(db.id),
            project_id: ProjectId(db.project_id),
            connection_id: ConnectionId(db.connection_id),
            chart: db.entry.0,
            created_at: db.created_at,
        }
    }
}

#[async_trait]
impl ProjectBmcTrait for DbProjectBmc {
    async fn max_dashboard_order(&self, project_id: ProjectId) -> Result<Option<i32>> {
        let max_order: Option<i32> = sqlx::query_scalar(
            r#"
select max(dashboard_order)
  from charts
 where project_id = $1
        "#,
        )
        .bind(project_id.0)
        .fetch_one(self.mm.pool())
        .await?;

        Ok(max_order)
    }

    async fn insert_connection(&self, project_id: ProjectId, connection: &Connection, now: DateTime<Utc>) -> Result<StoredConnection> {
        let entry: DbConnectionEntry = sqlx::query_as(
            r#"
insert into connections (id, project_id, entry, created_at)
values ($1, $2, $3, $4)
returning id, project_id, entry, created_at
        "#,
        )
        .bind(ConnectionId::new_random().0)
        .bind(project_id.0)
        .bind(Json(connection.clone()))
        .bind(now)
        .fetch_one(self.mm.pool())
        .await?;

        Ok(entry.into())
    }

    async fn insert_chart(&self, project_id: ProjectId, connection_id: ConnectionId, chart: &Chart, now: DateTime<Utc>) -> Result<StoredChart> {
        let entry: DbChartEntry = sqlx::query_as(
            r#"
insert into charts (id, project_id, connection_id, tid, dashboard_order, entry, created_at)
values ($1, $2, $3, $4, $5, $6, $7)
returning id, project_id, connection_id, entry, created_at
        "#,
        )
        .bind(ChartId::new_random().0)
        .bind(project_id.0)
        .bind(connection_id.0)
        .bind(chart.tid.0 as i32)
        .bind(chart.dashboard_order)
        .bind(Json(chart.clone()))
        .bind(now)
        .fetch_one(self.mm.pool())
        .await?;

        Ok(entry.into())
    }

    async fn list_charts(&self, project_id: ProjectId) -> Result<Vec<StoredChart>> {
        let entries: Vec<DbChartEntry> = sqlx::query_as(
            r#"
select id
     , project_id
     , connection_id
     , entry
     , created_at
  from charts
 where project_id = $1
 order by dashboard_order, created_at
        "#,
        )
        .bind(project_id.0)
        .fetch_all(self.mm.pool())
        .await?;

        Ok(entries.into_iter().map_into().collect_vec())
    }

    async fn list_connections(&self, project_id: ProjectId) -> Result<Vec<StoredConnection>> {
        let entries: Vec<DbConnectionEntry> = sqlx::query_as(
            r#"
select id
     , project_id
     , entry
     , created_at
  from connections
 where project_id = $1
 order by created_at
        "#,
        )
        .bind(project_id.0)
        .fetch_all(self.mm.pool())
        .await?;

        Ok(entries.into_iter().map_into().collect_vec())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProjects {
    connections: HashMap<ConnectionId, StoredConnection>,
    charts: Vec<StoredChart>,
}

impl InMemoryProjects {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct InMemoryProjectBmc {
    in_memory_projects: Arc<RwLock<InMemoryProjects>>,
}

impl InMemoryProjectBmc {
    pub fn new(in_memory_projects: InMemoryProjects) -> Self {
        Self {
            in_memory_projects: Arc::new(RwLock::new(in_memory_projects)),
        }
    }
}

#[async_trait]
impl ProjectBmcTrait for InMemoryProjectBmc {
    async fn max_dashboard_order(&self, project_id: ProjectId) -> Result<Option<i32>> {
        let guard = self.in_memory_projects.read().await;

        Ok(guard
            .charts
            .iter()
            .filter(|c| c.project_id == project_id)
            .map(|c| c.chart.dashboard_order)
            .max())
    }

    async fn insert_connection(&self, project_id: ProjectId, connection: &Connection, now: DateTime<Utc>) -> Result<StoredConnection> {
        let stored = StoredConnection {
            id: ConnectionId::new_random(),
            project_id,
            connection: connection.clone(),
            created_at: now,
        };

        self.in_memory_projects.write().await.connections.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn insert_chart(&self, project_id: ProjectId, connection_id: ConnectionId, chart: &Chart, now: DateTime<Utc>) -> Result<StoredChart> {
        let mut guard = self.in_memory_projects.write().await;

        if !guard.connections.contains_key(&connection_id) {
            return Err(anyhow!("Connection {:?} not found", connection_id));
        }

        let stored = StoredChart {
            id: ChartId::new_random(),
            project_id,
            connection_id,
            chart: chart.clone(),
            created_at: now,
        };
        guard.charts.push(stored.clone());

        Ok(stored)
    }

    async fn list_charts(&self, project_id: ProjectId) -> Result<Vec<StoredChart>> {
        let guard = self.in_memory_projects.read().await;

        Ok(guard
            .charts
            .iter()
            .filter(|c| c.project_id == project_id)
            .sorted_by_key(|c| (c.chart.dashboard_order, c.created_at))
            .cloned()
            .collect_vec())
    }

    async fn list_connections(&self, project_id: ProjectId) -> Result<Vec<StoredConnection>> {
        let guard = self.in_memory_projects.read().await;

        Ok(guard
            .connections
            .values()
            .filter(|c| c.project_id == project_id)
            .sorted_by_key(|c| c.created_at)
            .cloned()
            .collect_vec())
    }
}
