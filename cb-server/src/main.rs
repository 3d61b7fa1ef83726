use anyhow::Result;
use cb_core::configuration::AppConfiguration;
use cb_core::template_service::TemplateService;
use cb_server::app::{build_router, AppState};
use cb_store::{DbModelManager, DbProjectBmc, InMemoryProjectBmc, InMemoryProjects, ProjectBmcTrait};
use std::sync::Arc;
use tracing::{event, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfiguration::from_env()?;

    let bmc: Arc<dyn ProjectBmcTrait> = match cfg.pg_connection_string() {
        Some(connection_string) => Arc::new(DbProjectBmc::new(DbModelManager::connect(connection_string).await?)),
        None => {
            event!(Level::WARN, "CB_DATABASE_URL is not set. Projects are kept in memory.");
            Arc::new(InMemoryProjectBmc::new(InMemoryProjects::new()))
        }
    };

    let app_state = AppState {
        service: Arc::new(TemplateService::from_config(&cfg, bmc)?),
        api_token: cfg.api_token.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    event!(Level::INFO, "listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(app_state)).await?;

    Ok(())
}
