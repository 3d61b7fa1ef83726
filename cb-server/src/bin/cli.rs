use anyhow::Result;
use cb_core::provider_client::ProviderError;
use cb_core::reqwest_helpers::{create_client, ClientOptions};
use cb_domain::form::{FormError, FormSpec, TemplateForm, CONNECTION_FAILED_TITLE, SAVE_FAILED_TITLE};
use cb_domain::{ChartTid, ProjectId, Provider, TeamId};
use cb_server::chartbrew_client::ChartbrewClient;
use clap::{Parser, Subcommand};
use itertools::Itertools;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Chartbrew template CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, env = "CB_API_HOST", default_value = "http://127.0.0.1:4019")]
    api_host: String,

    #[arg(long, env = "CB_API_TOKEN")]
    token: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    command: MyCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum MyCommand {
    /// Lists the charts a template can create
    Charts { provider: Provider },
    Generate {
        #[command(subcommand)]
        template: GenerateCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum GenerateCommand {
    ChartMogul {
        #[arg(long)]
        project_id: i64,
        #[arg(long)]
        team_id: String,
        #[arg(long, env = "CHARTMOGUL_ACCOUNT_TOKEN")]
        account_token: Option<String>,
        #[arg(long, env = "CHARTMOGUL_SECRET_KEY")]
        secret_key: Option<String>,
        /// Chart to create. Repeat for several, all charts when omitted.
        #[arg(long = "chart")]
        charts: Vec<u32>,
    },
    SimpleAnalytics {
        #[arg(long)]
        project_id: i64,
        #[arg(long)]
        website: Option<String>,
        #[arg(long, env = "SIMPLEANALYTICS_API_KEY")]
        api_key: Option<String>,
        #[arg(long = "chart")]
        charts: Vec<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let client = ChartbrewClient::new(create_client(args.token.clone(), ClientOptions::default())?, args.api_host.clone());

    match args.command {
        MyCommand::Charts { provider } => {
            let catalog = client.get_template(provider).await?;
            for chart in catalog.charts {
                println!("{:>3}  {} ({} datasets)", chart.tid, chart.name, chart.datasets.len());
            }
        }
        MyCommand::Generate { template } => {
            let (provider, project_id, team_id, values, charts) = match template {
                GenerateCommand::ChartMogul {
                    project_id,
                    team_id,
                    account_token,
                    secret_key,
                    charts,
                } => (
                    Provider::ChartMogul,
                    project_id,
                    Some(TeamId(team_id)),
                    vec![("token", account_token), ("key", secret_key)],
                    charts,
                ),
                GenerateCommand::SimpleAnalytics {
                    project_id,
                    website,
                    api_key,
                    charts,
                } => (Provider::SimpleAnalytics, project_id, None, vec![("website", website), ("apiKey", api_key)], charts),
            };

            let mut form = TemplateForm::new(FormSpec::for_provider(provider), team_id);
            for (field, value) in values {
                form.set_value(field, value.unwrap_or_default());
            }

            form.load_configuration(client.get_template(provider).await?);
            if !charts.is_empty() {
                form.deselect_all();
                charts.into_iter().map(ChartTid).unique().for_each(|tid| form.toggle_chart(tid));
            }

            let request = match form.submit() {
                Ok(request) => request,
                Err(FormError::MissingField { field, message }) => {
                    anyhow::bail!("{}: {}", field, message);
                }
                Err(err) => anyhow::bail!("{}", err),
            };

            match client.generate_dashboard(ProjectId(project_id), &request).await {
                Ok(response) => {
                    form.generation_succeeded();
                    println!("Created {} charts in project {}", response.charts.len(), project_id);
                    for stored in response.charts {
                        println!("{:>3}  {}", stored.chart.dashboard_order, stored.chart.name);
                    }
                }
                Err(err @ ProviderError::Status { status: 500.., .. }) => {
                    form.save_failed();
                    eprintln!("{}", SAVE_FAILED_TITLE);
                    eprintln!("Please try adding your connection again.");
                    anyhow::bail!(err);
                }
                Err(err) => {
                    form.generation_failed();
                    eprintln!("{}", CONNECTION_FAILED_TITLE);
                    eprintln!("{}", form.spec().connection_failed_hint);
                    eprintln!("Your credentials are at {}", form.spec().credentials_url);
                    anyhow::bail!(err);
                }
            }
        }
    }

    Ok(())
}
