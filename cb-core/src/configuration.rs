use crate::reqwest_helpers::ClientOptions;
use crate::templates::chart_mogul::CHART_MOGUL_HOST;
use crate::templates::simple_analytics::SIMPLE_ANALYTICS_HOST;
use cb_store::PgConnectionString;
use serde::Deserialize;

/// Server settings, read from `CB_`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfiguration {
    /// Without a database url the server keeps projects in memory.
    pub database_url: Option<String>,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub api_token: Option<String>,
    #[serde(default = "default_simpleanalytics_base_url")]
    pub simpleanalytics_base_url: String,
    #[serde(default = "default_chartmogul_base_url")]
    pub chartmogul_base_url: String,
    #[serde(default = "default_requests_per_second")]
    pub provider_requests_per_second: u32,
    #[serde(default)]
    pub provider_max_retries: u32,
}

fn default_listen_addr() -> String {
    "127.0.0.1:4019".to_string()
}

fn default_simpleanalytics_base_url() -> String {
    SIMPLE_ANALYTICS_HOST.to_string()
}

fn default_chartmogul_base_url() -> String {
    CHART_MOGUL_HOST.to_string()
}

fn default_requests_per_second() -> u32 {
    ClientOptions::default().requests_per_second
}

impl AppConfiguration {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("CB_").from_env::<AppConfiguration>()
    }

    pub fn pg_connection_string(&self) -> Option<PgConnectionString> {
        self.database_url.clone().map(PgConnectionString)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            requests_per_second: self.provider_requests_per_second,
            max_retries: self.provider_max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_only_token_is_set() {
        let cfg: AppConfiguration = envy::prefixed("CB_")
            .from_iter(vec![("CB_API_TOKEN".to_string(), "brew".to_string())])
            .unwrap();

        assert_eq!(cfg.api_token, Some("brew".to_string()));
        assert_eq!(cfg.listen_addr, "127.0.0.1:4019");
        assert_eq!(cfg.simpleanalytics_base_url, SIMPLE_ANALYTICS_HOST);
        assert_eq!(cfg.chartmogul_base_url, CHART_MOGUL_HOST);
        assert!(cfg.pg_connection_string().is_none());
        assert_eq!(cfg.client_options(), ClientOptions::default());
    }

    #[test]
    fn test_overrides() {
        let cfg: AppConfiguration = envy::prefixed("CB_")
            .from_iter(vec![
                ("CB_DATABASE_URL".to_string(), "postgres://cb@localhost/cb".to_string()),
                ("CB_PROVIDER_REQUESTS_PER_SECOND".to_string(), "10".to_string()),
                ("CB_PROVIDER_MAX_RETRIES".to_string(), "3".to_string()),
            ])
            .unwrap();

        assert_eq!(cfg.pg_connection_string().map(|c| c.0), Some("postgres://cb@localhost/cb".to_string()));
        assert_eq!(
            cfg.client_options(),
            ClientOptions {
                requests_per_second: 10,
                max_retries: 3
            }
        );
    }
}
