use super::{SearchTrigger, ShowSearcher, StatusSource, api_logging::log_api_error};
use crate::config::{AuthStyle, Config};
use anyhow::Result;
use async_trait::async_trait;
use medusa_api::{
    apis::{
        config_api::get_main_config,
        configuration::{ApiKey, Configuration},
        search_api::{MANUAL_SEARCH_STATUS_PATH, episode_search, manual_search_status},
        show_lookup_api::search_indexers_for_show_name,
    },
    commands::{EpisodeSearchCommand, ScopeParams},
    models::{MainConfig, SearchJob, SearchResult, ShowLookupResult, ShowScope},
};
use tracing::{debug, info, trace};
use url::Url;

#[derive(Debug, Clone)]
pub struct Medusa {
    config: Configuration,
    main: MainConfig,
    status_path: String,
    scope_params: ScopeParams,
}

impl Medusa {
    /// Builds the Medusa connection and loads the server configuration through it
    pub async fn new(
        base_path: String,
        key: String,
        auth: AuthStyle,
        status_path: String,
        scope_params: ScopeParams,
        client: reqwest::Client,
    ) -> Result<Self> {
        info!("Connecting to Medusa at {}", base_path);

        let mut config = Configuration::new(base_path, client);
        match auth {
            AuthStyle::Header => config.api_key = Some(ApiKey { prefix: None, key }),
            AuthStyle::Bearer => config.bearer_access_token = Some(key),
        }

        // Nothing else can run without this, so a failure here ends the process
        let main = get_main_config(&config).await.inspect_err(|e| {
            log_api_error(e, "Failed to get configuration from Medusa");
        })?;
        debug!(web_root = %main.web_root, theme = ?main.theme_name, "Loaded server configuration");

        Ok(Self {
            config,
            main,
            status_path,
            scope_params,
        })
    }

    pub async fn connect(config: &Config, client: reqwest::Client) -> Result<Self> {
        Self::new(
            config.url.clone(),
            config.api_key.clone(),
            config.auth,
            config
                .poll
                .status_path
                .clone()
                .unwrap_or_else(|| MANUAL_SEARCH_STATUS_PATH.to_string()),
            config.poll.scope_params.unwrap_or_default(),
            client,
        )
        .await
    }

    pub fn main_config(&self) -> &MainConfig {
        &self.main
    }

    /// Where the UI notification socket lives for this installation
    pub fn socket_url(&self) -> Result<Url> {
        crate::notifications::socket_url(&self.config.base_path, &self.main.web_root)
    }

    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        self.config.auth_headers()
    }
}

#[async_trait]
impl StatusSource for Medusa {
    async fn fetch(&self, scope: Option<&ShowScope>) -> Result<Vec<SearchJob>> {
        // Failures are reported by the poller, which owns the backoff
        let status =
            manual_search_status(&self.config, &self.status_path, scope, self.scope_params).await?;
        let jobs = status.into_jobs();
        trace!(count = jobs.len(), "Got manual search status");
        Ok(jobs)
    }
}

#[async_trait]
impl SearchTrigger for Medusa {
    async fn trigger(&self, command: &EpisodeSearchCommand) -> Result<SearchResult> {
        info!(
            episode = %command.key(),
            retry = command.is_retry(),
            "Submitting manual search"
        );
        let result = episode_search(&self.config, command)
            .await
            .inspect_err(|e| {
                log_api_error(e, "Failed to submit manual search");
            })?;
        debug!(result = %result.result, quality = ?result.quality, "Search submission answered");
        Ok(result)
    }
}

#[async_trait]
impl ShowSearcher for Medusa {
    async fn lookup(&self, term: &str, indexer: Option<i64>) -> Result<Vec<ShowLookupResult>> {
        info!("Searching indexers for show: {}", term);
        let response = search_indexers_for_show_name(&self.config, term, indexer)
            .await
            .inspect_err(|e| {
                log_api_error(e, "Failed to search indexers");
            })?;
        debug!("Found {} show results", response.results.len());
        Ok(response.results)
    }
}
