use super::{Error, configuration::Configuration, read_json};
use crate::{
    commands::{EpisodeSearchCommand, ScopeParams},
    models::{ManualSearchStatus, SearchResult, ShowScope},
};
use reqwest::RequestBuilder;

pub const MANUAL_SEARCH_STATUS_PATH: &str = "home/getManualSearchStatus";

/// Build the status request; scope parameters are only added when polling a single show
pub fn manual_search_status_request(
    configuration: &Configuration,
    path: &str,
    scope: Option<&ShowScope>,
    params: ScopeParams,
) -> Result<RequestBuilder, Error> {
    let mut req = configuration.get(configuration.endpoint(path)?);
    if let Some(scope) = scope {
        req = req.query(&params.query(scope));
    }
    Ok(req)
}

pub async fn manual_search_status(
    configuration: &Configuration,
    path: &str,
    scope: Option<&ShowScope>,
    params: ScopeParams,
) -> Result<ManualSearchStatus, Error> {
    let resp = manual_search_status_request(configuration, path, scope, params)?
        .send()
        .await?;
    read_json(resp).await
}

pub fn episode_search_request(
    configuration: &Configuration,
    command: &EpisodeSearchCommand,
) -> Result<RequestBuilder, Error> {
    Ok(configuration
        .get(configuration.endpoint(command.path())?)
        .query(command))
}

pub async fn episode_search(
    configuration: &Configuration,
    command: &EpisodeSearchCommand,
) -> Result<SearchResult, Error> {
    let resp = episode_search_request(configuration, command)?
        .send()
        .await?;
    read_json(resp).await
}
