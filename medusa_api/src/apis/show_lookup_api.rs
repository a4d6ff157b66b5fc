use super::{Error, configuration::Configuration, read_json};
use crate::models::ShowLookupResponse;
use reqwest::RequestBuilder;

pub const SHOW_LOOKUP_PATH: &str = "addShows/searchIndexersForShowName";

pub fn search_indexers_for_show_name_request(
    configuration: &Configuration,
    term: &str,
    indexer: Option<i64>,
) -> Result<RequestBuilder, Error> {
    let mut query = vec![("search_term", term.to_string())];
    if let Some(indexer) = indexer {
        query.push(("indexer", indexer.to_string()));
    }
    Ok(configuration
        .get(configuration.endpoint(SHOW_LOOKUP_PATH)?)
        .query(&query))
}

pub async fn search_indexers_for_show_name(
    configuration: &Configuration,
    term: &str,
    indexer: Option<i64>,
) -> Result<ShowLookupResponse, Error> {
    let resp = search_indexers_for_show_name_request(configuration, term, indexer)?
        .send()
        .await?;
    read_json(resp).await
}
