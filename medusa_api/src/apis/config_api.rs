use super::{Error, configuration::Configuration, read_json};
use crate::models::MainConfig;

pub const MAIN_CONFIG_PATH: &str = "api/v2/config/main";

pub async fn get_main_config(configuration: &Configuration) -> Result<MainConfig, Error> {
    let resp = configuration
        .get(configuration.endpoint(MAIN_CONFIG_PATH)?)
        .send()
        .await?;
    read_json(resp).await
}
