use clap::Parser;
use reqwest::Url;

use crate::{api::octopus, prelude::*};

#[derive(Parser)]
pub struct OctopusApiArgs {
    #[clap(long = "octopus-api-key", env = "OCTOPUS_API_KEY")]
    pub api_key: String,

    /// Smart charging device ID, as seen in the Octopus account.
    #[clap(long = "device-id", env = "DEVICE_ID")]
    pub device_id: String,

    #[clap(
        long = "graphql-base-url",
        env = "GRAPHQL_BASE_URL",
        default_value = "https://api.octopus.energy/v1/graphql/"
    )]
    pub base_url: Url,
}

impl OctopusApiArgs {
    /// Authenticate and fetch the planned dispatches.
    pub async fn get_planned_dispatches(&self) -> Result<Vec<crate::core::Dispatch>> {
        let mut api = octopus::Api::new(self.base_url.clone(), self.api_key.clone())?;
        api.authenticate().await?;
        api.get_planned_dispatches(&self.device_id).await
    }
}
