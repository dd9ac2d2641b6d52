use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{core::Dispatch, prelude::*};

/// Octopus Energy (Kraken) GraphQL API.
pub struct Api {
    client: Client,
    base_url: Url,
    api_key: String,
    token: Option<String>,
}

impl Api {
    pub fn new(base_url: Url, api_key: String) -> Result<Self> {
        ensure!(!api_key.is_empty(), "Octopus API key is required");
        let client =
            Client::builder().user_agent("octosynk").timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, base_url, api_key, token: None })
    }

    /// Exchange the API key for a Kraken token.
    #[instrument(skip_all)]
    pub async fn authenticate(&mut self) -> Result {
        #[derive(Serialize)]
        struct Variables<'a> {
            input: Input<'a>,
        }

        #[derive(Serialize)]
        struct Input<'a> {
            #[serde(rename = "APIKey")]
            api_key: &'a str,
        }

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "obtainKrakenToken")]
            obtain_kraken_token: Option<ObtainKrakenToken>,
        }

        #[derive(Deserialize)]
        struct ObtainKrakenToken {
            token: Option<String>,
        }

        info!("authenticating…");
        let data: Data = self
            .query(
                "ObtainKrakenToken",
                "mutation ObtainKrakenToken($input: ObtainJSONWebTokenInput!) { obtainKrakenToken(input: $input) { token payload refreshToken refreshExpiresIn } }",
                Variables { input: Input { api_key: &self.api_key } },
            )
            .await?;
        let token = data
            .obtain_kraken_token
            .and_then(|response| response.token)
            .context("failed to acquire an authentication token")?;
        self.token = Some(token);
        Ok(())
    }

    #[instrument(skip_all, fields(device_id = device_id))]
    pub async fn get_planned_dispatches(&self, device_id: &str) -> Result<Vec<Dispatch>> {
        #[derive(Serialize)]
        struct Variables<'a> {
            #[serde(rename = "deviceId")]
            device_id: &'a str,
        }

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "flexPlannedDispatches", default)]
            dispatches: Vec<PlannedDispatch>,
        }

        ensure!(self.token.is_some(), "authentication required, no token acquired");
        info!("fetching…");
        let data: Data = self
            .query(
                "FlexPlannedDispatches",
                "query FlexPlannedDispatches($deviceId: String!) { flexPlannedDispatches(deviceId: $deviceId) { start end type energyAddedKwh } }",
                Variables { device_id },
            )
            .await?;
        info!(len = data.dispatches.len(), "fetched");
        Ok(data
            .dispatches
            .into_iter()
            .map(|dispatch| Dispatch { start: dispatch.start, end: dispatch.end })
            .collect())
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(operation_name = operation_name))]
    async fn query<V: Serialize, D: DeserializeOwned>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<D> {
        let mut request = self
            .client
            .post(self.base_url.clone())
            .json(&Request { operation_name, query, variables });
        if let Some(token) = &self.token {
            request = request.header(http::header::AUTHORIZATION, token);
        }
        request
            .send()
            .await
            .with_context(|| format!("failed to call `{operation_name}`"))?
            .error_for_status()
            .with_context(|| format!("`{operation_name}` failed"))?
            .json::<Response<D>>()
            .await
            .with_context(|| format!("failed to deserialize `{operation_name}` response JSON"))?
            .into()
    }
}

#[derive(Serialize)]
struct Request<V> {
    #[serde(rename = "operationName")]
    operation_name: &'static str,

    query: &'static str,

    variables: V,
}

#[derive(Deserialize)]
struct Response<D> {
    data: Option<D>,

    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    #[serde(default = "GraphQlError::default_message")]
    message: String,

    #[serde(default)]
    extensions: Extensions,
}

impl GraphQlError {
    /// Kraken's code for an invalid API key or token.
    const AUTHENTICATION_FAILED: &'static str = "KT-CT-1124";

    fn default_message() -> String {
        "unknown error".to_string()
    }
}

#[derive(Default, Deserialize)]
struct Extensions {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

impl<D> From<Response<D>> for Result<D> {
    fn from(response: Response<D>) -> Self {
        if let Some(error) = response.errors.iter().find(|error| {
            error.extensions.error_code.as_deref() == Some(GraphQlError::AUTHENTICATION_FAILED)
        }) {
            bail!("Octopus authentication failed: {}", error.message);
        }
        if !response.errors.is_empty() {
            let messages = response.errors.iter().map(|error| error.message.as_str());
            bail!("Octopus GraphQL errors: {}", messages.collect::<Vec<_>>().join("; "));
        }
        response.data.context("Octopus returned no data")
    }
}

#[derive(Deserialize)]
struct PlannedDispatch {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}
