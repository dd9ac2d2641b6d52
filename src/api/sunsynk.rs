mod auth;
mod program;
mod response;
mod schedule;

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

pub use self::{
    auth::Credentials,
    program::Program,
    schedule::{N_PROGRAMS, ProgramWrite, Schedule, Transition},
};
use self::{program::build_settings, response::Response};
use crate::{cli::ChargeArgs, prelude::*};

/// Sunsynk Cloud inverter settings API.
pub struct Api {
    client: Client,
    base_url: Url,
    auth_url: Url,
    credentials: Credentials,
    token: Option<String>,
}

impl Api {
    pub fn new(base_url: Url, auth_url: Url, credentials: Credentials) -> Result<Self> {
        ensure!(!credentials.username.is_empty(), "Sunsynk username is required");
        let client =
            Client::builder().user_agent("octosynk").timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, base_url, auth_url, credentials, token: None })
    }

    /// Skip the login until the server rejects the token.
    #[cfg(test)]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    #[instrument(skip_all, fields(serial_number = serial_number))]
    pub async fn read_programs(&mut self, serial_number: &str) -> Result<Vec<Program>> {
        info!("reading…");
        let settings: Map<String, Value> = self
            .call::<(), _>(Method::GET, &format!("common/setting/{serial_number}/read"), None)
            .await?
            .context("Sunsynk returned no settings")?;
        (0..N_PROGRAMS).map(|index| Program::from_settings(&settings, index)).collect()
    }

    /// Reprogram a single program.
    #[instrument(skip_all, fields(serial_number = serial_number, index = write.index))]
    pub async fn write(
        &mut self,
        serial_number: &str,
        write: &ProgramWrite,
        charge: ChargeArgs,
    ) -> Result {
        info!(start = %write.transition.start, is_charging = write.transition.is_charging, "writing…");
        let _: Option<Value> = self
            .call(
                Method::POST,
                &format!("common/setting/{serial_number}/set"),
                Some(&build_settings(serial_number, write, charge)),
            )
            .await
            .with_context(|| format!("failed to write program #{}", write.index + 1))?;
        Ok(())
    }

    /// Send the request, logging in again once if the token got rejected.
    #[instrument(skip_all, level = Level::DEBUG, fields(method = %method, path = path))]
    async fn call<B, R>(&mut self, method: Method, path: &str, body: Option<&B>) -> Result<Option<R>>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let mut response = self.send(method.clone(), url.clone(), body).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("the token is rejected, logging in again…");
            self.token = None;
            response = self.send(method, url, body).await?;
        }
        response
            .error_for_status()
            .with_context(|| format!("`{path}` failed"))?
            .json::<Response<R>>()
            .await
            .with_context(|| format!("failed to deserialize `{path}` response JSON"))?
            .into()
    }

    async fn send<B: Serialize>(
        &mut self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let token = match self.token.clone() {
            Some(token) => token,
            None => {
                let token = auth::login(&self.client, &self.auth_url, &self.credentials).await?;
                self.token = Some(token.clone());
                token
            }
        };
        let mut request = self.client.request(method, url.clone()).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.with_context(|| format!("failed to call `{url}`"))
    }
}
