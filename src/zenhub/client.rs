use color_eyre::{eyre::eyre, Result};
use reqwest::header::AUTHORIZATION;
use url::Url;

use crate::config::Config;

use super::api_types::{RawSprintData, RpcEnvelope};

/// HTTP client for the backend's sprint-data RPC.
#[derive(Clone)]
pub struct ZenhubClient {
  http: reqwest::Client,
  base_url: Url,
  token: String,
}

impl ZenhubClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;

    let base_url = Url::parse(&config.backend.url)
      .map_err(|e| eyre!("Invalid backend URL {}: {}", config.backend.url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("z9s/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token,
    })
  }

  /// Fetch workspace/sprint/issue data for a project.
  ///
  /// `refresh` is forwarded to the backend so it can bypass its own
  /// upstream cache.
  pub async fn get_sprint_data(&self, project: &str, refresh: bool) -> Result<RawSprintData> {
    let url = self
      .base_url
      .join("/api/method/zenhub.get_sprint_data")
      .map_err(|e| eyre!("Failed to build endpoint URL: {}", e))?;

    let response = self
      .http
      .get(url)
      .query(&[("project", project), ("refresh", if refresh { "1" } else { "0" })])
      .header(AUTHORIZATION, format!("token {}", self.token))
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach backend: {}", e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!(
        "Sprint data request for {} failed: HTTP {}",
        project,
        status
      ));
    }

    let envelope: RpcEnvelope<RawSprintData> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse sprint data for {}: {}", project, e))?;

    Ok(envelope.message)
  }
}
