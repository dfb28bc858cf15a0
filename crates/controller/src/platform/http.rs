//! Platform client over plain HTTP: a health URL and an optional deploy hook.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::instrument;
use url::Url;

use super::{DeployReport, Platform, PlatformClient, PlatformError, Probe, SyncReport};
use crate::config::PlatformConfig;

/// Per-request timeout for every platform call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("TechMart-Controller/", env!("CARGO_PKG_VERSION"));

pub struct HttpPlatform {
    platform: Platform,
    http: reqwest::Client,
    health_url: Url,
    deploy_hook: Option<Url>,
    token: Option<SecretString>,
}

impl HttpPlatform {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &PlatformConfig) -> Self {
        Self {
            platform: config.platform,
            http,
            health_url: config.health_url.clone(),
            deploy_hook: config.deploy_hook.clone(),
            token: config.token.clone(),
        }
    }

    /// The shared client: 10 second timeout, controller user agent.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the TLS backend fails to initialize.
    pub fn client() -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|source| PlatformError::Transport {
                platform: self.platform,
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(PlatformError::Status {
                platform: self.platform,
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl PlatformClient for HttpPlatform {
    fn platform(&self) -> Platform {
        self.platform
    }

    #[instrument(skip(self), fields(platform = %self.platform))]
    async fn health(&self) -> Result<Probe, PlatformError> {
        let response = self.send(self.http.get(self.health_url.clone())).await?;
        Ok(Probe {
            http_status: response.status().as_u16(),
        })
    }

    /// A deployment is in sync once its health URL answers.
    #[instrument(skip(self), fields(platform = %self.platform))]
    async fn sync(&self) -> Result<SyncReport, PlatformError> {
        self.health().await?;
        Ok(SyncReport {
            platform: self.platform,
            message: format!("{} deployment synchronized", self.platform),
        })
    }

    #[instrument(skip(self), fields(platform = %self.platform))]
    async fn deploy(&self, service: Option<&str>) -> Result<DeployReport, PlatformError> {
        let hook = self
            .deploy_hook
            .clone()
            .ok_or(PlatformError::NotConfigured(self.platform))?;
        self.send(self.http.post(hook).json(&json!({ "service": service })))
            .await?;
        tracing::info!(service, "Deployment triggered");
        Ok(DeployReport {
            platform: self.platform,
            service: service.map(str::to_owned),
            status: "triggered",
            message: "Deployment initiated".to_owned(),
        })
    }
}
