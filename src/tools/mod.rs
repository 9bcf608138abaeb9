//! Function-calling tools backed by Prodia.
//!
//! A tool declares a JSON schema for its parameters and turns one call into one
//! Prodia job. The produced image is handed to an [`ImageHost`] and the tool
//! returns the hosted URL, meant to be shown as `![image](url)`.
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::hosting::{ImageHost, StaticDriveHost};
use crate::prodia::{ProdiaClient, RetryPolicy};

pub mod draw_painting;
pub mod draw_seedream4;
pub mod edit_image;
pub mod edit_seedream4;
pub mod registry;

pub use draw_painting::DrawPainting;
pub use draw_seedream4::DrawSeedream4;
pub use edit_image::EditImage;
pub use edit_seedream4::EditSeedream4;
pub use registry::ToolRegistry;

/// Prompts are cut to this many characters in logs.
pub const LOG_PROMPT_CHARS: usize = 120;

/// Caller-side metadata; `origin` is where the host can be reached from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Caller {
    #[serde(default)]
    pub origin: String,
}

/// One invocation record as produced by the function-calling layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub user: Caller,
}

impl ToolCall {
    pub fn new(params: Value, origin: impl Into<String>) -> Self {
        ToolCall { params, user: Caller { origin: origin.into() } }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub url: String,
}

/// Everything a tool needs besides the call itself.
#[derive(Clone)]
pub struct ToolContext {
    pub token: Option<String>,
    pub prodia_url: String,
    pub retry: RetryPolicy,
    pub host: Arc<dyn ImageHost>,
    pub http: reqwest::Client,
}

impl ToolContext {
    pub fn new(token: Option<String>, prodia_url: impl Into<String>, host: Arc<dyn ImageHost>) -> Self {
        ToolContext {
            token,
            prodia_url: prodia_url.into(),
            retry: RetryPolicy::default(),
            host,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let host = StaticDriveHost::new(&config.static_drive_path, config.public_base_url.clone());
        ToolContext::new(config.prodia_token.clone(), config.prodia_url.clone(), Arc::new(host))
            .with_retry(config.retry_policy())
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// A fresh client for this call. Fails when no token is configured.
    pub fn prodia(&self) -> AppResult<ProdiaClient> {
        match self.token.as_deref() {
            Some(token) if !token.is_empty() => Ok(ProdiaClient::new(self.prodia_url.clone(), token)),
            _ => Err(AppError::MissingToken),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the `params` object.
    fn parameters(&self) -> Value;

    async fn call(&self, call: &ToolCall, ctx: &ToolContext) -> AppResult<ToolOutput>;

    fn schema(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "parameters": self.parameters(),
        })
    }
}

pub(crate) fn parse_params<P: DeserializeOwned>(call: &ToolCall) -> AppResult<P> {
    let params = if call.params.is_null() { json!({}) } else { call.params.clone() };
    serde_json::from_value(params).map_err(|e| AppError::InvalidParams(e.to_string()))
}

pub(crate) fn require_prompt(prompt: &str) -> AppResult<()> {
    if prompt.trim().is_empty() {
        return Err(AppError::InvalidParams("prompt must not be empty".to_string()));
    }
    Ok(())
}

pub(crate) fn require_sources(sources: &[String]) -> AppResult<()> {
    if sources.is_empty() {
        return Err(AppError::InvalidParams("source must contain at least one image url".to_string()));
    }
    Ok(())
}

pub(crate) fn truncate_prompt(prompt: &str) -> String {
    prompt.chars().take(LOG_PROMPT_CHARS).collect()
}

/// Download all source images concurrently, preserving order.
pub(crate) async fn fetch_sources(http: &reqwest::Client, urls: &[String]) -> AppResult<Vec<Vec<u8>>> {
    try_join_all(urls.iter().map(|url| fetch_source(http, url))).await
}

async fn fetch_source(http: &reqwest::Client, url: &str) -> AppResult<Vec<u8>> {
    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Fetch { url: url.to_string(), status: status.as_u16() });
    }
    Ok(response.bytes().await?.to_vec())
}
