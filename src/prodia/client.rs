//! Thin HTTP client for the Prodia v2 job endpoint.
//!
//! - `job` posts a job to `/v2/job` and returns the produced image bytes.
//!   Without inputs the body is the job JSON; with inputs it is a multipart form
//!   holding a `job` part and one `input` part per image.
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::error::{AppError, AppResult};
use crate::prodia::job::{JobOptions, JobRequest};

#[derive(Clone)]
pub struct ProdiaClient {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for ProdiaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProdiaClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl ProdiaClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        ProdiaClient { client: Client::new(), base_url: base, token: token.into() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit one job and wait for its output image.
    pub async fn job(&self, job: &JobRequest, options: &JobOptions) -> AppResult<Vec<u8>> {
        let url = format!("{}/v2/job", self.base_url);
        tracing::info!(job_type = %job.job_type, inputs = options.inputs.len(), "Submitting Prodia job");
        tracing::debug!("Job config: {}", job.config);

        let request = self.client.post(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, options.accept.as_str());
        let request = if options.inputs.is_empty() {
            request.json(job)
        } else {
            request.multipart(job_form(job, &options.inputs)?)
        };

        let response = request.send().await.map_err(AppError::HttpClient)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!("Prodia job failed. Status: {}, Body: {}", status, body);
            return Err(AppError::Prodia { status: status.as_u16(), body });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        if let Some(ct) = content_type.as_deref() {
            if !ct.starts_with("image/") {
                return Err(AppError::InvalidResponse(format!("unexpected content type '{}'", ct)));
            }
        }

        let bytes = response.bytes().await.map_err(AppError::HttpClient)?;
        if bytes.is_empty() {
            return Err(AppError::InvalidResponse("empty body".to_string()));
        }
        tracing::info!(bytes = bytes.len(), "Prodia job finished");
        Ok(bytes.to_vec())
    }
}

fn job_form(job: &JobRequest, inputs: &[Vec<u8>]) -> AppResult<Form> {
    let job_json = serde_json::to_string(job)
        .map_err(|e| AppError::InvalidParams(format!("job is not serializable: {}", e)))?;
    let mut form = Form::new().part(
        "job",
        Part::text(job_json).file_name("job.json").mime_str("application/json")?,
    );
    for (i, input) in inputs.iter().enumerate() {
        let (mime, ext) = match image::guess_format(input) {
            Ok(fmt) => (fmt.to_mime_type(), fmt.extensions_str().first().copied().unwrap_or("bin")),
            Err(_) => ("application/octet-stream", "bin"),
        };
        let part = Part::bytes(input.clone())
            .file_name(format!("input-{}.{}", i, ext))
            .mime_str(mime)?;
        form = form.part("input", part);
    }
    Ok(form)
}
