//! Job request shapes for the Prodia v2 `/job` endpoint.
use serde::Serialize;
use serde_json::Value;

pub const ACCEPT_JPEG: &str = "image/jpeg";

/// `{"type": "...", "config": {...}}`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobRequest {
    #[serde(rename = "type")]
    pub job_type: String,
    pub config: Value,
}

impl JobRequest {
    pub fn new(job_type: impl Into<String>, config: Value) -> Self {
        JobRequest { job_type: job_type.into(), config }
    }
}

/// Transport options: the requested output MIME type and any input images.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub accept: String,
    pub inputs: Vec<Vec<u8>>,
}

impl JobOptions {
    pub fn jpeg() -> Self {
        JobOptions { accept: ACCEPT_JPEG.to_string(), inputs: Vec::new() }
    }

    pub fn with_inputs(mut self, inputs: Vec<Vec<u8>>) -> Self {
        self.inputs = inputs;
        self
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        Self::jpeg()
    }
}
