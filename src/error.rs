//! Common error type and result alias.
//!
//! User-facing messages are localized the way the chat host shows them; the
//! wrapped cause stays reachable through `source()`.
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("请先配置Prodia token")]
    MissingToken,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("Prodia 返回无效响应: {0}")]
    InvalidResponse(String),

    #[error("Prodia request failed. Status: {status}, Body: {body}")]
    Prodia { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to fetch source image {url}: status {status}")]
    Fetch { url: String, status: u16 },

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Tool {
        message: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Wrap a failure into the message shown to the user, e.g. `绘图失败，请稍后重试: ...`.
    pub fn tool(verb: &str, cause: AppError) -> Self {
        AppError::Tool {
            message: format!("{}失败，请稍后重试: {}", verb, cause),
            source: Box::new(cause),
        }
    }

    /// Transport failures, rate limiting and provider-side 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::HttpClient(_) => true,
            AppError::Prodia { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
