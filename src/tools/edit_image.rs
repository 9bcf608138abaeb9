//! Image editing / merging across several img2img models.
//!
//! `aspect_ratio` and `resolution` only reach the job for gemini-3. When gemini-3 is
//! asked without a ratio, the ratio is taken from the first source image.
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{AppError, AppResult};
use crate::prodia::{JobOptions, JobRequest};
use crate::ratio::matcher::is_known;
use crate::ratio::probe::ratio_from_image_in;
use crate::ratio::GEMINI_RATIOS;
use crate::tools::{
    fetch_sources, parse_params, require_prompt, require_sources, truncate_prompt, Tool, ToolCall, ToolContext,
    ToolOutput,
};

pub const NAME: &str = "editImage";

pub const DEFAULT_MODEL: &str = "nano-banana";
const GEMINI_MODEL: &str = "gemini-3";
const DEFAULT_RESOLUTION: &str = "2K";
const RESOLUTIONS: [&str; 3] = ["1K", "2K", "4K"];

/// Human-facing model names and the job types they run.
pub const EDITOR_MODELS: &[(&str, &str)] = &[
    ("nano-banana", "inference.nano-banana.img2img.v2"),
    ("qwen-fast", "inference.qwen.image-edit.plus.lightning.img2img.v2"),
    ("qwen-quality", "inference.qwen.image-edit.plus.img2img.v2"),
    ("seedream-4", "inference.seedream-4.img2img.v1"),
    ("gemini-3", "inference.gemini-3-pro.img2img.v1"),
    ("flux", "inference.flux-kontext.pro.txt2img.v2"),
];

pub fn editor_job_type(model: &str) -> Option<&'static str> {
    EDITOR_MODELS.iter().find(|(name, _)| *name == model).map(|(_, job_type)| *job_type)
}

#[derive(Debug, Deserialize)]
struct Params {
    prompt: String,
    #[serde(default)]
    source: Vec<String>,
    model: Option<String>,
    aspect_ratio: Option<String>,
    resolution: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub prompt: String,
    pub sources: Vec<String>,
    pub model: String,
    pub job_type: &'static str,
    pub aspect_ratio: Option<String>,
    pub resolution: String,
}

impl EditRequest {
    fn from_params(params: Params) -> AppResult<Self> {
        require_prompt(&params.prompt)?;
        require_sources(&params.source)?;

        let model = params
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let job_type = editor_job_type(&model)
            .ok_or_else(|| AppError::InvalidParams(format!("unknown model '{}'", model)))?;

        // Only gemini-3 receives these two; other models ignore whatever was passed.
        let is_gemini = model == GEMINI_MODEL;
        let aspect_ratio = params.aspect_ratio.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if let Some(r) = aspect_ratio.as_deref() {
            if is_gemini && !is_known(GEMINI_RATIOS, r) {
                return Err(AppError::InvalidParams(format!("unsupported aspect_ratio '{}'", r)));
            }
        }

        let resolution = params
            .resolution
            .map(|r| r.trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_RESOLUTION.to_string());
        if is_gemini && !RESOLUTIONS.contains(&resolution.as_str()) {
            return Err(AppError::InvalidParams(format!("unsupported resolution '{}'", resolution)));
        }

        Ok(EditRequest {
            prompt: params.prompt,
            sources: params.source,
            model,
            job_type,
            aspect_ratio,
            resolution,
        })
    }

    pub fn is_gemini(&self) -> bool {
        self.model == GEMINI_MODEL
    }

    /// Build the job once the source images are known.
    pub fn job(&self, inputs: &[Vec<u8>]) -> JobRequest {
        let mut config = Map::new();
        config.insert("prompt".to_string(), json!(self.prompt));
        if self.is_gemini() {
            let ratio = match self.aspect_ratio.as_deref() {
                Some(r) => r.to_string(),
                None => inputs
                    .first()
                    .map(|first| ratio_from_image_in(GEMINI_RATIOS, first))
                    .unwrap_or("1:1")
                    .to_string(),
            };
            config.insert("aspect_ratio".to_string(), json!(ratio));
            config.insert("resolution".to_string(), json!(self.resolution));
        }
        JobRequest::new(self.job_type, Value::Object(config))
    }
}

pub struct EditImage;

#[async_trait]
impl Tool for EditImage {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "A tool that help you to edit or merge some Image. Finally,show user the picture in markdown format like ![image](url)."
    }

    fn parameters(&self) -> Value {
        let models: Vec<&str> = EDITOR_MODELS.iter().map(|(name, _)| *name).collect();
        let ratios: Vec<&str> = GEMINI_RATIOS.iter().map(|r| r.label).collect();
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt for the editing, default to be in English if the user does not specify a language."
                },
                "source": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "The source image urls for the editing."
                },
                "model": {
                    "type": "string",
                    "description": "The image model for the editing.",
                    "enum": models
                },
                "aspect_ratio": {
                    "type": "string",
                    "enum": ratios,
                    "description": "Only Available With Model Gemini 3. Aspect ratio of output image. Inferred from the first source image when omitted."
                },
                "resolution": {
                    "type": "string",
                    "default": DEFAULT_RESOLUTION,
                    "enum": RESOLUTIONS,
                    "description": "Only Available With Model Gemini 3. Resolution/image size of output. Use uppercase K."
                }
            },
            "required": ["prompt", "source", "model"]
        })
    }

    async fn call(&self, call: &ToolCall, ctx: &ToolContext) -> AppResult<ToolOutput> {
        let prodia = ctx.prodia()?;
        let request = EditRequest::from_params(parse_params(call)?)?;
        let origin = call.user.origin.as_str();
        ctx.host.check(origin)?;

        let result: AppResult<String> = async {
            let inputs = fetch_sources(&ctx.http, &request.sources).await?;
            let job = request.job(&inputs);
            let image = prodia.job(&job, &JobOptions::jpeg().with_inputs(inputs)).await?;
            ctx.host.store(origin, image).await
        }
        .await;

        match result {
            Ok(url) => Ok(ToolOutput { url }),
            Err(e) => {
                tracing::error!(
                    prompt = %truncate_prompt(&request.prompt),
                    model = %request.model,
                    source_count = request.sources.len(),
                    origin,
                    error = %e,
                    "editImage failed"
                );
                Err(AppError::tool("编辑", e))
            }
        }
    }
}
