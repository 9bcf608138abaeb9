//! Text-to-image with flux: orientation picks the canvas, quality picks dev or pro.
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::prodia::{JobOptions, JobRequest};
use crate::tools::{parse_params, require_prompt, truncate_prompt, Tool, ToolCall, ToolContext, ToolOutput};

pub const NAME: &str = "drawPainting";

const FLUX_DEV: &str = "inference.flux.dev.txt2img.v1";
const FLUX_PRO: &str = "inference.flux.pro.txt2img.v1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    /// Case-insensitive; anything unrecognised is landscape.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("portrait") => Orientation::Portrait,
            Some("square") => Orientation::Square,
            _ => Orientation::Landscape,
        }
    }

    pub fn size(self) -> (u32, u32) {
        match self {
            Orientation::Landscape => (1024, 768),
            Orientation::Portrait => (768, 1024),
            Orientation::Square => (1024, 1024),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    Fast,
    High,
}

impl Quality {
    /// Only the exact value `high` selects pro; anything else is fast.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("high") => Quality::High,
            _ => Quality::Fast,
        }
    }

    pub fn job_type(self) -> &'static str {
        match self {
            Quality::High => FLUX_PRO,
            Quality::Fast => FLUX_DEV,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Fast => "fast",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Params {
    prompt: String,
    orientation: Option<String>,
    quality: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaintingRequest {
    pub prompt: String,
    pub orientation: Orientation,
    pub quality: Quality,
}

impl PaintingRequest {
    pub fn job(&self) -> JobRequest {
        let (width, height) = self.orientation.size();
        JobRequest::new(
            self.quality.job_type(),
            json!({
                "prompt": self.prompt,
                "guidance_scale": 3,
                "steps": 25,
                "width": width,
                "height": height,
            }),
        )
    }
}

pub struct DrawPainting;

#[async_trait]
impl Tool for DrawPainting {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "A tool that help you to draw a painting. You can adjust the style, quality and orientation of the painting.The default config is landscape,fast.finally,show user the picture in markdown format like ![image](url)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt for the painting."
                },
                "orientation": {
                    "type": "string",
                    "description": "The orientation of the painting: landscape(横), portrait(竖), square(方)",
                    "enum": ["landscape", "portrait", "square"]
                },
                "quality": {
                    "type": "string",
                    "description": "The quality of the painting: fast(快速) or high(优质)",
                    "enum": ["fast", "high"]
                }
            },
            "required": ["prompt"]
        })
    }

    async fn call(&self, call: &ToolCall, ctx: &ToolContext) -> AppResult<ToolOutput> {
        let prodia = ctx.prodia()?;
        let params: Params = parse_params(call)?;
        require_prompt(&params.prompt)?;
        let request = PaintingRequest {
            orientation: Orientation::parse(params.orientation.as_deref()),
            quality: Quality::parse(params.quality.as_deref()),
            prompt: params.prompt,
        };
        let job = request.job();
        let origin = call.user.origin.as_str();
        ctx.host.check(origin)?;

        let result: AppResult<String> = async {
            let image = prodia.job(&job, &JobOptions::jpeg()).await?;
            ctx.host.store(origin, image).await
        }
        .await;

        match result {
            Ok(url) => Ok(ToolOutput { url }),
            Err(e) => {
                let (width, height) = request.orientation.size();
                tracing::error!(
                    prompt = %truncate_prompt(&request.prompt),
                    orientation = request.orientation.as_str(),
                    quality = request.quality.as_str(),
                    width,
                    height,
                    origin,
                    error = %e,
                    "drawPainting failed"
                );
                Err(AppError::tool("绘图", e))
            }
        }
    }
}
