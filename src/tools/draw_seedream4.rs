//! Text-to-image with seedream-4. The ratio label is turned into a 2048-edge canvas.
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::prodia::{JobOptions, JobRequest};
use crate::ratio::ratio_to_resolution;
use crate::tools::{parse_params, require_prompt, truncate_prompt, Tool, ToolCall, ToolContext, ToolOutput};

pub const NAME: &str = "drawSeedream4";

const SEEDREAM_TXT2IMG: &str = "inference.seedream-4.txt2img.v1";
const DEFAULT_RATIO: &str = "3:4";
const OFFERED_RATIOS: [&str; 5] = ["1:1", "3:4", "16:9", "4:3", "9:16"];

#[derive(Debug, Deserialize)]
struct Params {
    prompt: String,
    ratio: Option<String>,
}

/// Output size for a requested ratio. Labels this tool does not offer get a square.
pub fn offered_resolution(ratio: &str) -> (u32, u32) {
    if OFFERED_RATIOS.contains(&ratio) {
        ratio_to_resolution(ratio)
    } else {
        ratio_to_resolution("1:1")
    }
}

pub fn seedream_job(prompt: &str, ratio: &str) -> JobRequest {
    let (width, height) = offered_resolution(ratio);
    JobRequest::new(
        SEEDREAM_TXT2IMG,
        json!({
            "prompt": prompt,
            "width": width,
            "height": height,
        }),
    )
}

pub struct DrawSeedream4;

#[async_trait]
impl Tool for DrawSeedream4 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Use seedream-4 to generate images from text prompts. Provide a ratio and prompt; the tool maps ratio to recommended resolution (max dimension 2048). Returns { url } to the generated image.Response user with the picture in markdown format like ![image](url)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The text prompt for generation."
                },
                "ratio": {
                    "type": "string",
                    "description": "Desired aspect ratio. Tool maps ratio to resolution.",
                    "enum": OFFERED_RATIOS
                }
            },
            "required": ["prompt"]
        })
    }

    async fn call(&self, call: &ToolCall, ctx: &ToolContext) -> AppResult<ToolOutput> {
        let prodia = ctx.prodia()?;
        let params: Params = parse_params(call)?;
        require_prompt(&params.prompt)?;
        let ratio = params
            .ratio
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_RATIO);
        let job = seedream_job(&params.prompt, ratio);
        let origin = call.user.origin.as_str();
        ctx.host.check(origin)?;
        let options = JobOptions::jpeg();

        let result: AppResult<String> = async {
            let image = ctx.retry.run(NAME, |_| prodia.job(&job, &options)).await?;
            ctx.host.store(origin, image).await
        }
        .await;

        match result {
            Ok(url) => Ok(ToolOutput { url }),
            Err(e) => {
                let (width, height) = offered_resolution(ratio);
                tracing::error!(
                    prompt = %truncate_prompt(&params.prompt),
                    ratio,
                    width,
                    height,
                    origin,
                    error = %e,
                    "drawSeedream4 failed"
                );
                Err(AppError::tool("生成", e))
            }
        }
    }
}
