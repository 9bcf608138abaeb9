//! Image editing with seedream-4, keeping the shape of the source picture.
//!
//! Without an explicit `ratio` the first source image is measured and the closest
//! standard ratio decides the output canvas.
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::prodia::{JobOptions, JobRequest};
use crate::ratio::matcher::is_known;
use crate::ratio::{ratio_from_image, ratio_to_resolution, STANDARD_RATIOS};
use crate::tools::{
    fetch_sources, parse_params, require_prompt, require_sources, truncate_prompt, Tool, ToolCall, ToolContext,
    ToolOutput,
};

pub const NAME: &str = "editSeedream4";

const SEEDREAM_IMG2IMG: &str = "inference.seedream-4.img2img.v1";

#[derive(Debug, Deserialize)]
struct Params {
    prompt: String,
    #[serde(default)]
    source: Vec<String>,
    ratio: Option<String>,
}

/// Explicit ratio if given, otherwise the one measured from the first input.
pub fn resolve_ratio(explicit: Option<&str>, inputs: &[Vec<u8>]) -> &'static str {
    if let Some(r) = explicit {
        if let Some(known) = STANDARD_RATIOS.iter().find(|c| c.label == r) {
            return known.label;
        }
    }
    inputs.first().map(|first| ratio_from_image(first)).unwrap_or("1:1")
}

pub fn seedream_edit_job(prompt: &str, ratio: &str) -> JobRequest {
    let (width, height) = ratio_to_resolution(ratio);
    JobRequest::new(
        SEEDREAM_IMG2IMG,
        json!({
            "prompt": prompt,
            "width": width,
            "height": height,
        }),
    )
}

pub struct EditSeedream4;

#[async_trait]
impl Tool for EditSeedream4 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Use seedream-4 to edit images. The output keeps the aspect ratio of the first source image unless a ratio is given (max dimension 2048). Response user with the picture in markdown format like ![image](url)."
    }

    fn parameters(&self) -> Value {
        let ratios: Vec<&str> = STANDARD_RATIOS.iter().map(|r| r.label).collect();
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt for the editing."
                },
                "source": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "The source image urls for the editing."
                },
                "ratio": {
                    "type": "string",
                    "description": "Output aspect ratio. Omit to follow the first source image.",
                    "enum": ratios
                }
            },
            "required": ["prompt", "source"]
        })
    }

    async fn call(&self, call: &ToolCall, ctx: &ToolContext) -> AppResult<ToolOutput> {
        let prodia = ctx.prodia()?;
        let params: Params = parse_params(call)?;
        require_prompt(&params.prompt)?;
        require_sources(&params.source)?;
        let explicit = params.ratio.as_deref().map(str::trim).filter(|r| !r.is_empty());
        if let Some(r) = explicit {
            if !is_known(STANDARD_RATIOS, r) {
                return Err(AppError::InvalidParams(format!("unsupported ratio '{}'", r)));
            }
        }
        let origin = call.user.origin.as_str();
        ctx.host.check(origin)?;
        let mut chosen = explicit.unwrap_or("").to_string();

        let result: AppResult<String> = async {
            let inputs = fetch_sources(&ctx.http, &params.source).await?;
            let ratio = resolve_ratio(explicit, &inputs);
            chosen = ratio.to_string();
            let job = seedream_edit_job(&params.prompt, ratio);
            let options = JobOptions::jpeg().with_inputs(inputs);
            let image = ctx.retry.run(NAME, |_| prodia.job(&job, &options)).await?;
            ctx.host.store(origin, image).await
        }
        .await;

        match result {
            Ok(url) => Ok(ToolOutput { url }),
            Err(e) => {
                tracing::error!(
                    prompt = %truncate_prompt(&params.prompt),
                    ratio = %chosen,
                    source_count = params.source.len(),
                    origin,
                    error = %e,
                    "editSeedream4 failed"
                );
                Err(AppError::tool("编辑", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbImage::new(w, h).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn explicit_ratio_wins() {
        assert_eq!(resolve_ratio(Some("16:9"), &[png(10, 30)]), "16:9");
    }

    #[test]
    fn measured_from_first_input() {
        assert_eq!(resolve_ratio(None, &[png(90, 210), png(50, 50)]), "9:21");
        assert_eq!(resolve_ratio(None, &[]), "1:1");
        assert_eq!(resolve_ratio(None, &[b"junk".to_vec()]), "1:1");
    }

    #[test]
    fn job_payload() {
        let job = seedream_edit_job("x", "21:9");
        assert_eq!(job.job_type, SEEDREAM_IMG2IMG);
        assert_eq!(job.config, json!({"prompt": "x", "width": 2048, "height": 878}));
    }
}
