use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, RgbImage};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prodia_tools::hosting::StaticDriveHost;
use prodia_tools::prodia::RetryPolicy;
use prodia_tools::{AppError, ToolCall, ToolContext, ToolRegistry};

const ORIGIN: &str = "http://bot.local";
const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

fn png(w: u32, h: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(w, h).write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn jpeg_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "image/jpeg")
        .set_body_bytes(FAKE_JPEG.to_vec())
}

fn context(server: &MockServer, drive: &TempDir, token: Option<&str>) -> ToolContext {
    let host = Arc::new(StaticDriveHost::new(drive.path(), None));
    ToolContext::new(token.map(str::to_string), server.uri(), host)
        .with_retry(RetryPolicy::linear(3, Duration::from_millis(5)))
}

async fn invoke(ctx: &ToolContext, name: &str, params: serde_json::Value) -> Result<String, AppError> {
    ToolRegistry::builtin()
        .invoke(name, &ToolCall::new(params, ORIGIN), ctx)
        .await
        .map(|out| out.url)
}

async fn job_bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/v2/job")
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

#[tokio::test]
async fn draw_painting_submits_flux_job_and_hosts_result() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .and(header("authorization", "Bearer tok"))
        .and(header("accept", "image/jpeg"))
        .and(body_json(json!({
            "type": "inference.flux.pro.txt2img.v1",
            "config": {"prompt": "a fox", "guidance_scale": 3, "steps": 25, "width": 1024, "height": 1024}
        })))
        .respond_with(jpeg_response())
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    let url = invoke(&ctx, "drawPainting", json!({"prompt": "a fox", "orientation": "square", "quality": "high"}))
        .await
        .unwrap();

    assert!(url.starts_with("http://bot.local/static/images/"), "{url}");
    let file = url.rsplit('/').next().unwrap();
    let stored = std::fs::read(drive.path().join("images").join(file)).unwrap();
    assert_eq!(stored, FAKE_JPEG);
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("POST")).respond_with(jpeg_response()).expect(0).mount(&server).await;

    let ctx = context(&server, &drive, None);
    for name in ["drawPainting", "drawSeedream4", "editImage", "editSeedream4"] {
        let err = invoke(&ctx, name, json!({"prompt": "x", "source": ["http://nowhere/a.png"]}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingToken), "{name}: {err}");
        assert_eq!(err.to_string(), "请先配置Prodia token");
    }
}

#[tokio::test]
async fn draw_painting_wraps_provider_error_after_one_attempt() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .respond_with(ResponseTemplate::new(500).set_body_string("gpu on fire"))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    let err = invoke(&ctx, "drawPainting", json!({"prompt": "x"})).await.unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("绘图失败，请稍后重试: "), "{message}");
    assert!(message.contains("gpu on fire"), "{message}");
    match err {
        AppError::Tool { source, .. } => assert!(matches!(*source, AppError::Prodia { status: 500, .. })),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn draw_painting_rejects_non_image_response() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "queued"})))
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    let err = invoke(&ctx, "drawPainting", json!({"prompt": "x"})).await.unwrap_err();
    match err {
        AppError::Tool { source, .. } => assert!(matches!(*source, AppError::InvalidResponse(_))),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_prompt_is_invalid_params() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    let ctx = context(&server, &drive, Some("tok"));
    let err = invoke(&ctx, "drawPainting", json!({"quality": "high"})).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidParams(_)), "{err}");
}

#[tokio::test]
async fn draw_seedream4_retries_transient_failures() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .and(body_json(json!({
            "type": "inference.seedream-4.txt2img.v1",
            "config": {"prompt": "harbor", "width": 1536, "height": 2048}
        })))
        .respond_with(jpeg_response())
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    let url = invoke(&ctx, "drawSeedream4", json!({"prompt": "harbor"})).await.unwrap();
    assert!(url.ends_with(".jpg"), "{url}");
    assert_eq!(job_bodies(&server).await.len(), 3);
}

#[tokio::test]
async fn draw_seedream4_surfaces_error_after_last_attempt() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    let err = invoke(&ctx, "drawSeedream4", json!({"prompt": "x", "ratio": "16:9"})).await.unwrap_err();
    assert!(err.to_string().starts_with("生成失败，请稍后重试: "), "{err}");
}

#[tokio::test]
async fn draw_seedream4_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    assert!(invoke(&ctx, "drawSeedream4", json!({"prompt": "x"})).await.is_err());
}

#[tokio::test]
async fn edit_seedream4_follows_source_shape() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/src/wide.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(210, 90)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(jpeg_response())
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    let source = format!("{}/src/wide.png", server.uri());
    invoke(&ctx, "editSeedream4", json!({"prompt": "make it night", "source": [source]}))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let job = requests.iter().find(|r| r.url.path() == "/v2/job").unwrap();
    let content_type = job.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");

    let body = String::from_utf8_lossy(&job.body);
    assert!(body.contains("inference.seedream-4.img2img.v1"));
    assert!(body.contains("\"width\":2048"), "{body}");
    assert!(body.contains("\"height\":878"), "{body}");
    assert!(body.contains("name=\"input\""));
}

#[tokio::test]
async fn edit_image_gemini_infers_ratio_from_first_source() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/src/photo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(150, 100)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/src/square.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(64, 64)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .respond_with(jpeg_response())
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    let sources = vec![format!("{}/src/photo.png", server.uri()), format!("{}/src/square.png", server.uri())];
    invoke(&ctx, "editImage", json!({"prompt": "merge", "source": sources, "model": "gemini-3"}))
        .await
        .unwrap();

    let bodies = job_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("inference.gemini-3-pro.img2img.v1"));
    assert!(bodies[0].contains("\"aspect_ratio\":\"3:2\""), "{}", bodies[0]);
    assert!(bodies[0].contains("\"resolution\":\"2K\""), "{}", bodies[0]);
    assert_eq!(bodies[0].matches("name=\"input\"").count(), 2);
}

#[tokio::test]
async fn edit_image_wraps_source_fetch_failure() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/src/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST")).respond_with(jpeg_response()).expect(0).mount(&server).await;

    let ctx = context(&server, &drive, Some("tok"));
    let source = format!("{}/src/missing.png", server.uri());
    let err = invoke(&ctx, "editImage", json!({"prompt": "x", "source": [source], "model": "qwen-fast"}))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("编辑失败，请稍后重试: "), "{err}");
    match err {
        AppError::Tool { source, .. } => assert!(matches!(*source, AppError::Fetch { status: 404, .. })),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_tool() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    let ctx = context(&server, &drive, Some("tok"));
    let err = invoke(&ctx, "drawUnicorn", json!({"prompt": "x"})).await.unwrap_err();
    assert!(matches!(err, AppError::UnknownTool(ref n) if n == "drawUnicorn"));
}

#[tokio::test]
async fn missing_upload_base_fails_before_any_job() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/src/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(40, 40)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST")).respond_with(jpeg_response()).expect(0).mount(&server).await;

    let ctx = context(&server, &drive, Some("tok"));
    let source = format!("{}/src/a.png", server.uri());
    let calls = [
        ("drawPainting", json!({"prompt": "x"})),
        ("drawSeedream4", json!({"prompt": "x"})),
        ("editImage", json!({"prompt": "x", "source": [source.clone()]})),
        ("editSeedream4", json!({"prompt": "x", "source": [source.clone()]})),
    ];
    for (name, params) in calls {
        let err = ToolRegistry::builtin()
            .invoke(name, &ToolCall::new(params, ""), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)), "{name}: {err:?}");
    }
    assert!(!drive.path().join("images").exists());
}

#[tokio::test]
async fn edit_image_non_gemini_drops_ratio_and_resolution() {
    let server = MockServer::start().await;
    let drive = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/src/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(40, 40)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/job"))
        .respond_with(jpeg_response())
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, &drive, Some("tok"));
    let source = format!("{}/src/a.png", server.uri());
    let params = json!({
        "prompt": "x", "source": [source], "model": "nano-banana", "aspect_ratio": "9:21", "resolution": "8K"
    });
    invoke(&ctx, "editImage", params).await.unwrap();

    let bodies = job_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("inference.nano-banana.img2img.v2"));
    assert!(!bodies[0].contains("aspect_ratio"), "{}", bodies[0]);
    assert!(!bodies[0].contains("resolution"), "{}", bodies[0]);
}
