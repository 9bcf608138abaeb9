use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use prodia_tools::api::{router, AppState};
use prodia_tools::hosting::StaticDriveHost;
use prodia_tools::{ToolContext, ToolRegistry};

fn app(drive: &TempDir, token: Option<&str>) -> Router {
    let host = Arc::new(StaticDriveHost::new(drive.path(), None));
    let state = Arc::new(AppState {
        registry: ToolRegistry::builtin(),
        context: ToolContext::new(token.map(str::to_string), "http://127.0.0.1:9", host),
    });
    router(state, drive.path().to_str().unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let res = app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = res.status();
    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    (status, body.to_vec())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn root_and_tool_listing() {
    let drive = tempfile::tempdir().unwrap();
    let (status, body) = get(app(&drive, None), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Prodia Tools");

    let (status, body) = get(app(&drive, None), "/tools").await;
    assert_eq!(status, StatusCode::OK);
    let tools: Vec<Value> = serde_json::from_slice(&body).unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["drawPainting", "drawSeedream4", "editImage", "editSeedream4"]);
}

#[tokio::test]
async fn ratio_endpoint() {
    let drive = tempfile::tempdir().unwrap();
    let (_, body) = get(app(&drive, None), "/ratio?width=2100&height=900").await;
    assert_eq!(body, b"21:9");
    let (_, body) = get(app(&drive, None), "/ratio?width=900&height=2100").await;
    assert_eq!(body, b"9:21");
    let (_, body) = get(app(&drive, None), "/ratio?width=0&height=900").await;
    assert_eq!(body, b"1:1");
    let (_, body) = get(app(&drive, None), "/ratio").await;
    assert_eq!(body, b"1:1");
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let drive = tempfile::tempdir().unwrap();
    let (status, body) = post_json(app(&drive, Some("tok")), "/tools/nope", json!({"params": {}})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown tool: nope");
}

#[tokio::test]
async fn missing_token_is_server_error() {
    let drive = tempfile::tempdir().unwrap();
    let (status, body) =
        post_json(app(&drive, None), "/tools/drawPainting", json!({"params": {"prompt": "x"}})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "请先配置Prodia token");
}

#[tokio::test]
async fn bad_params_are_bad_request() {
    let drive = tempfile::tempdir().unwrap();
    let (status, body) =
        post_json(app(&drive, Some("tok")), "/tools/editImage", json!({"params": {"prompt": "x"}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("source"));
}

#[tokio::test]
async fn provider_unreachable_is_bad_gateway() {
    let drive = tempfile::tempdir().unwrap();
    let (status, body) = post_json(
        app(&drive, Some("tok")),
        "/tools/drawPainting",
        json!({"params": {"prompt": "x"}, "user": {"origin": "http://bot.local"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("绘图失败，请稍后重试: "));
}

#[tokio::test]
async fn serves_stored_images() {
    let drive = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(drive.path().join("images")).unwrap();
    std::fs::write(drive.path().join("images").join("cat.jpg"), b"meow").unwrap();
    let (status, body) = get(app(&drive, None), "/static/images/cat.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"meow");
}
