//! HTTP client integration tests against a local mock server.
//!
//! Tests verify:
//! - Request paths, query strings and bodies for every endpoint
//! - Decoding of JSON, image and download responses
//! - Error mapping (JSON error bodies, plain-text failures)
//! - The full select → zoom → save flow over HTTP

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use wsi_clip::api::{HttpSlideApi, SaveRequest, SaveResponse, SlideApi, DEFAULT_TIMEOUT};
use wsi_clip::error::ApiError;
use wsi_clip::session::{LoadOrchestrator, ViewerOptions};
use wsi_clip::slide::SlideRect;

use super::test_utils::{drag, fitted_size, is_valid_png, png_bytes, spawn_server};

// =============================================================================
// Mock Server
// =============================================================================

const SLIDE_SIZE: (u32, u32) = (10000, 8000);
const MAX_PIXELS: u64 = 10_000_000;

#[derive(Clone, Default)]
struct ServerState {
    region_queries: Arc<Mutex<Vec<RegionQuery>>>,
    save_bodies: Arc<Mutex<Vec<Value>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ThumbnailQuery {
    max_width: u32,
    max_height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct RegionQuery {
    filename: String,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn png_response(data: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], data).into_response()
}

fn is_known(file: &str) -> bool {
    file == "a.svs" || file == "case 1.svs"
}

async fn files_handler() -> Json<Value> {
    Json(json!({ "files": ["a.svs", "case 1.svs"] }))
}

async fn info_handler(Path(file): Path<String>) -> Response {
    if !is_known(&file) {
        return error_response(StatusCode::NOT_FOUND, "File not found");
    }
    Json(json!({
        "filename": file,
        "dimensions": [SLIDE_SIZE.0, SLIDE_SIZE.1],
        "level_count": 2,
        "levels": [
            { "level": 0, "dimensions": [10000, 8000], "downsample": 1.0 },
            { "level": 1, "dimensions": [2500, 2000], "downsample": 4.0 }
        ],
        "properties": { "openslide.mpp-x": "0.25" }
    }))
    .into_response()
}

async fn thumbnail_handler(
    Path(file): Path<String>,
    Query(query): Query<ThumbnailQuery>,
) -> Response {
    if !is_known(&file) {
        return error_response(StatusCode::NOT_FOUND, "File not found");
    }
    let (w, h) = fitted_size(SLIDE_SIZE.0, SLIDE_SIZE.1, query.max_width, query.max_height);
    png_response(png_bytes(w, h))
}

async fn region_handler(
    State(state): State<ServerState>,
    Query(query): Query<RegionQuery>,
) -> Response {
    state.region_queries.lock().unwrap().push(query.clone());

    if query.width as u64 * query.height as u64 > MAX_PIXELS {
        return error_response(StatusCode::BAD_REQUEST, "Region too large");
    }
    let (w, h) = fitted_size(query.width, query.height, 512, 512);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, "image/png".parse().unwrap());
    headers.insert("x-level-used", "1".parse().unwrap());
    headers.insert("x-output-width", w.to_string().parse().unwrap());
    headers.insert("x-output-height", h.to_string().parse().unwrap());
    (headers, png_bytes(w, h)).into_response()
}

async fn save_handler(State(state): State<ServerState>, Json(body): Json<Value>) -> Response {
    state.save_bodies.lock().unwrap().push(body.clone());

    let name = body["save_filename"].as_str().unwrap_or_default().to_string();
    if name == "full" {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "disk full");
    }

    if body["client_download"].as_bool() == Some(true) {
        let disposition = format!("attachment; filename=\"{}.png\"", name);
        (
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            png_bytes(16, 16),
        )
            .into_response()
    } else {
        Json(json!({
            "success": true,
            "message": format!("Saved {}.png", name),
            "path": format!("/data/saves/{}.png", name),
        }))
        .into_response()
    }
}

async fn config_handler() -> Json<Value> {
    Json(json!({ "client_save_enabled": false, "max_pixels": MAX_PIXELS }))
}

async fn broken_handler() -> Response {
    (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
}

async fn start() -> (HttpSlideApi, ServerState) {
    let state = ServerState::default();
    let api = Router::new()
        .route("/files", get(files_handler))
        .route("/info/{file}", get(info_handler))
        .route("/thumbnail/{file}", get(thumbnail_handler))
        .route("/region", get(region_handler))
        .route("/save", post(save_handler))
        .route("/config", get(config_handler))
        .with_state(state.clone());
    let router = Router::new()
        .nest("/api", api)
        .route("/broken/files", get(broken_handler));

    let base = spawn_server(router).await;
    let client = HttpSlideApi::new(&format!("{}/api", base), DEFAULT_TIMEOUT).unwrap();
    (client, state)
}

// =============================================================================
// Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_list_files() {
    let (api, _) = start().await;
    let files = api.list_files().await.unwrap();
    assert_eq!(files, vec!["a.svs".to_string(), "case 1.svs".to_string()]);
}

#[tokio::test]
async fn test_slide_info() {
    let (api, _) = start().await;
    let metadata = api.slide_info("a.svs").await.unwrap();

    assert_eq!(metadata.filename, "a.svs");
    assert_eq!(metadata.dimensions, (10000, 8000));
    assert_eq!(metadata.level_count, 2);
    assert_eq!(metadata.levels[1].downsample, 4.0);
    assert_eq!(metadata.property("openslide.mpp-x"), Some("0.25"));
}

#[tokio::test]
async fn test_slide_info_encodes_filename() {
    let (api, _) = start().await;
    let metadata = api.slide_info("case 1.svs").await.unwrap();
    assert_eq!(metadata.filename, "case 1.svs");
}

#[tokio::test]
async fn test_slide_info_not_found() {
    let (api, _) = start().await;
    let err = api.slide_info("missing.svs").await.unwrap_err();

    match err {
        ApiError::Server { status, ref message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "File not found");
        }
        ref other => panic!("Expected Server error, got {:?}", other),
    }
    assert_eq!(err.user_message(), "File not found");
}

#[tokio::test]
async fn test_thumbnail_respects_bounds() {
    let (api, _) = start().await;
    let bytes = api.thumbnail("a.svs", 400, 400).await.unwrap();

    assert!(is_valid_png(&bytes));
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!((image.width(), image.height()), (400, 320));
}

#[tokio::test]
async fn test_thumbnail_error_body() {
    let (api, _) = start().await;
    let err = api.thumbnail("missing.svs", 800, 800).await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 404, .. }));
}

#[tokio::test]
async fn test_region_query_and_headers() {
    let (api, state) = start().await;
    let region = api
        .region("a.svs", SlideRect::new(1250, 1250, 1250, 625))
        .await
        .unwrap();

    assert!(is_valid_png(&region.data));
    assert_eq!(region.level_used, Some(1));
    assert_eq!(region.output_size, Some(fitted_size(1250, 625, 512, 512)));

    let queries = state.region_queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![RegionQuery {
            filename: "a.svs".to_string(),
            x: 1250,
            y: 1250,
            width: 1250,
            height: 625,
        }]
    );
}

#[tokio::test]
async fn test_region_too_large() {
    let (api, _) = start().await;
    let err = api
        .region("a.svs", SlideRect::new(0, 0, 10000, 8000))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Region too large");
}

#[tokio::test]
async fn test_save_stored() {
    let (api, state) = start().await;
    let request = SaveRequest::new("a.svs", SlideRect::new(10, 20, 30, 40), "clip", false);

    let response = api.save(&request).await.unwrap();

    assert_eq!(
        response,
        SaveResponse::Stored {
            path: "/data/saves/clip.png".to_string(),
            message: Some("Saved clip.png".to_string()),
        }
    );
    let bodies = state.save_bodies.lock().unwrap().clone();
    assert_eq!(
        bodies[0],
        json!({
            "filename": "a.svs",
            "x": 10,
            "y": 20,
            "width": 30,
            "height": 40,
            "save_filename": "clip",
            "client_download": false
        })
    );
}

#[tokio::test]
async fn test_save_download() {
    let (api, _) = start().await;
    let request = SaveRequest::new("a.svs", SlideRect::new(0, 0, 100, 100), "clip", true);

    match api.save(&request).await.unwrap() {
        SaveResponse::Download { filename, data } => {
            assert_eq!(filename, "clip.png");
            assert!(is_valid_png(&data));
        }
        other => panic!("Expected Download, got {:?}", other),
    }
}

#[tokio::test]
async fn test_save_server_error() {
    let (api, _) = start().await;
    let request = SaveRequest::new("a.svs", SlideRect::new(0, 0, 100, 100), "full", false);

    let err = api.save(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 500, .. }));
    assert_eq!(err.user_message(), "disk full");
}

#[tokio::test]
async fn test_server_config() {
    let (api, _) = start().await;
    let config = api.server_config().await.unwrap();
    assert!(!config.client_save_enabled);
    assert_eq!(config.max_pixels as u64, MAX_PIXELS);
}

#[tokio::test]
async fn test_plain_text_failure() {
    let (api, _) = start().await;
    let base = api.base_url().as_str().trim_end_matches("/api").to_string();
    let broken = HttpSlideApi::new(&format!("{}/broken", base), DEFAULT_TIMEOUT).unwrap();

    let err = broken.list_files().await.unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind and drop a listener to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpSlideApi::new(&format!("http://{}/api", addr), DEFAULT_TIMEOUT).unwrap();
    let err = api.list_files().await.unwrap_err();
    assert!(matches!(err, ApiError::Request(_)));
}

// =============================================================================
// End-to-End Flow
// =============================================================================

#[tokio::test]
async fn test_select_zoom_save_over_http() {
    let (api, state) = start().await;
    let viewer = LoadOrchestrator::new(api, ViewerOptions::default());

    assert_eq!(viewer.list_files().await.unwrap().len(), 2);
    viewer.select_file("a.svs").await.unwrap();

    drag(&viewer, (100.0, 100.0), (200.0, 150.0));
    let view = viewer.apply_selection().await.unwrap();
    assert_eq!(view.rect(), SlideRect::new(1250, 1250, 1250, 625));

    let response = viewer.save("tumor", false).await.unwrap();
    assert!(matches!(response, SaveResponse::Stored { .. }));

    let bodies = state.save_bodies.lock().unwrap().clone();
    assert_eq!(bodies[0]["x"], 1250);
    assert_eq!(bodies[0]["height"], 625);
    assert_eq!(bodies[0]["save_filename"], "tumor");
}
