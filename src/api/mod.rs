//! Client side of the slide server API.
//!
//! The server lists slide files, reports their metadata and renders
//! thumbnails, level-0 regions and saved clips. [`SlideApi`] has one method
//! per endpoint so the orchestrator can run against the real
//! [`HttpSlideApi`] or an in-memory double.
//!
//! # Endpoints
//!
//! Paths are relative to the configured base URL (`http://host:port/api`):
//!
//! - `GET  /files` - `{ files: [name...] }`
//! - `GET  /info/{file}` - `{ dimensions: [w, h], level_count, levels, properties }`
//! - `GET  /thumbnail/{file}?max_width&max_height` - image bytes
//! - `GET  /region?filename&x&y&width&height` - image bytes
//! - `POST /save` - image bytes (client download) or `{ path }`
//! - `GET  /config` - `{ client_save_enabled, max_pixels }`
//!
//! Every endpoint answers errors as `{ error }` with a non-2xx status.

mod http;

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::slide::{LevelInfo, SlideMetadata, SlideRect};

pub use http::{HttpSlideApi, DEFAULT_TIMEOUT};

// =============================================================================
// SlideApi Trait
// =============================================================================

/// The endpoints the viewer consumes.
#[async_trait]
pub trait SlideApi: Send + Sync {
    /// List slide files available on the server.
    async fn list_files(&self) -> Result<Vec<String>, ApiError>;

    /// Fetch metadata for a slide.
    async fn slide_info(&self, filename: &str) -> Result<SlideMetadata, ApiError>;

    /// Fetch a thumbnail fitted within `max_width × max_height`.
    async fn thumbnail(
        &self,
        filename: &str,
        max_width: u32,
        max_height: u32,
    ) -> Result<Bytes, ApiError>;

    /// Fetch the raster for an exact level-0 rectangle.
    async fn region(&self, filename: &str, rect: SlideRect) -> Result<RegionImage, ApiError>;

    /// Ask the server to save (or return) a level-0 rectangle.
    async fn save(&self, request: &SaveRequest) -> Result<SaveResponse, ApiError>;

    /// Fetch server-side settings.
    async fn server_config(&self) -> Result<ServerConfig, ApiError>;
}

// =============================================================================
// Wire Types
// =============================================================================

/// Body of `GET /files`.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

/// Body of `GET /info/{file}`.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoResponse {
    #[serde(default)]
    pub filename: Option<String>,
    pub dimensions: (u32, u32),
    pub level_count: u32,
    #[serde(default)]
    pub levels: Vec<LevelInfo>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl InfoResponse {
    /// Convert into metadata, falling back to `requested` for the name.
    pub fn into_metadata(self, requested: &str) -> SlideMetadata {
        SlideMetadata {
            filename: self.filename.unwrap_or_else(|| requested.to_string()),
            dimensions: self.dimensions,
            level_count: self.level_count,
            levels: self.levels,
            properties: self.properties,
        }
    }
}

/// Error body shared by all endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Raster returned by `GET /region`.
#[derive(Debug, Clone)]
pub struct RegionImage {
    /// Encoded image bytes
    pub data: Bytes,

    /// Pyramid level the server read from (`X-Level-Used`)
    pub level_used: Option<u32>,

    /// Output raster size (`X-Output-Width`, `X-Output-Height`)
    pub output_size: Option<(u32, u32)>,
}

impl RegionImage {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            level_used: None,
            output_size: None,
        }
    }
}

/// Body of `POST /save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveRequest {
    pub filename: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub save_filename: String,
    pub client_download: bool,
}

impl SaveRequest {
    pub fn new(
        filename: impl Into<String>,
        rect: SlideRect,
        save_filename: impl Into<String>,
        client_download: bool,
    ) -> Self {
        Self {
            filename: filename.into(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            save_filename: save_filename.into(),
            client_download,
        }
    }

    pub fn rect(&self) -> SlideRect {
        SlideRect::new(self.x, self.y, self.width, self.height)
    }
}

/// Outcome of `POST /save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveResponse {
    /// The server wrote the clip to its save directory
    Stored { path: String, message: Option<String> },

    /// The server returned the clip for a local download
    Download { filename: String, data: Bytes },
}

/// JSON body of a server-side save.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredBody {
    pub path: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    pub client_save_enabled: bool,
    pub max_pixels: u32,
}

/// Filename for a client download when the server does not name one.
pub fn download_filename(requested: &str) -> String {
    if requested.to_lowercase().ends_with(".png") {
        requested.to_string()
    } else {
        format!("{}.png", requested)
    }
}
