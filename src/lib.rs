//! # WSI Clip
//!
//! Client-side core of a Whole Slide Image (WSI) clip viewer.
//!
//! A WSI clip server exposes slide files, their metadata, downsampled
//! thumbnails and exact level-0 regions over HTTP. This library drives the
//! viewer flow against that API: pick a slide, drag a selection on the
//! thumbnail, zoom into the selected level-0 region, and save it.
//!
//! ## Features
//!
//! - **Exact coordinate mapping**: canvas rectangles map to level-0 pixels and back
//! - **Selection controller**: drag, square-lock, minimum size, canvas clamping
//! - **Load orchestrator**: one load at a time, stale responses discarded
//! - **Renderer**: fits the active raster to its container and draws the overlay
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`slide`] - Slide metadata and level-0 rectangles
//! - [`view`] - Viewport, coordinate mapping, selection and rendering
//! - [`api`] - `SlideApi` trait and its reqwest client
//! - [`session`] - Load gate, status line and the load orchestrator
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsi_clip::{HttpSlideApi, LoadOrchestrator, ViewerOptions, DEFAULT_TIMEOUT};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = HttpSlideApi::new("http://localhost:8080/api", DEFAULT_TIMEOUT)?;
//!     let viewer = LoadOrchestrator::new(api, ViewerOptions::default());
//!
//!     viewer.select_file("a.svs").await?;
//!     viewer.pointer_down(100.0, 100.0);
//!     viewer.pointer_move(200.0, 150.0, false);
//!     viewer.pointer_up();
//!
//!     let view = viewer.apply_selection().await?;
//!     println!("zoomed to {:?}", view.rect());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod slide;
pub mod view;

// Re-export commonly used types
pub use api::{
    HttpSlideApi, RegionImage, SaveRequest, SaveResponse, ServerConfig, SlideApi, DEFAULT_TIMEOUT,
};
pub use config::{Cli, ClientConfig, ClipArgs, Command, Drag, InfoArgs};
pub use error::{ApiError, ViewerError};
pub use session::{
    Controls, FileLoad, LoadGate, LoadOrchestrator, LoadPhase, StatusKind, StatusMessage,
    ViewerOptions,
};
pub use slide::{LevelInfo, SlideMetadata, SlideRect};
pub use view::{
    to_canvas_space, to_slide_space, CanvasGeometry, CanvasRect, DisplayImage, DisplayMode,
    Frame, OverlayStyle, Renderer, SelectionController, SelectionRect, SelectionSnapshot,
    ViewState,
};
