//! Configuration management for WSI Clip.
//!
//! This module provides the command-line surface of the `wsi-clip` binary:
//! - Global client settings via clap, with `WSI_CLIP_` environment fallbacks
//! - One subcommand per user flow (`files`, `info`, `clip`)
//! - Validation with readable error messages
//!
//! # Environment Variables
//!
//! - `WSI_CLIP_SERVER_URL` - API base URL (default: http://localhost:8080/api)
//! - `WSI_CLIP_TIMEOUT` - Request timeout in seconds (default: 30)
//! - `WSI_CLIP_THUMBNAIL_WIDTH` / `WSI_CLIP_THUMBNAIL_HEIGHT` - Thumbnail bounds (default: 800)
//! - `WSI_CLIP_CANVAS_WIDTH` / `WSI_CLIP_CANVAS_HEIGHT` - Container bounds (default: 800)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::session::{ViewerOptions, DEFAULT_CONTAINER_SIZE, DEFAULT_THUMBNAIL_SIZE};

// =============================================================================
// Default Values
// =============================================================================

/// Default API base URL.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/api";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// CLI Arguments
// =============================================================================

/// WSI Clip - clip level-0 regions out of Whole Slide Images.
///
/// Talks to a WSI clip server: lists slides, shows metadata, and runs the
/// select → zoom → save flow headlessly.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-clip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub client: ClientConfig,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and display settings shared by all subcommands.
#[derive(Args, Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the slide server API.
    #[arg(long, global = true, default_value = DEFAULT_SERVER_URL, env = "WSI_CLIP_SERVER_URL")]
    pub server_url: String,

    /// Request timeout in seconds.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS, env = "WSI_CLIP_TIMEOUT")]
    pub timeout: u64,

    /// Maximum thumbnail width requested from the server.
    #[arg(long, global = true, default_value_t = DEFAULT_THUMBNAIL_SIZE.0, env = "WSI_CLIP_THUMBNAIL_WIDTH")]
    pub thumbnail_width: u32,

    /// Maximum thumbnail height requested from the server.
    #[arg(long, global = true, default_value_t = DEFAULT_THUMBNAIL_SIZE.1, env = "WSI_CLIP_THUMBNAIL_HEIGHT")]
    pub thumbnail_height: u32,

    /// Width of the container the canvas is fitted into.
    #[arg(long, global = true, default_value_t = DEFAULT_CONTAINER_SIZE.0, env = "WSI_CLIP_CANVAS_WIDTH")]
    pub canvas_width: u32,

    /// Height of the container the canvas is fitted into.
    #[arg(long, global = true, default_value_t = DEFAULT_CONTAINER_SIZE.1, env = "WSI_CLIP_CANVAS_HEIGHT")]
    pub canvas_height: u32,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl ClientConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(format!(
                "server_url must start with http:// or https://, got '{}'",
                self.server_url
            ));
        }

        if self.timeout == 0 {
            return Err("timeout must be greater than 0".to_string());
        }

        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            return Err("thumbnail size must be greater than 0".to_string());
        }

        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err("canvas size must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Viewer options derived from the thumbnail and canvas settings.
    pub fn viewer_options(&self) -> ViewerOptions {
        ViewerOptions {
            thumbnail_max: (self.thumbnail_width, self.thumbnail_height),
            container: (self.canvas_width, self.canvas_height),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List slide files on the server.
    Files,

    /// Show metadata for a slide.
    Info(InfoArgs),

    /// Select a region on the thumbnail, zoom into it, and optionally save it.
    Clip(ClipArgs),
}

/// Arguments for `info`.
#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// Slide file name as listed by `files`.
    pub file: String,

    /// Also print vendor properties.
    #[arg(long, default_value_t = false)]
    pub properties: bool,
}

/// Arguments for `clip`.
#[derive(Args, Debug, Clone)]
pub struct ClipArgs {
    /// Slide file name as listed by `files`.
    pub file: String,

    /// Drag on the thumbnail canvas from (x0, y0) to (x1, y1), in canvas pixels.
    #[arg(long, value_name = "X0,Y0,X1,Y1")]
    pub select: Option<Drag>,

    /// Lock the selection to a square while dragging.
    #[arg(long, default_value_t = false)]
    pub square: bool,

    /// Write the final canvas (with overlay) to this PNG file.
    #[arg(long, value_name = "PATH")]
    pub render: Option<PathBuf>,

    /// Save the current view under this name.
    #[arg(long, value_name = "NAME")]
    pub save: Option<String>,

    /// Ask the server to return the clip instead of storing it.
    #[arg(long, default_value_t = false, requires = "save")]
    pub client_download: bool,

    /// Where to write a client download (defaults to the server-supplied name).
    #[arg(long, value_name = "PATH", requires = "client_download")]
    pub output: Option<PathBuf>,
}

impl ClipArgs {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.file.trim().is_empty() {
            return Err("file name must not be empty".to_string());
        }
        if let Some(ref name) = self.save {
            if name.trim().is_empty() {
                return Err("save name must not be empty".to_string());
            }
        }
        if self.square && self.select.is_none() {
            return Err("--square requires --select".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Drag Gesture
// =============================================================================

/// A pointer drag from one canvas point to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl FromStr for Drag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("invalid coordinate '{}'", part.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [x0, y0, x1, y1] if values.iter().all(|v| v.is_finite()) => Ok(Drag {
                from: (*x0, *y0),
                to: (*x1, *y1),
            }),
            [_, _, _, _] => Err("coordinates must be finite".to_string()),
            _ => Err(format!(
                "expected four comma-separated values X0,Y0,X1,Y1, got {}",
                values.len()
            )),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
