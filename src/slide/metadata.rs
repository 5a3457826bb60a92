//! Slide metadata as reported by the server.
//!
//! Metadata is immutable once fetched for a file and is replaced wholesale
//! when another file is selected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SlideRect;

// =============================================================================
// Level Information
// =============================================================================

/// Information about a single pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Level index (0 = highest resolution)
    pub level: u32,

    /// Width and height of this level in pixels
    pub dimensions: (u32, u32),

    /// Downsample factor relative to level 0
    ///
    /// Level 0 has downsample 1.0, level 1 might have 4.0, etc.
    pub downsample: f64,
}

// =============================================================================
// Slide Metadata
// =============================================================================

/// Metadata describing a slide's level-0 extent and pyramid.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideMetadata {
    /// File name on the server
    pub filename: String,

    /// Level-0 (full resolution) width and height
    pub dimensions: (u32, u32),

    /// Number of pyramid levels
    pub level_count: u32,

    /// Per-level details, empty when the server did not report them
    pub levels: Vec<LevelInfo>,

    /// Vendor properties, empty when the server did not report them
    pub properties: BTreeMap<String, String>,
}

impl SlideMetadata {
    /// Create metadata with only the level-0 extent and level count.
    pub fn new(filename: impl Into<String>, width: u32, height: u32, level_count: u32) -> Self {
        Self {
            filename: filename.into(),
            dimensions: (width, height),
            level_count,
            levels: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Level-0 width.
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Level-0 height.
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// The full slide extent as a level-0 rectangle.
    pub fn extent(&self) -> SlideRect {
        SlideRect::new(0, 0, self.dimensions.0, self.dimensions.1)
    }

    /// Whether the slide has a usable (non-zero) extent.
    pub fn is_valid(&self) -> bool {
        self.dimensions.0 > 0 && self.dimensions.1 > 0
    }

    /// Look up a vendor property, e.g. `openslide.mpp-x`.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
