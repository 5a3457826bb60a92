//! The level-0 viewport currently on display.

use crate::slide::{SlideMetadata, SlideRect};

/// Which raster the canvas is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// The whole slide, from the cached thumbnail
    Thumbnail,
    /// A zoomed-in level-0 region
    Region,
}

/// The level-0 rectangle on display and the display mode.
///
/// The rectangle always lies inside the slide extent. In thumbnail mode it
/// is the full extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub mode: DisplayMode,
}

impl ViewState {
    /// Full-extent thumbnail view for a slide.
    pub fn full(metadata: &SlideMetadata) -> Self {
        Self {
            x: 0,
            y: 0,
            width: metadata.width(),
            height: metadata.height(),
            mode: DisplayMode::Thumbnail,
        }
    }

    /// Region view over `rect`.
    pub fn region(rect: SlideRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            mode: DisplayMode::Region,
        }
    }

    /// The viewport as a level-0 rectangle.
    pub fn rect(&self) -> SlideRect {
        SlideRect::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_thumbnail(&self) -> bool {
        self.mode == DisplayMode::Thumbnail
    }
}
