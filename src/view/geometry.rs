//! Canvas geometry and the canvas ↔ level-0 coordinate mapping.
//!
//! The displayed raster is fitted into the container preserving aspect
//! ratio and never upscaled. Pointer coordinates are canvas-local pixels;
//! the mapping below turns a canvas rectangle back into level-0 pixels given
//! the viewport currently on display.
//!
//! ```text
//!   canvas (display_width × display_height)       level-0 viewport
//!   ┌───────────────────────┐                   ┌──────────────────────────┐
//!   │   ┌──────┐            │  × view / display │  ┌──────────┐            │
//!   │   │ sel  │            │ ────────────────▶ │  │  target  │            │
//!   │   └──────┘            │                   │  └──────────┘            │
//!   └───────────────────────┘                   └──────────────────────────┘
//! ```

use crate::slide::SlideRect;

use super::ViewState;

// =============================================================================
// Canvas Geometry
// =============================================================================

/// Size of the canvas a raster is drawn into.
///
/// Derived on every draw from the container bounds and the raster's native
/// size; never stored across resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    /// Drawn width in canvas pixels
    pub display_width: u32,

    /// Drawn height in canvas pixels
    pub display_height: u32,

    /// Raster-to-canvas factor, `min(max_w / w, max_h / h, 1)`
    pub scale: f64,
}

impl CanvasGeometry {
    /// Fit a `image_width × image_height` raster into `max_width × max_height`.
    ///
    /// Downscales only. Display dimensions are floored to whole pixels and
    /// never drop below one.
    pub fn fit(image_width: u32, image_height: u32, max_width: u32, max_height: u32) -> Self {
        let width = image_width.max(1) as u64;
        let height = image_height.max(1) as u64;
        let (max_w, max_h) = (max_width as u64, max_height as u64);

        let scale = (max_width as f64 / width as f64)
            .min(max_height as f64 / height as f64)
            .min(1.0);

        // Integer products keep the limiting side exact; `w * scale` in f64
        // can land a hair below the true value and floor one pixel short.
        let (display_width, display_height) = if width <= max_w && height <= max_h {
            (width, height)
        } else if max_w * height <= max_h * width {
            (max_w, height * max_w / width)
        } else {
            (width * max_h / height, max_h)
        };
        let display_width = (display_width as u32).max(1);
        let display_height = (display_height as u32).max(1);

        Self {
            display_width,
            display_height,
            scale,
        }
    }

    /// Canvas pixels per level-0 pixel for the given viewport.
    ///
    /// For a 10000×8000 slide shown as an 800×640 thumbnail this is 0.08.
    pub fn level0_scale(&self, view: &ViewState) -> f64 {
        if view.width == 0 {
            return 0.0;
        }
        self.display_width as f64 / view.width as f64
    }

    /// Whether a canvas point lies on the canvas (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x <= self.display_width as f64 && y <= self.display_height as f64
    }
}

// =============================================================================
// Canvas Rectangles
// =============================================================================

/// A rectangle in canvas pixel space with non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanned by two corners dragged in any direction.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// The whole canvas of `geometry`.
    pub fn full(geometry: &CanvasGeometry) -> Self {
        Self::new(
            0.0,
            0.0,
            geometry.display_width as f64,
            geometry.display_height as f64,
        )
    }
}

// =============================================================================
// Mapping
// =============================================================================

/// Map a canvas rectangle to level-0 slide coordinates.
///
/// ```text
/// slide_x = floor(view.x + canvas.x * view.width  / display_width)
/// slide_y = floor(view.y + canvas.y * view.height / display_height)
/// slide_w = floor(canvas.width  * view.width  / display_width)
/// slide_h = floor(canvas.height * view.height / display_height)
/// ```
///
/// Products are formed before the division so that mapping the full canvas
/// yields the viewport exactly.
pub fn to_slide_space(canvas: CanvasRect, view: &ViewState, geometry: &CanvasGeometry) -> SlideRect {
    let display_width = geometry.display_width.max(1) as f64;
    let display_height = geometry.display_height.max(1) as f64;
    let view_width = view.width as f64;
    let view_height = view.height as f64;

    let x = (view.x as f64 + canvas.x * view_width / display_width).floor();
    let y = (view.y as f64 + canvas.y * view_height / display_height).floor();
    let width = (canvas.width * view_width / display_width).floor();
    let height = (canvas.height * view_height / display_height).floor();

    SlideRect::new(
        to_pixel(x),
        to_pixel(y),
        to_pixel(width),
        to_pixel(height),
    )
}

/// Map a level-0 rectangle onto the canvas showing `view`.
///
/// This is the draw transform; parts outside the viewport map outside the
/// canvas.
pub fn to_canvas_space(rect: SlideRect, view: &ViewState, geometry: &CanvasGeometry) -> CanvasRect {
    if view.width == 0 || view.height == 0 {
        return CanvasRect::default();
    }
    let display_width = geometry.display_width as f64;
    let display_height = geometry.display_height as f64;
    let view_width = view.width as f64;
    let view_height = view.height as f64;

    CanvasRect::new(
        (rect.x as f64 - view.x as f64) * display_width / view_width,
        (rect.y as f64 - view.y as f64) * display_height / view_height,
        rect.width as f64 * display_width / view_width,
        rect.height as f64 * display_height / view_height,
    )
}

fn to_pixel(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value as u32
    }
}
