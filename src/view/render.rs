//! Rendering of the active raster and the selection overlay.
//!
//! The renderer holds no view state. Each call recomputes the canvas
//! geometry from the container bounds, so a resized container is picked up
//! on the next draw without touching the session.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageResult, Pixel, Rgba, RgbaImage};

use super::geometry::CanvasGeometry;
use super::selection::SelectionRect;
use super::DisplayMode;

// =============================================================================
// Display Image
// =============================================================================

/// A decoded raster ready for display (thumbnail or region).
#[derive(Debug, Clone)]
pub struct DisplayImage {
    pixels: RgbaImage,
}

impl DisplayImage {
    /// Decode PNG or JPEG bytes as returned by the server.
    pub fn decode(bytes: &[u8]) -> ImageResult<Self> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self {
            pixels: image.to_rgba8(),
        })
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Native width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Native height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Geometry of this raster fitted into a container.
    pub fn fit(&self, container_width: u32, container_height: u32) -> CanvasGeometry {
        CanvasGeometry::fit(self.width(), self.height(), container_width, container_height)
    }
}

// =============================================================================
// Overlay Style
// =============================================================================

/// Stroke and fill used for the selection rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub stroke: Rgba<u8>,
    pub fill: Rgba<u8>,
    pub stroke_width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke: Rgba([0, 123, 255, 255]),
            fill: Rgba([0, 123, 255, 51]),
            stroke_width: 2,
        }
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// One drawn canvas.
#[derive(Debug, Clone)]
pub struct Frame {
    pub geometry: CanvasGeometry,
    pub mode: DisplayMode,
    pub canvas: RgbaImage,
}

impl Frame {
    /// Encode the canvas as PNG.
    pub fn encode_png(&self) -> ImageResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.canvas.clone()).write_to(&mut cursor, ImageFormat::Png)?;
        Ok(cursor.into_inner())
    }
}

/// Draws a raster scaled into its container with the selection on top.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    style: OverlayStyle,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Draw `image` fitted into `container` and overlay `selection` when it
    /// is active.
    pub fn render(
        &self,
        image: &DisplayImage,
        mode: DisplayMode,
        selection: &SelectionRect,
        container: (u32, u32),
    ) -> Frame {
        let geometry = image.fit(container.0, container.1);

        let mut canvas = if geometry.display_width == image.width()
            && geometry.display_height == image.height()
        {
            image.pixels().clone()
        } else {
            imageops::resize(
                image.pixels(),
                geometry.display_width,
                geometry.display_height,
                FilterType::Triangle,
            )
        };

        if selection.active {
            self.draw_selection(&mut canvas, selection);
        }

        Frame {
            geometry,
            mode,
            canvas,
        }
    }

    fn draw_selection(&self, canvas: &mut RgbaImage, selection: &SelectionRect) {
        let rect = selection.normalized();
        let (width, height) = canvas.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let x0 = clamp_edge(rect.x.floor(), width);
        let y0 = clamp_edge(rect.y.floor(), height);
        let x1 = clamp_edge((rect.x + rect.width).ceil(), width);
        let y1 = clamp_edge((rect.y + rect.height).ceil(), height);
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        let stroke = self.style.stroke_width;
        for y in y0..y1 {
            for x in x0..x1 {
                let on_border = x < x0 + stroke
                    || x + stroke >= x1
                    || y < y0 + stroke
                    || y + stroke >= y1;
                let color = if on_border {
                    self.style.stroke
                } else {
                    self.style.fill
                };
                canvas.get_pixel_mut(x, y).blend(&color);
            }
        }
    }
}

fn clamp_edge(value: f64, limit: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        (value as u64).min(limit as u64) as u32
    }
}
