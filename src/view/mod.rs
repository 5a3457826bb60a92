//! Display-side model: viewport, canvas geometry, selection and rendering.
//!
//! # Architecture
//!
//! ```text
//!  pointer events ──▶ SelectionController ──▶ SelectionRect ──┐
//!                                                            ▼
//!  ViewState + DisplayImage ─────────────────────────────▶ Renderer ──▶ Frame
//!        ▲                                                   │
//!        └──── to_slide_space(selection, view, geometry) ◀───┘
//! ```
//!
//! - [`ViewState`]: the level-0 viewport and [`DisplayMode`]
//! - [`CanvasGeometry`]: raster fitted into the container, recomputed per draw
//! - [`to_slide_space`] / [`to_canvas_space`]: pure coordinate mapping
//! - [`SelectionController`]: drag handling, square lock, size threshold
//! - [`Renderer`]: scaled raster plus selection overlay

pub mod geometry;
pub mod render;
pub mod selection;
mod viewport;

pub use geometry::{to_canvas_space, to_slide_space, CanvasGeometry, CanvasRect};
pub use render::{DisplayImage, Frame, OverlayStyle, Renderer};
pub use selection::{SelectionController, SelectionRect, SelectionSnapshot, MIN_SELECTION_SIZE};
pub use viewport::{DisplayMode, ViewState};
