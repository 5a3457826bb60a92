//! Pointer-driven rectangle selection.
//!
//! The controller consumes canvas-local pointer positions and maintains the
//! selection rectangle plus its drag/actionable flags. Every operation
//! returns an immutable [`SelectionSnapshot`] of the result.

use std::sync::Arc;

use crate::session::LoadGate;

use super::geometry::{CanvasGeometry, CanvasRect};

/// Minimum width and height, in canvas pixels, for a selection to be
/// actionable. Both sides must be strictly larger.
pub const MIN_SELECTION_SIZE: f64 = 5.0;

// =============================================================================
// Selection Rectangle
// =============================================================================

/// Selection rectangle as dragged, in canvas pixel space.
///
/// `start` is the anchor; `end` follows the pointer and may lie on any side
/// of it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRect {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub active: bool,
}

impl SelectionRect {
    pub fn width(&self) -> f64 {
        (self.end_x - self.start_x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.end_y - self.start_y).abs()
    }

    /// Top-left corner with absolute width and height.
    pub fn normalized(&self) -> CanvasRect {
        CanvasRect::from_corners(self.start_x, self.start_y, self.end_x, self.end_y)
    }
}

/// State of the selection after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionSnapshot {
    pub rect: SelectionRect,

    /// A drag is in progress
    pub is_selecting: bool,

    /// The finished selection is large enough to apply
    pub has_selection: bool,
}

// =============================================================================
// Selection Controller
// =============================================================================

/// Turns pointer gestures into a selection rectangle.
#[derive(Debug)]
pub struct SelectionController {
    rect: SelectionRect,
    is_selecting: bool,
    has_selection: bool,
    canvas_width: f64,
    canvas_height: f64,
    gate: Arc<LoadGate>,
}

impl SelectionController {
    /// Create a controller with an empty canvas.
    ///
    /// No gesture is accepted until [`set_canvas`](Self::set_canvas) is
    /// called with the drawn geometry.
    pub fn new(gate: Arc<LoadGate>) -> Self {
        Self {
            rect: SelectionRect::default(),
            is_selecting: false,
            has_selection: false,
            canvas_width: 0.0,
            canvas_height: 0.0,
            gate,
        }
    }

    /// Update the canvas bounds pointer positions are clamped to.
    ///
    /// A selection already on screen is clamped into the new bounds; a
    /// finished one is re-checked against [`MIN_SELECTION_SIZE`].
    pub fn set_canvas(&mut self, geometry: &CanvasGeometry) {
        self.canvas_width = geometry.display_width as f64;
        self.canvas_height = geometry.display_height as f64;

        if !self.rect.active {
            return;
        }
        let (start_x, start_y) = self.clamp(self.rect.start_x, self.rect.start_y);
        let (end_x, end_y) = self.clamp(self.rect.end_x, self.rect.end_y);
        self.rect = SelectionRect {
            start_x,
            start_y,
            end_x,
            end_y,
            active: true,
        };
        if !self.is_selecting {
            self.has_selection = self.is_actionable();
        }
    }

    /// Forget the canvas; gestures are rejected until it is set again.
    pub fn unset_canvas(&mut self) {
        self.canvas_width = 0.0;
        self.canvas_height = 0.0;
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            rect: self.rect,
            is_selecting: self.is_selecting,
            has_selection: self.has_selection,
        }
    }

    /// Start a drag at `(x, y)`.
    ///
    /// Ignored while a load is in flight, while a drag is already running,
    /// when no canvas is set, or when the point lies outside the canvas.
    /// A previous selection is discarded.
    pub fn begin(&mut self, x: f64, y: f64) -> SelectionSnapshot {
        if self.gate.is_loading() || self.is_selecting || !self.has_canvas() {
            return self.snapshot();
        }
        if !self.in_bounds(x, y) {
            return self.snapshot();
        }

        let (x, y) = self.clamp(x, y);
        self.rect = SelectionRect {
            start_x: x,
            start_y: y,
            end_x: x,
            end_y: y,
            active: true,
        };
        self.is_selecting = true;
        self.has_selection = false;
        self.snapshot()
    }

    /// Move the free corner to `(x, y)`.
    ///
    /// With `square_lock` the larger delta is applied to both axes, keeping
    /// each axis' drag direction. The result is clamped again afterwards, so
    /// a square drag running into a canvas edge may come out non-square.
    pub fn update(&mut self, x: f64, y: f64, square_lock: bool) -> SelectionSnapshot {
        if !self.is_selecting {
            return self.snapshot();
        }

        let (mut x, mut y) = self.clamp(x, y);
        if square_lock {
            let dx = x - self.rect.start_x;
            let dy = y - self.rect.start_y;
            let side = dx.abs().max(dy.abs());
            (x, y) = self.clamp(
                self.rect.start_x + side * dx.signum(),
                self.rect.start_y + side * dy.signum(),
            );
        }

        self.rect.end_x = x;
        self.rect.end_y = y;
        self.snapshot()
    }

    /// Finish the drag and decide whether the selection is actionable.
    ///
    /// Selections at or below [`MIN_SELECTION_SIZE`] on either axis stay on
    /// screen but cannot be applied.
    pub fn end(&mut self) -> SelectionSnapshot {
        if !self.is_selecting {
            return self.snapshot();
        }

        self.is_selecting = false;
        self.has_selection = self.is_actionable();
        self.snapshot()
    }

    /// Drop the selection.
    pub fn clear(&mut self) -> SelectionSnapshot {
        self.rect.active = false;
        self.is_selecting = false;
        self.has_selection = false;
        self.snapshot()
    }

    fn is_actionable(&self) -> bool {
        self.rect.width() > MIN_SELECTION_SIZE && self.rect.height() > MIN_SELECTION_SIZE
    }

    fn has_canvas(&self) -> bool {
        self.canvas_width > 0.0 && self.canvas_height > 0.0
    }

    fn in_bounds(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x <= self.canvas_width && y <= self.canvas_height
    }

    fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        // NaN falls back to the origin rather than poisoning the rectangle
        let x = if x.is_nan() { 0.0 } else { x };
        let y = if y.is_nan() { 0.0 } else { y };
        (
            x.clamp(0.0, self.canvas_width),
            y.clamp(0.0, self.canvas_height),
        )
    }
}
