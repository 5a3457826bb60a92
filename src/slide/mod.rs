//! Slide-level data model.
//!
//! Types in this module live in level-0 (full resolution) pixel space and are
//! independent of how the slide is displayed:
//!
//! - [`SlideMetadata`]: extent, level count, pyramid levels and vendor properties
//! - [`LevelInfo`]: a single pyramid level
//! - [`SlideRect`]: an integer rectangle in level-0 coordinates

mod metadata;
mod rect;

pub use metadata::{LevelInfo, SlideMetadata};
pub use rect::SlideRect;
