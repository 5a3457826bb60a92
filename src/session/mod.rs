//! Session layer: the load state machine and its in-flight guard.
//!
//! # Components
//!
//! - [`LoadOrchestrator`]: owns the application context and runs the
//!   select / apply / reset / save transitions against a [`SlideApi`]
//! - [`LoadGate`] / [`LoadPermit`]: single-slot guard allowing at most one
//!   in-flight operation, released on drop
//! - [`StatusBoard`]: transient status line, cleared after [`STATUS_TTL`]
//!
//! [`SlideApi`]: crate::api::SlideApi

mod gate;
mod orchestrator;
mod status;

pub use gate::{Activity, LoadGate, LoadPermit};
pub use orchestrator::{
    Controls, FileLoad, LoadOrchestrator, LoadPhase, ViewerOptions, DEFAULT_CONTAINER_SIZE,
    DEFAULT_THUMBNAIL_SIZE,
};
pub use status::{StatusBoard, StatusKind, StatusMessage, STATUS_TTL};
