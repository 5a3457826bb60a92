//! Load orchestrator: the viewer's state machine.
//!
//! The orchestrator owns the application context (current file, metadata,
//! viewport, cached rasters, selection, status line) and coordinates the
//! user-triggered fetches against it.
//!
//! # States
//!
//! ```text
//!            select_file                  metadata ok
//!   Idle ─────────────────▶ MetadataLoading ───────────▶ ThumbnailLoading
//!     ▲                          │ fail                        │ ok
//!     │ close                    ▼                             ▼
//!     └──────────────── (previous state kept) ◀── fail ── Ready(Thumbnail)
//!                                                          │        ▲
//!                                         apply_selection  │        │ reset_view
//!                                          (RegionLoading) ▼        │
//!                                                        Ready(Region)
//!
//!   Saving(Some(mode)) is entered from either Ready state and returns to it.
//! ```
//!
//! Every transition that awaits I/O first takes the shared [`LoadGate`];
//! while it is held, `select_file`, `apply_selection`, `save` and new drags
//! are refused. Failures never roll back state that was already committed,
//! and the gate is released on every exit path.
//!
//! Responses are committed only if no newer view change happened while they
//! were in flight (tracked with per-session epochs); otherwise they are
//! discarded with [`ViewerError::Superseded`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::api::{SaveRequest, SaveResponse, SlideApi};
use crate::error::ViewerError;
use crate::slide::SlideMetadata;
use crate::view::{
    to_slide_space, CanvasGeometry, DisplayImage, DisplayMode, Frame, Renderer,
    SelectionController, SelectionSnapshot, ViewState,
};

use super::gate::{Activity, LoadGate};
use super::status::{StatusBoard, StatusKind, StatusMessage};

/// Default thumbnail bounds requested from the server.
pub const DEFAULT_THUMBNAIL_SIZE: (u32, u32) = (800, 800);

/// Default container bounds the canvas is fitted into.
pub const DEFAULT_CONTAINER_SIZE: (u32, u32) = (800, 800);

// =============================================================================
// Options and Public State
// =============================================================================

/// Viewer settings fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerOptions {
    /// `max_width × max_height` passed to the thumbnail endpoint
    pub thumbnail_max: (u32, u32),

    /// Initial container bounds; see [`LoadOrchestrator::resize`]
    pub container: (u32, u32),
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            thumbnail_max: DEFAULT_THUMBNAIL_SIZE,
            container: DEFAULT_CONTAINER_SIZE,
        }
    }
}

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// No file loaded and nothing in flight
    Idle,
    MetadataLoading,
    ThumbnailLoading,
    RegionLoading,
    /// A file is loaded and nothing is in flight
    Ready(DisplayMode),
    /// A save is in flight for a view in the given mode; `None` once the
    /// session was closed before the save captured its view
    Saving(Option<DisplayMode>),
}

/// Result of a successful `select_file`.
#[derive(Debug, Clone, PartialEq)]
pub enum FileLoad {
    /// The file was loaded and is now displayed
    Loaded(SlideMetadata),
    /// The file was already displayed; nothing was fetched
    Unchanged,
}

/// Which user controls are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub select_file: bool,
    pub apply: bool,
    pub reset: bool,
    pub save: bool,
}

// =============================================================================
// Session
// =============================================================================

/// Application context guarded by the orchestrator.
#[derive(Debug)]
struct Session {
    files: Vec<String>,
    current_file: Option<String>,
    metadata: Option<SlideMetadata>,
    view: Option<ViewState>,
    /// Mode of the view a save in flight was issued for
    saving_mode: Option<DisplayMode>,
    thumbnail: Option<Arc<DisplayImage>>,
    region: Option<Arc<DisplayImage>>,
    selection: SelectionController,
    container: (u32, u32),
    status: StatusBoard,

    /// Bumped when a file is committed or the session is closed
    file_epoch: u64,

    /// Bumped on every viewport change
    view_epoch: u64,
}

impl Session {
    fn new(gate: Arc<LoadGate>, container: (u32, u32)) -> Self {
        Self {
            files: Vec::new(),
            current_file: None,
            metadata: None,
            view: None,
            saving_mode: None,
            thumbnail: None,
            region: None,
            selection: SelectionController::new(gate),
            container,
            status: StatusBoard::new(),
            file_epoch: 0,
            view_epoch: 0,
        }
    }

    fn active_image(&self) -> Option<&Arc<DisplayImage>> {
        match self.view?.mode {
            DisplayMode::Thumbnail => self.thumbnail.as_ref(),
            DisplayMode::Region => self.region.as_ref(),
        }
    }

    fn geometry(&self) -> Option<CanvasGeometry> {
        self.active_image()
            .map(|image| image.fit(self.container.0, self.container.1))
    }

    /// Point the selection controller at the canvas currently drawn.
    fn sync_canvas(&mut self) {
        match self.geometry() {
            Some(geometry) => self.selection.set_canvas(&geometry),
            None => self.selection.unset_canvas(),
        }
    }
}

// =============================================================================
// Load Orchestrator
// =============================================================================

/// Coordinates file selection, region zoom and save against a [`SlideApi`].
///
/// # Example
///
/// ```ignore
/// use wsi_clip::api::{HttpSlideApi, DEFAULT_TIMEOUT};
/// use wsi_clip::session::{LoadOrchestrator, ViewerOptions};
///
/// let api = HttpSlideApi::new("http://localhost:8080/api", DEFAULT_TIMEOUT)?;
/// let viewer = LoadOrchestrator::new(api, ViewerOptions::default());
///
/// viewer.select_file("a.svs").await?;
/// viewer.pointer_down(100.0, 100.0);
/// viewer.pointer_move(200.0, 150.0, false);
/// viewer.pointer_up();
/// let view = viewer.apply_selection().await?;
/// ```
pub struct LoadOrchestrator<A: SlideApi> {
    api: A,
    gate: Arc<LoadGate>,
    session: Mutex<Session>,
    options: ViewerOptions,
}

impl<A: SlideApi> LoadOrchestrator<A> {
    pub fn new(api: A, options: ViewerOptions) -> Self {
        let gate = Arc::new(LoadGate::new());
        Self {
            api,
            session: Mutex::new(Session::new(Arc::clone(&gate), options.container)),
            gate,
            options,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // Session updates are applied in one step under the lock.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log a failure and post it to the status line.
    fn fail(&self, error: ViewerError) -> ViewerError {
        warn!("{}", error);
        self.session()
            .status
            .post(StatusKind::Error, error.to_string());
        error
    }

    // -------------------------------------------------------------------------
    // File list
    // -------------------------------------------------------------------------

    /// Fetch the file list. Not gated: it touches nothing but the list.
    pub async fn list_files(&self) -> Result<Vec<String>, ViewerError> {
        let files = self
            .api
            .list_files()
            .await
            .map_err(|e| self.fail(ViewerError::ListFailure(e.user_message())))?;

        debug!("{} slide file(s) available", files.len());
        self.session().files = files.clone();
        Ok(files)
    }

    /// The file list from the last successful [`list_files`](Self::list_files).
    pub fn files(&self) -> Vec<String> {
        self.session().files.clone()
    }

    /// Fetch metadata for any slide without loading it.
    ///
    /// Not gated and leaves the session untouched apart from the status line.
    pub async fn slide_info(&self, filename: &str) -> Result<SlideMetadata, ViewerError> {
        let metadata = self
            .api
            .slide_info(filename)
            .await
            .map_err(|e| self.fail(ViewerError::MetadataFailure(e.user_message())))?;
        debug!(
            "{}: {}x{} level-0, {} level(s)",
            filename,
            metadata.width(),
            metadata.height(),
            metadata.level_count
        );
        Ok(metadata)
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Load a slide: metadata, then thumbnail, then show the full extent.
    ///
    /// Re-selecting the file on display is a no-op. On failure the
    /// previously loaded file, if any, stays on display.
    pub async fn select_file(&self, filename: &str) -> Result<FileLoad, ViewerError> {
        let permit = self
            .gate
            .try_acquire(Activity::Metadata)
            .ok_or(ViewerError::Busy)?;

        let epoch = {
            let session = self.session();
            if session.current_file.as_deref() == Some(filename) {
                debug!("{} is already loaded", filename);
                return Ok(FileLoad::Unchanged);
            }
            session.file_epoch
        };

        info!("Loading slide {}", filename);
        self.session()
            .status
            .post(StatusKind::Info, format!("Loading {}...", filename));

        let metadata = self
            .api
            .slide_info(filename)
            .await
            .map_err(|e| self.fail(ViewerError::MetadataFailure(e.user_message())))?;
        if !metadata.is_valid() {
            return Err(self.fail(ViewerError::MetadataFailure(format!(
                "slide reports empty dimensions {}x{}",
                metadata.width(),
                metadata.height()
            ))));
        }
        debug!(
            "{}: {}x{} level-0, {} level(s)",
            filename,
            metadata.width(),
            metadata.height(),
            metadata.level_count
        );

        permit.advance(Activity::Thumbnail);
        let (max_width, max_height) = self.options.thumbnail_max;
        let bytes = self
            .api
            .thumbnail(filename, max_width, max_height)
            .await
            .map_err(|e| self.fail(ViewerError::ThumbnailFailure(e.user_message())))?;
        let thumbnail = DisplayImage::decode(&bytes)
            .map_err(|e| self.fail(ViewerError::ThumbnailFailure(e.to_string())))?;

        let mut session = self.session();
        if session.file_epoch != epoch {
            warn!("Discarding stale load of {}", filename);
            return Err(ViewerError::Superseded);
        }

        session.current_file = Some(filename.to_string());
        session.view = Some(ViewState::full(&metadata));
        session.metadata = Some(metadata.clone());
        session.thumbnail = Some(Arc::new(thumbnail));
        session.region = None;
        session.selection.clear();
        session.file_epoch += 1;
        session.view_epoch += 1;
        session.sync_canvas();
        session
            .status
            .post(StatusKind::Info, format!("Loaded {}", filename));

        info!(
            "Loaded {} ({}x{} thumbnail)",
            filename,
            session.thumbnail.as_ref().map_or(0, |t| t.width()),
            session.thumbnail.as_ref().map_or(0, |t| t.height())
        );
        Ok(FileLoad::Loaded(metadata))
    }

    /// Zoom into the current selection.
    ///
    /// Maps the selection to level-0 space, fetches that region and shows it.
    /// The thumbnail stays cached for [`reset_view`](Self::reset_view).
    pub async fn apply_selection(&self) -> Result<ViewState, ViewerError> {
        let _permit = self
            .gate
            .try_acquire(Activity::Region)
            .ok_or(ViewerError::Busy)?;

        let (filename, target, epoch) = {
            let session = self.session();
            let filename = session
                .current_file
                .clone()
                .ok_or(ViewerError::NoFileLoaded)?;

            let selection = session.selection.snapshot();
            if !selection.has_selection {
                return Err(ViewerError::NoSelection);
            }

            let (view, geometry, extent) =
                match (session.view, session.geometry(), session.metadata.as_ref()) {
                    (Some(view), Some(geometry), Some(metadata)) => {
                        (view, geometry, metadata.extent())
                    }
                    _ => return Err(ViewerError::NoFileLoaded),
                };

            let target =
                to_slide_space(selection.rect.normalized(), &view, &geometry).clamp_to(&extent);
            if target.is_empty() {
                return Err(ViewerError::EmptySelection);
            }
            (filename, target, session.view_epoch)
        };

        debug!(
            "Fetching region {}x{} at ({}, {}) of {}",
            target.width, target.height, target.x, target.y, filename
        );

        let region = self
            .api
            .region(&filename, target)
            .await
            .map_err(|e| self.fail(ViewerError::RegionFailure(e.user_message())))?;
        let image = DisplayImage::decode(&region.data)
            .map_err(|e| self.fail(ViewerError::RegionFailure(e.to_string())))?;

        let mut session = self.session();
        if session.view_epoch != epoch {
            warn!("Discarding stale region of {}", filename);
            return Err(ViewerError::Superseded);
        }

        let view = ViewState::region(target);
        session.view = Some(view);
        session.region = Some(Arc::new(image));
        session.selection.clear();
        session.view_epoch += 1;
        session.sync_canvas();
        session.status.post(
            StatusKind::Info,
            format!(
                "Region {}x{} at ({}, {})",
                target.width, target.height, target.x, target.y
            ),
        );

        info!(
            "Showing region {}x{} at ({}, {}) of {} (level {:?})",
            target.width, target.height, target.x, target.y, filename, region.level_used
        );
        Ok(view)
    }

    /// Return to the full-extent thumbnail without fetching.
    pub fn reset_view(&self) -> Result<ViewState, ViewerError> {
        let mut session = self.session();
        if session.thumbnail.is_none() {
            return Err(ViewerError::NoFileLoaded);
        }
        let view = ViewState::full(session.metadata.as_ref().ok_or(ViewerError::NoFileLoaded)?);

        session.view = Some(view);
        session.region = None;
        session.selection.clear();
        session.view_epoch += 1;
        session.sync_canvas();
        debug!("View reset to full extent");
        Ok(view)
    }

    /// Save the viewport on display under `save_filename`.
    ///
    /// With `client_download` the server may return the clip bytes instead
    /// of storing them. The view is never changed by a save.
    pub async fn save(
        &self,
        save_filename: &str,
        client_download: bool,
    ) -> Result<SaveResponse, ViewerError> {
        let _permit = self
            .gate
            .try_acquire(Activity::Saving)
            .ok_or(ViewerError::Busy)?;

        let result = self.save_current(save_filename, client_download).await;
        self.session().saving_mode = None;
        result
    }

    /// Body of [`save`](Self::save), run while the gate is held.
    async fn save_current(
        &self,
        save_filename: &str,
        client_download: bool,
    ) -> Result<SaveResponse, ViewerError> {
        let request = {
            let mut session = self.session();
            let filename = session
                .current_file
                .clone()
                .ok_or(ViewerError::NoFileLoaded)?;
            let view = session.view.ok_or(ViewerError::NoFileLoaded)?;
            session.saving_mode = Some(view.mode);
            SaveRequest::new(filename, view.rect(), save_filename.trim(), client_download)
        };
        if request.save_filename.is_empty() {
            return Err(self.fail(ViewerError::SaveFailure(
                "a save filename is required".to_string(),
            )));
        }

        debug!(
            "Saving {}x{} at ({}, {}) of {} as {}",
            request.width, request.height, request.x, request.y, request.filename,
            request.save_filename
        );

        let response = self
            .api
            .save(&request)
            .await
            .map_err(|e| self.fail(ViewerError::SaveFailure(e.user_message())))?;

        let text = match &response {
            SaveResponse::Stored { path, .. } => format!("Saved to {}", path),
            SaveResponse::Download { filename, data } => {
                format!("Downloaded {} ({} bytes)", filename, data.len())
            }
        };
        info!("{}", text);
        self.session().status.post(StatusKind::Success, text);
        Ok(response)
    }

    /// Drop the loaded file and everything derived from it.
    ///
    /// A load still in flight will be discarded when it completes.
    pub fn close(&self) {
        let mut session = self.session();
        session.current_file = None;
        session.metadata = None;
        session.view = None;
        session.thumbnail = None;
        session.region = None;
        session.selection.clear();
        session.file_epoch += 1;
        session.view_epoch += 1;
        session.sync_canvas();
        session.status.clear();
        debug!("Session closed");
    }

    // -------------------------------------------------------------------------
    // Pointer input
    // -------------------------------------------------------------------------

    /// Pointer pressed at canvas-local `(x, y)`.
    pub fn pointer_down(&self, x: f64, y: f64) -> SelectionSnapshot {
        self.session().selection.begin(x, y)
    }

    /// Pointer moved to canvas-local `(x, y)`.
    pub fn pointer_move(&self, x: f64, y: f64, square_lock: bool) -> SelectionSnapshot {
        self.session().selection.update(x, y, square_lock)
    }

    /// Pointer released.
    pub fn pointer_up(&self) -> SelectionSnapshot {
        self.session().selection.end()
    }

    pub fn clear_selection(&self) -> SelectionSnapshot {
        self.session().selection.clear()
    }

    pub fn selection(&self) -> SelectionSnapshot {
        self.session().selection.snapshot()
    }

    // -------------------------------------------------------------------------
    // Display
    // -------------------------------------------------------------------------

    /// Change the container bounds.
    ///
    /// The canvas is refitted and any selection on it clamped to the new size.
    pub fn resize(&self, width: u32, height: u32) {
        let mut session = self.session();
        session.container = (width, height);
        session.sync_canvas();
    }

    /// Geometry of the canvas currently drawn.
    pub fn geometry(&self) -> Option<CanvasGeometry> {
        self.session().geometry()
    }

    /// Draw the active raster with the selection overlay.
    pub fn render(&self, renderer: &Renderer) -> Option<Frame> {
        let (image, mode, selection, container) = {
            let mut session = self.session();
            session.sync_canvas();
            let image = Arc::clone(session.active_image()?);
            let mode = session.view?.mode;
            (image, mode, session.selection.snapshot().rect, session.container)
        };
        Some(renderer.render(&image, mode, &selection, container))
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn is_loading(&self) -> bool {
        self.gate.is_loading()
    }

    pub fn phase(&self) -> LoadPhase {
        let activity = self.gate.activity();
        let (mode, saving_mode) = {
            let session = self.session();
            (session.view.map(|view| view.mode), session.saving_mode)
        };
        match (activity, mode) {
            (Some(Activity::Metadata), _) => LoadPhase::MetadataLoading,
            (Some(Activity::Thumbnail), _) => LoadPhase::ThumbnailLoading,
            (Some(Activity::Region), _) => LoadPhase::RegionLoading,
            // The captured mode outlives a close() issued mid-save
            (Some(Activity::Saving), mode) => LoadPhase::Saving(saving_mode.or(mode)),
            (None, Some(mode)) => LoadPhase::Ready(mode),
            (None, None) => LoadPhase::Idle,
        }
    }

    pub fn view(&self) -> Option<ViewState> {
        self.session().view
    }

    pub fn metadata(&self) -> Option<SlideMetadata> {
        self.session().metadata.clone()
    }

    pub fn current_file(&self) -> Option<String> {
        self.session().current_file.clone()
    }

    /// Whether a thumbnail is cached for the loaded file.
    pub fn has_thumbnail(&self) -> bool {
        self.session().thumbnail.is_some()
    }

    /// Enabled state of the user controls.
    pub fn controls(&self) -> Controls {
        let loading = self.gate.is_loading();
        let session = self.session();
        let loaded = session.current_file.is_some();
        Controls {
            select_file: !loading,
            apply: !loading && loaded && session.selection.snapshot().has_selection,
            reset: session.thumbnail.is_some(),
            save: !loading && loaded,
        }
    }

    /// The visible status message, if any.
    pub fn status(&self) -> Option<StatusMessage> {
        self.session().status.current().cloned()
    }
}
