//! The interactive preview session: stream acquisition with replace
//! semantics, live width adjustment, dimension observation, and the single
//! error slot.

use crate::errors::MediaError;
use crate::report::{DimensionTracker, DimensionTrigger, ErrorReporter};
use crate::source::{self, SyntheticProfile, AUTO_DEVICE_ID};
use crate::stream::{MediaStream, VideoTrack};
use crate::types::{Constrain, Frame, Preset, VideoConstraints, VideoDimensions};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Errors from session operations. Device failures pass through as
/// `Media`; the session itself only adds its two preconditions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("no active stream")]
    NoActiveStream,
    #[error("stream has no video track")]
    NoVideoTrack,
    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Visibility of the preview area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Hidden,
    Visible,
}

/// Presentation sizing of the preview area. Pure display state; never fed
/// back into constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    Auto,
    Fixed,
}

impl std::fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleMode::Auto => write!(f, "auto"),
            ScaleMode::Fixed => write!(f, "fixed"),
        }
    }
}

/// Session construction options: which device to open and how the
/// synthetic fallback behaves.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub device_id: String,
    pub synthetic: SyntheticProfile,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            device_id: AUTO_DEVICE_ID.to_string(),
            synthetic: SyntheticProfile::default(),
        }
    }
}

impl SessionOptions {
    pub fn synthetic_only() -> Self {
        let synthetic = SyntheticProfile::default();
        Self {
            device_id: synthetic.device_id.clone(),
            synthetic,
        }
    }

    pub fn with_device(mut self, device_id: &str) -> Self {
        self.device_id = device_id.to_string();
        self
    }

    pub fn with_synthetic(mut self, synthetic: SyntheticProfile) -> Self {
        self.device_id = synthetic.device_id.clone();
        self.synthetic = synthetic;
        self
    }
}

struct Inner {
    options: SessionOptions,
    /// Monotonically increasing acquisition generation. A result landing
    /// after a newer request started is stopped and discarded.
    generation: AtomicU64,
    stream: Mutex<Option<MediaStream>>,
    preview: Mutex<PreviewState>,
    scale: Mutex<ScaleMode>,
    width_readout: Mutex<Option<u32>>,
    dimensions: Mutex<DimensionTracker>,
    errors: Mutex<ErrorReporter>,
}

/// Cloneable handle to one interactive preview session. All state lives
/// behind the handle; clones observe the same session.
#[derive(Clone)]
pub struct PreviewSession {
    inner: Arc<Inner>,
}

impl PreviewSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                generation: AtomicU64::new(0),
                stream: Mutex::new(None),
                preview: Mutex::new(PreviewState::Hidden),
                scale: Mutex::new(ScaleMode::Auto),
                width_readout: Mutex::new(None),
                dimensions: Mutex::new(DimensionTracker::new()),
                errors: Mutex::new(ErrorReporter::new()),
            }),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SessionOptions::default())
    }

    /// Acquire a new stream for `constraints`, replacing any active one.
    ///
    /// The previous stream's tracks are stopped before acquisition starts.
    /// The preview is hidden for the duration of the attempt and becomes
    /// visible only on success. A success that lands after a newer request
    /// has started is stopped and discarded; the call still returns `Ok`.
    pub async fn request_stream(
        &self,
        constraints: VideoConstraints,
    ) -> Result<(), SessionError> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("requesting stream #{generation}: [{constraints}]");

        *self.inner.preview.lock().expect("lock poisoned") = PreviewState::Hidden;
        self.inner.errors.lock().expect("lock poisoned").clear();

        if let Some(previous) = self.inner.stream.lock().expect("lock poisoned").take() {
            previous.stop_all();
        }

        let device_id = self.inner.options.device_id.clone();
        let synthetic = self.inner.options.synthetic.clone();
        let result = tokio::task::spawn_blocking(move || {
            source::acquire(&device_id, &synthetic, &constraints)
        })
        .await
        .map_err(|e| MediaError::Backend(format!("acquisition task failed: {}", e)))?;

        let current = self.inner.generation.load(Ordering::SeqCst) == generation;
        match result {
            Ok(stream) => {
                if !current {
                    log::debug!("stream #{generation} superseded, discarding");
                    stream.stop_all();
                    return Ok(());
                }
                self.install_stream(stream);
                Ok(())
            }
            Err(e) => {
                if current {
                    self.inner
                        .errors
                        .lock()
                        .expect("lock poisoned")
                        .report("get_user_media", e.name());
                }
                Err(SessionError::Media(e))
            }
        }
    }

    /// Acquire using one of the named presets.
    pub async fn request_preset(&self, preset: Preset) -> Result<(), SessionError> {
        self.request_stream(preset.constraints()).await
    }

    fn install_stream(&self, stream: MediaStream) {
        if let Some(track) = stream.first_video_track() {
            self.sync_width_readout(track);
        }
        *self.inner.stream.lock().expect("lock poisoned") = Some(stream);
        *self.inner.preview.lock().expect("lock poisoned") = PreviewState::Visible;
        self.observe(DimensionTrigger::LoadedMetadata);
    }

    /// Mirror the acquired track's requested width into the readout:
    /// exact if one was given, the lower bound otherwise.
    fn sync_width_readout(&self, track: &VideoTrack) {
        match track.constraints().width {
            Some(Constrain::Exact(w)) | Some(Constrain::AtLeast(w)) => {
                *self.inner.width_readout.lock().expect("lock poisoned") = Some(w);
            }
            None => {}
        }
    }

    /// Request a new exact width on the active video track.
    ///
    /// With `lock_aspect`, the current actual aspect ratio is constrained
    /// exactly alongside the width. On failure the error is reported and
    /// the width readout is left where it was.
    pub async fn apply_width(&self, pixels: u32, lock_aspect: bool) -> Result<(), SessionError> {
        let track = self.active_track()?;

        let mut constraints = VideoConstraints::width_exact(pixels);
        if lock_aspect {
            if let Some(dims) = track.dimensions() {
                constraints = constraints.with_exact_aspect(dims.aspect_ratio());
            }
        }

        self.inner.errors.lock().expect("lock poisoned").clear();
        log::debug!("applying [{constraints}]");

        let worker = track.clone();
        let result =
            tokio::task::spawn_blocking(move || worker.apply_constraints(&constraints))
                .await
                .map_err(|e| MediaError::Backend(format!("constraint task failed: {}", e)))?;

        match result {
            Ok(()) => {
                *self.inner.width_readout.lock().expect("lock poisoned") = Some(pixels);
                self.observe(DimensionTrigger::ApplyConstraints);
                Ok(())
            }
            Err(e) => {
                self.inner
                    .errors
                    .lock()
                    .expect("lock poisoned")
                    .report("apply_constraints", e.name());
                Err(SessionError::Media(e))
            }
        }
    }

    /// Pull one frame from the active track.
    pub async fn capture_frame(&self) -> Result<Frame, SessionError> {
        let track = self.active_track()?;
        let worker = track.clone();
        let frame = tokio::task::spawn_blocking(move || worker.read_frame())
            .await
            .map_err(|e| MediaError::Backend(format!("capture task failed: {}", e)))??;
        Ok(frame)
    }

    /// Re-observe the actual dimensions, as a resize poll. Returns the
    /// display text.
    pub fn tick(&self) -> String {
        self.observe(DimensionTrigger::Resize)
    }

    fn observe(&self, trigger: DimensionTrigger) -> String {
        let dims = self.active_dimensions();
        self.inner
            .dimensions
            .lock()
            .expect("lock poisoned")
            .observe(trigger, dims)
    }

    fn active_dimensions(&self) -> Option<VideoDimensions> {
        let guard = self.inner.stream.lock().expect("lock poisoned");
        guard
            .as_ref()
            .and_then(|s| s.first_video_track())
            .and_then(|t| t.dimensions())
    }

    fn active_track(&self) -> Result<VideoTrack, SessionError> {
        let guard = self.inner.stream.lock().expect("lock poisoned");
        let stream = guard.as_ref().ok_or(SessionError::NoActiveStream)?;
        let track = stream
            .first_video_track()
            .ok_or(SessionError::NoVideoTrack)?;
        if track.ended() {
            return Err(SessionError::NoVideoTrack);
        }
        Ok(track.clone())
    }

    /// Stop the active stream, hide the preview, and forget the readouts.
    pub fn release(&self) {
        if let Some(stream) = self.inner.stream.lock().expect("lock poisoned").take() {
            stream.stop_all();
        }
        *self.inner.preview.lock().expect("lock poisoned") = PreviewState::Hidden;
        self.inner
            .dimensions
            .lock()
            .expect("lock poisoned")
            .reset();
    }

    // Read accessors for the interactive surface.

    pub fn preview(&self) -> PreviewState {
        *self.inner.preview.lock().expect("lock poisoned")
    }

    pub fn error_message(&self) -> Option<String> {
        self.inner
            .errors
            .lock()
            .expect("lock poisoned")
            .message()
            .map(|s| s.to_string())
    }

    pub fn width_readout(&self) -> Option<u32> {
        *self.inner.width_readout.lock().expect("lock poisoned")
    }

    pub fn dimensions(&self) -> Option<VideoDimensions> {
        self.inner
            .dimensions
            .lock()
            .expect("lock poisoned")
            .current()
    }

    pub fn dimension_text(&self) -> String {
        self.inner.dimensions.lock().expect("lock poisoned").text()
    }

    /// Number of dimension-change log entries emitted so far.
    pub fn dimension_report_count(&self) -> u64 {
        self.inner
            .dimensions
            .lock()
            .expect("lock poisoned")
            .emitted()
    }

    pub fn video_track(&self) -> Option<VideoTrack> {
        let guard = self.inner.stream.lock().expect("lock poisoned");
        guard
            .as_ref()
            .and_then(|s| s.first_video_track())
            .cloned()
    }

    pub fn scale_mode(&self) -> ScaleMode {
        *self.inner.scale.lock().expect("lock poisoned")
    }

    pub fn set_scale_mode(&self, mode: ScaleMode) {
        log::info!("Setting {} size", mode);
        *self.inner.scale.lock().expect("lock poisoned") = mode;
    }
}

impl std::fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSession")
            .field("device_id", &self.inner.options.device_id)
            .field("preview", &self.preview())
            .finish()
    }
}
