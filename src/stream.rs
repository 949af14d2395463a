//! Live stream and track handles.
//!
//! A `MediaStream` owns its tracks; a `VideoTrack` is a cloneable handle to
//! one live video channel. Stopping a track releases its device source, and
//! every clone observes the ended state.

use crate::errors::MediaError;
use crate::source::MediaSource;
use crate::types::{Frame, VideoConstraints, VideoDimensions, VideoFormat};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

struct TrackInner {
    id: String,
    label: String,
    source: Mutex<Option<MediaSource>>,
    constraints: Mutex<VideoConstraints>,
    /// Actual dimensions as last seen on a delivered frame; falls back to
    /// the granted format until the first frame arrives.
    actual: Mutex<Option<VideoDimensions>>,
    ended: AtomicBool,
}

/// Handle to a single live video channel.
#[derive(Clone)]
pub struct VideoTrack {
    inner: Arc<TrackInner>,
}

impl VideoTrack {
    pub(crate) fn new(source: MediaSource, constraints: VideoConstraints, label: String) -> Self {
        let granted = source.format().dimensions();
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4().to_string(),
                label,
                source: Mutex::new(Some(source)),
                constraints: Mutex::new(constraints),
                actual: Mutex::new(Some(granted)),
                ended: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn ended(&self) -> bool {
        self.inner.ended.load(Ordering::SeqCst)
    }

    /// The constraints most recently requested for this track.
    pub fn constraints(&self) -> VideoConstraints {
        *self.inner.constraints.lock().expect("lock poisoned")
    }

    /// The granted capture format, while the track is live.
    pub fn settings(&self) -> Option<VideoFormat> {
        self.inner
            .source
            .lock()
            .expect("lock poisoned")
            .as_ref()
            .map(|s| s.format())
    }

    /// Actual dimensions of the delivered video, while the track is live.
    pub fn dimensions(&self) -> Option<VideoDimensions> {
        if self.ended() {
            return None;
        }
        *self.inner.actual.lock().expect("lock poisoned")
    }

    /// Pull one frame from the source, updating the observed dimensions.
    pub fn read_frame(&self) -> Result<Frame, MediaError> {
        let mut guard = self.inner.source.lock().expect("lock poisoned");
        let source = guard
            .as_mut()
            .ok_or_else(|| MediaError::TrackEnded("track is stopped".to_string()))?;
        let frame = source.read_frame()?;
        *self.inner.actual.lock().expect("lock poisoned") = Some(frame.dimensions());
        Ok(frame)
    }

    /// Ask the source to satisfy a new constraint set. On success the
    /// track's recorded constraints are replaced wholesale; on failure
    /// both constraints and granted mode are untouched.
    pub fn apply_constraints(&self, constraints: &VideoConstraints) -> Result<(), MediaError> {
        let mut guard = self.inner.source.lock().expect("lock poisoned");
        let source = guard
            .as_mut()
            .ok_or_else(|| MediaError::TrackEnded("track is stopped".to_string()))?;

        source.reformat(constraints)?;
        let granted = source.format().dimensions();
        drop(guard);

        *self.inner.constraints.lock().expect("lock poisoned") = *constraints;
        *self.inner.actual.lock().expect("lock poisoned") = Some(granted);
        Ok(())
    }

    /// End the track and release the device source. Idempotent.
    pub fn stop(&self) {
        if self.inner.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(mut source) = self.inner.source.lock().expect("lock poisoned").take() {
            source.close();
        }
        log::debug!("track {} stopped", self.inner.id);
    }
}

impl std::fmt::Debug for VideoTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTrack")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("ended", &self.ended())
            .finish()
    }
}

/// A set of live tracks acquired together.
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<VideoTrack>,
}

impl MediaStream {
    pub(crate) fn new(tracks: Vec<VideoTrack>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn video_tracks(&self) -> &[VideoTrack] {
        &self.tracks
    }

    pub fn first_video_track(&self) -> Option<&VideoTrack> {
        self.tracks.first()
    }

    /// Whether any track is still live.
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(|t| !t.ended())
    }

    /// Stop every track, releasing all device handles.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
        log::debug!("stream {} stopped", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MediaSource, SyntheticProfile};
    use crate::types::VideoConstraints;

    fn synthetic_track(constraints: VideoConstraints) -> VideoTrack {
        let profile = SyntheticProfile::default();
        let source = MediaSource::open(&profile.device_id.clone(), &profile, &constraints).unwrap();
        VideoTrack::new(source, constraints, "synthetic".to_string())
    }

    #[test]
    fn stop_ends_every_clone_and_releases_the_source() {
        let track = synthetic_track(VideoConstraints::vga());
        let other = track.clone();

        assert!(!other.ended());
        track.stop();

        assert!(other.ended());
        assert!(other.settings().is_none());
        assert!(matches!(
            other.read_frame(),
            Err(MediaError::TrackEnded(_))
        ));
    }

    #[test]
    fn failed_apply_leaves_track_state_untouched() {
        let track = synthetic_track(VideoConstraints::vga());
        let before = track.constraints();

        let err = track
            .apply_constraints(&VideoConstraints::exact(12345, 6789))
            .unwrap_err();
        assert!(matches!(err, MediaError::Overconstrained(_)));
        assert_eq!(track.constraints(), before);
        assert_eq!(track.settings().unwrap().width, 640);
    }

    #[test]
    fn stream_stop_all_is_idempotent() {
        let track = synthetic_track(VideoConstraints::qvga());
        let stream = MediaStream::new(vec![track]);

        assert!(stream.is_active());
        stream.stop_all();
        stream.stop_all();
        assert!(!stream.is_active());
    }
}
