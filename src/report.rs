//! Dimension observation and error display.
//!
//! Both pieces are deliberately dumb: the dimension tracker remembers the
//! last actual size and logs only changes; the error reporter is a single
//! flat message slot with no severity levels.

use crate::types::VideoDimensions;
use std::fmt;

/// What caused a dimension observation. Diagnostic visibility only; the
/// tracker behaves identically for every trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionTrigger {
    LoadedMetadata,
    Resize,
    ApplyConstraints,
}

impl DimensionTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionTrigger::LoadedMetadata => "loadedmetadata",
            DimensionTrigger::Resize => "resize",
            DimensionTrigger::ApplyConstraints => "applyConstraints",
        }
    }
}

impl fmt::Display for DimensionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Text shown while no dimensions are observable.
pub const NOT_READY: &str = "Video not ready";

/// Remembers the last observed actual dimensions and emits one log line
/// per change, tagged with the trigger that saw it first.
#[derive(Debug, Default)]
pub struct DimensionTracker {
    current: Option<VideoDimensions>,
    emitted: u64,
}

impl DimensionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation and return the display text for it.
    ///
    /// A `None` observation means the surface is not ready. Repeated
    /// observations of the same dimensions return the same text but do
    /// not log again.
    pub fn observe(
        &mut self,
        trigger: DimensionTrigger,
        dims: Option<VideoDimensions>,
    ) -> String {
        let Some(dims) = dims else {
            return NOT_READY.to_string();
        };

        let text = format!(
            "Actual video dimensions: {}x{}px.",
            dims.width, dims.height
        );
        if self.current != Some(dims) {
            log::info!("{}: {}", trigger, text);
            self.current = Some(dims);
            self.emitted = self.emitted.saturating_add(1);
        }
        text
    }

    /// Last observed dimensions, if any surface has been ready yet.
    pub fn current(&self) -> Option<VideoDimensions> {
        self.current
    }

    /// Display text for the last observation.
    pub fn text(&self) -> String {
        match self.current {
            Some(d) => format!("Actual video dimensions: {}x{}px.", d.width, d.height),
            None => NOT_READY.to_string(),
        }
    }

    /// Number of change log lines emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

/// The single visible error slot: one formatted message or nothing.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    message: Option<String>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format, log, and display `source: detail`, replacing any previous
    /// message.
    pub fn report(&mut self, source: &str, detail: &str) -> String {
        let message = format!("{}: {}", source, detail);
        log::warn!("{}", message);
        self.message = Some(message.clone());
        message
    }

    /// Hide the message area.
    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_reports_not_ready_without_dimensions() {
        let mut tracker = DimensionTracker::new();
        assert_eq!(tracker.observe(DimensionTrigger::Resize, None), NOT_READY);
        assert_eq!(tracker.current(), None);
        assert_eq!(tracker.emitted(), 0);
    }

    #[test]
    fn tracker_emits_once_per_change() {
        let mut tracker = DimensionTracker::new();
        let dims = VideoDimensions::new(640, 480);

        tracker.observe(DimensionTrigger::LoadedMetadata, Some(dims));
        assert_eq!(tracker.emitted(), 1);

        // Same dimensions again, from any trigger: no new log entry.
        tracker.observe(DimensionTrigger::Resize, Some(dims));
        tracker.observe(DimensionTrigger::ApplyConstraints, Some(dims));
        assert_eq!(tracker.emitted(), 1);

        tracker.observe(DimensionTrigger::Resize, Some(VideoDimensions::new(320, 240)));
        assert_eq!(tracker.emitted(), 2);
        assert_eq!(tracker.current(), Some(VideoDimensions::new(320, 240)));
    }

    #[test]
    fn reporter_formats_source_and_detail() {
        let mut reporter = ErrorReporter::new();
        let shown = reporter.report("get_user_media", "Overconstrained");
        assert_eq!(shown, "get_user_media: Overconstrained");
        assert_eq!(reporter.message(), Some("get_user_media: Overconstrained"));
        assert!(reporter.is_visible());

        reporter.clear();
        assert_eq!(reporter.message(), None);
        assert!(!reporter.is_visible());
    }

    #[test]
    fn trigger_names_match_their_events() {
        assert_eq!(DimensionTrigger::LoadedMetadata.as_str(), "loadedmetadata");
        assert_eq!(DimensionTrigger::Resize.as_str(), "resize");
        assert_eq!(DimensionTrigger::ApplyConstraints.as_str(), "applyConstraints");
    }
}
