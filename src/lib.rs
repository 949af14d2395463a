//! resolens: interactive camera resolution and constraint control
//!
//! This crate acquires camera video at a requested resolution, holds the
//! resulting live stream, and lets callers adjust the video track's width
//! on the fly while observing what the device actually delivers.
//!
//! # Features
//! - Named resolution presets from QVGA up to 8K
//! - Exact and lower-bound constraints on width, height, and aspect ratio
//! - Replace-on-acquire stream lifecycle: the previous stream's tracks are
//!   always stopped before a new one goes live
//! - Live width adjustment against the active track, with optional aspect
//!   lock derived from the observed dimensions
//! - Deduplicated dimension reporting tagged with the event that saw the
//!   change first
//! - A synthetic capture device for tests and camera-less machines
//!
//! # Usage
//! ```rust,no_run
//! use resolens::{PreviewSession, Preset, SessionOptions};
//!
//! # async fn demo() -> Result<(), resolens::SessionError> {
//! let session = PreviewSession::new(SessionOptions::default());
//! session.request_preset(Preset::Hd).await?;
//! session.apply_width(640, true).await?;
//! println!("{}", session.dimension_text());
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod errors;
pub mod permissions;
pub mod report;
pub mod session;
pub mod source;
pub mod stream;
pub mod types;

// Re-exports for convenience
pub use config::ResolensConfig;
pub use errors::MediaError;
pub use report::{DimensionTracker, DimensionTrigger, ErrorReporter};
pub use session::{PreviewSession, PreviewState, ScaleMode, SessionError, SessionOptions};
pub use source::{MediaSource, SyntheticProfile};
pub use stream::{MediaStream, VideoTrack};
pub use types::{
    AspectConstrain, Constrain, DeviceInfo, Frame, Platform, Preset, VideoConstraints,
    VideoDimensions, VideoFormat,
};

/// Detect the current platform using the Platform enum
pub fn current_platform() -> Platform {
    Platform::current()
}

/// Initialize logging for the capture pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "resolens=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: Platform::current(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: Platform,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_platform_detection() {
        let platform = current_platform();
        assert_ne!(platform, Platform::Unknown);
    }

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "resolens");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }
}
