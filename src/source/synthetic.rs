//! Synthetic capture source.
//!
//! Delivers deterministic gradient frames at whatever format the constraint
//! matcher grants, without touching hardware. Used by the test suite and as
//! the fallback device on machines with no camera.

use crate::errors::MediaError;
use crate::source::select_format;
use crate::types::{DeviceInfo, Frame, VideoConstraints, VideoDimensions, VideoFormat};

pub const SYNTHETIC_DEVICE_ID: &str = "synthetic-0";

/// Resolution ladder offered by a synthetic device, capped by its
/// configured native ceiling.
const LADDER: [(u32, u32); 10] = [
    (320, 240),
    (640, 480),
    (800, 600),
    (1024, 768),
    (1280, 720),
    (1920, 1080),
    (2560, 1440),
    (3840, 2160),
    (4096, 2160),
    (7680, 4320),
];

/// Characteristics of a synthetic device.
#[derive(Debug, Clone)]
pub struct SyntheticProfile {
    pub device_id: String,
    pub label: String,
    /// Largest frame the device will grant; oversized exact requests fail
    /// the same way real hardware does.
    pub native: VideoDimensions,
    /// Artificial open latency, for exercising in-flight supersede.
    pub open_latency_ms: u64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            device_id: SYNTHETIC_DEVICE_ID.to_string(),
            label: "Synthetic Camera".to_string(),
            native: VideoDimensions::new(3840, 2160),
            open_latency_ms: 0,
        }
    }
}

impl SyntheticProfile {
    pub fn with_native(mut self, width: u32, height: u32) -> Self {
        self.native = VideoDimensions::new(width, height);
        self
    }

    pub fn with_open_latency_ms(mut self, latency: u64) -> Self {
        self.open_latency_ms = latency;
        self
    }

    /// Formats this device can deliver: the ladder up to the native
    /// ceiling, at 30fps, with a 60fps variant for the smaller modes.
    pub fn formats(&self) -> Vec<VideoFormat> {
        let mut formats = Vec::new();
        for &(width, height) in LADDER.iter() {
            if width > self.native.width || height > self.native.height {
                continue;
            }
            formats.push(VideoFormat::new(width, height, 30.0));
            if height <= 720 {
                formats.push(VideoFormat::new(width, height, 60.0));
            }
        }
        formats
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new(self.device_id.clone(), self.label.clone())
            .with_description("Deterministic synthetic capture device".to_string())
            .with_formats(self.formats())
    }
}

/// A live synthetic source delivering gradient frames.
#[derive(Debug)]
pub struct SyntheticSource {
    profile: SyntheticProfile,
    format: VideoFormat,
    frame_number: u64,
}

impl SyntheticSource {
    pub fn open(
        profile: SyntheticProfile,
        constraints: &VideoConstraints,
    ) -> Result<Self, MediaError> {
        if profile.open_latency_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(profile.open_latency_ms));
        }

        let format = select_format(constraints, &profile.formats())?;
        log::debug!(
            "synthetic device {} granted {} for [{}]",
            profile.device_id,
            format,
            constraints
        );

        Ok(Self {
            profile,
            format,
            frame_number: 0,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.profile.device_id
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn read_frame(&mut self) -> Result<Frame, MediaError> {
        let frame = gradient_frame(self.frame_number, self.format.width, self.format.height)
            .with_format("RGB8".to_string());
        self.frame_number = self.frame_number.wrapping_add(1);
        Ok(Frame {
            device_id: self.profile.device_id.clone(),
            ..frame
        })
    }

    /// Re-match constraints against the device's formats and switch to the
    /// newly granted mode.
    pub fn reformat(&mut self, constraints: &VideoConstraints) -> Result<(), MediaError> {
        let format = select_format(constraints, &self.profile.formats())?;
        if format != self.format {
            log::debug!(
                "synthetic device {} reformatted {} -> {}",
                self.profile.device_id,
                self.format,
                format
            );
            self.format = format;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        log::debug!("synthetic device {} closed", self.profile.device_id);
    }
}

/// A frame whose content varies by position and frame number, so consumers
/// can tell frames apart.
fn gradient_frame(frame_number: u64, width: u32, height: u32) -> Frame {
    let mut data = vec![0u8; (width * height * 3) as usize];

    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    Frame::new(data, width, height, SYNTHETIC_DEVICE_ID.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Constrain;

    #[test]
    fn ladder_is_capped_by_native_ceiling() {
        let profile = SyntheticProfile::default().with_native(1920, 1080);
        let formats = profile.formats();
        assert!(formats.iter().all(|f| f.width <= 1920 && f.height <= 1080));
        assert!(formats.iter().any(|f| f.width == 1920));
    }

    #[test]
    fn oversized_exact_request_is_overconstrained() {
        let profile = SyntheticProfile::default().with_native(1920, 1080);
        let err = SyntheticSource::open(profile, &VideoConstraints::four_k()).unwrap_err();
        assert!(matches!(err, MediaError::Overconstrained(_)));
    }

    #[test]
    fn frames_match_granted_format_and_differ_over_time() {
        let mut source =
            SyntheticSource::open(SyntheticProfile::default(), &VideoConstraints::qvga()).unwrap();
        let first = source.read_frame().unwrap();
        let second = source.read_frame().unwrap();

        assert_eq!(first.width, 320);
        assert_eq!(first.height, 240);
        assert_eq!(first.data.len(), 320 * 240 * 3);
        assert_ne!(first.data[0], second.data[0]);
    }

    #[test]
    fn reformat_switches_granted_mode() {
        let mut source =
            SyntheticSource::open(SyntheticProfile::default(), &VideoConstraints::vga()).unwrap();
        assert_eq!(source.format().width, 640);

        source
            .reformat(&VideoConstraints {
                width: Some(Constrain::Exact(320)),
                height: None,
                aspect_ratio: None,
            })
            .unwrap();
        assert_eq!(source.format().width, 320);
    }
}
