//! The device layer: constraint matching plus dispatch over the native and
//! synthetic capture sources.

pub mod native;
pub mod synthetic;

pub use native::NativeSource;
pub use synthetic::{SyntheticProfile, SyntheticSource, SYNTHETIC_DEVICE_ID};

use crate::errors::MediaError;
use crate::stream::{MediaStream, VideoTrack};
use crate::types::{DeviceInfo, Frame, VideoConstraints, VideoFormat};
use std::cmp::Ordering;

/// Device id that resolves to the first native camera, falling back to the
/// synthetic device when no hardware is present.
pub const AUTO_DEVICE_ID: &str = "auto";

/// Pick the format a device should grant for a constraint set.
///
/// Exact constraints are mandatory and precise; lower bounds are mandatory
/// too. Among admissible formats the smallest resolution wins (closest fit
/// to a bound), with the highest frame rate at that resolution.
pub fn select_format(
    constraints: &VideoConstraints,
    formats: &[VideoFormat],
) -> Result<VideoFormat, MediaError> {
    let admissible: Vec<VideoFormat> = formats
        .iter()
        .copied()
        .filter(|f| constraints.admits(f.width, f.height))
        .collect();

    if admissible.is_empty() {
        return Err(MediaError::Overconstrained(offending_constraint(
            constraints,
            formats,
        )));
    }

    let best = admissible
        .into_iter()
        .min_by(|a, b| {
            (a.width, a.height)
                .cmp(&(b.width, b.height))
                .then(b.fps.partial_cmp(&a.fps).unwrap_or(Ordering::Equal))
        })
        .expect("admissible set is non-empty");

    Ok(best)
}

/// Name the constraint that ruled out every format, for the error message.
fn offending_constraint(constraints: &VideoConstraints, formats: &[VideoFormat]) -> String {
    if let Some(w) = constraints.width {
        if !formats.iter().any(|f| w.admits(f.width)) {
            return format!("width {:?}", w);
        }
    }
    if let Some(h) = constraints.height {
        if !formats.iter().any(|f| h.admits(f.height)) {
            return format!("height {:?}", h);
        }
    }
    if let Some(a) = constraints.aspect_ratio {
        if !formats.iter().any(|f| a.admits(f.aspect_ratio())) {
            return format!("aspectRatio {:?}", a);
        }
    }
    format!("combination of [{}]", constraints)
}

/// A live capture source of either flavor. The variant is picked from the
/// device id at open time.
pub enum MediaSource {
    Native(NativeSource),
    Synthetic(SyntheticSource),
}

impl MediaSource {
    pub fn open(
        device_id: &str,
        synthetic: &SyntheticProfile,
        constraints: &VideoConstraints,
    ) -> Result<Self, MediaError> {
        let resolved = resolve_device_id(device_id, synthetic);

        if resolved.starts_with("synthetic") {
            let mut profile = synthetic.clone();
            profile.device_id = resolved;
            Ok(MediaSource::Synthetic(SyntheticSource::open(
                profile,
                constraints,
            )?))
        } else {
            Ok(MediaSource::Native(NativeSource::open(
                &resolved,
                constraints,
            )?))
        }
    }

    pub fn device_id(&self) -> &str {
        match self {
            MediaSource::Native(s) => s.device_id(),
            MediaSource::Synthetic(s) => s.device_id(),
        }
    }

    /// The granted capture format.
    pub fn format(&self) -> VideoFormat {
        match self {
            MediaSource::Native(s) => s.format(),
            MediaSource::Synthetic(s) => s.format(),
        }
    }

    pub fn read_frame(&mut self) -> Result<Frame, MediaError> {
        match self {
            MediaSource::Native(s) => s.read_frame(),
            MediaSource::Synthetic(s) => s.read_frame(),
        }
    }

    pub fn reformat(&mut self, constraints: &VideoConstraints) -> Result<(), MediaError> {
        match self {
            MediaSource::Native(s) => s.reformat(constraints),
            MediaSource::Synthetic(s) => s.reformat(constraints),
        }
    }

    pub fn close(&mut self) {
        match self {
            MediaSource::Native(s) => s.close(),
            MediaSource::Synthetic(s) => s.close(),
        }
    }
}

fn resolve_device_id(device_id: &str, synthetic: &SyntheticProfile) -> String {
    if device_id != AUTO_DEVICE_ID {
        return device_id.to_string();
    }

    match native::list_native_devices() {
        Ok(devices) if !devices.is_empty() => devices[0].id.clone(),
        Ok(_) => {
            log::debug!("no native cameras found, falling back to synthetic device");
            synthetic.device_id.clone()
        }
        Err(e) => {
            log::debug!("native camera query failed ({}), falling back to synthetic device", e);
            synthetic.device_id.clone()
        }
    }
}

/// Acquire a stream with a single video track satisfying `constraints`.
///
/// This is the blocking core of stream acquisition; callers run it under a
/// blocking-friendly executor.
pub fn acquire(
    device_id: &str,
    synthetic: &SyntheticProfile,
    constraints: &VideoConstraints,
) -> Result<MediaStream, MediaError> {
    let source = MediaSource::open(device_id, synthetic, constraints)?;
    let label = source.device_id().to_string();
    let track = VideoTrack::new(source, *constraints, label);
    Ok(MediaStream::new(vec![track]))
}

/// Formats advertised by one device.
pub fn list_formats(
    device_id: &str,
    synthetic: &SyntheticProfile,
) -> Result<Vec<VideoFormat>, MediaError> {
    let devices = list_devices(synthetic);
    let device = devices
        .into_iter()
        .find(|d| d.id == device_id)
        .ok_or_else(|| MediaError::NotFound(format!("device not found: {}", device_id)))?;
    Ok(device.formats)
}

/// All devices visible to this process: native cameras plus the synthetic
/// device described by `synthetic`.
pub fn list_devices(synthetic: &SyntheticProfile) -> Vec<DeviceInfo> {
    let mut devices = match native::list_native_devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("native camera query failed: {}", e);
            Vec::new()
        }
    };
    devices.push(synthetic.device_info());
    devices
}
