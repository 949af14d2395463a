//! Core types: constraint values, constraint sets, resolution presets,
//! device descriptors, and captured frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tolerance used when comparing aspect ratios against an exact constraint.
///
/// Camera format tables are integer width/height pairs, so requiring exact
/// float equality would reject formats the request obviously means.
pub const ASPECT_TOLERANCE: f64 = 1e-3;

/// A single requested dimension: either a precise value or a lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constrain {
    Exact(u32),
    AtLeast(u32),
}

impl Constrain {
    /// The numeric payload, regardless of variant.
    pub fn value(&self) -> u32 {
        match self {
            Constrain::Exact(v) | Constrain::AtLeast(v) => *v,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Constrain::Exact(_))
    }

    /// Whether an actual dimension satisfies this constraint.
    pub fn admits(&self, actual: u32) -> bool {
        match self {
            Constrain::Exact(v) => actual == *v,
            Constrain::AtLeast(v) => actual >= *v,
        }
    }
}

/// An aspect-ratio request. Ratios are width divided by height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AspectConstrain {
    Exact(f64),
    AtLeast(f64),
}

impl AspectConstrain {
    pub fn value(&self) -> f64 {
        match self {
            AspectConstrain::Exact(v) | AspectConstrain::AtLeast(v) => *v,
        }
    }

    pub fn admits(&self, ratio: f64) -> bool {
        match self {
            AspectConstrain::Exact(v) => (ratio - v).abs() <= ASPECT_TOLERANCE,
            AspectConstrain::AtLeast(v) => ratio + ASPECT_TOLERANCE >= *v,
        }
    }
}

/// A declarative capture request: width, height, and optionally aspect
/// ratio. Immutable once built; acquisition and track adjustment both take
/// one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub width: Option<Constrain>,
    pub height: Option<Constrain>,
    pub aspect_ratio: Option<AspectConstrain>,
}

impl VideoConstraints {
    /// Request an exact width/height pair.
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Some(Constrain::Exact(width)),
            height: Some(Constrain::Exact(height)),
            aspect_ratio: None,
        }
    }

    /// Request lower bounds on width and height.
    pub fn at_least(width: u32, height: u32) -> Self {
        Self {
            width: Some(Constrain::AtLeast(width)),
            height: Some(Constrain::AtLeast(height)),
            aspect_ratio: None,
        }
    }

    /// Request an exact width only, leaving height to the device.
    pub fn width_exact(width: u32) -> Self {
        Self {
            width: Some(Constrain::Exact(width)),
            height: None,
            aspect_ratio: None,
        }
    }

    pub fn with_exact_aspect(mut self, ratio: f64) -> Self {
        self.aspect_ratio = Some(AspectConstrain::Exact(ratio));
        self
    }

    // The six interactive presets.
    pub fn qvga() -> Self {
        Self::exact(320, 240)
    }

    pub fn vga() -> Self {
        Self::exact(640, 480)
    }

    pub fn hd() -> Self {
        Self::exact(1280, 720)
    }

    pub fn full_hd() -> Self {
        Self::exact(1920, 1080)
    }

    pub fn four_k() -> Self {
        Self::exact(4096, 2160)
    }

    pub fn eight_k() -> Self {
        Self::exact(7680, 4320)
    }

    /// Whether a concrete width/height pair satisfies every constraint in
    /// the set. Empty sets admit everything.
    pub fn admits(&self, width: u32, height: u32) -> bool {
        if let Some(w) = self.width {
            if !w.admits(width) {
                return false;
            }
        }
        if let Some(h) = self.height {
            if !h.admits(height) {
                return false;
            }
        }
        if let Some(a) = self.aspect_ratio {
            if height == 0 || !a.admits(width as f64 / height as f64) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.aspect_ratio.is_none()
    }
}

impl fmt::Display for VideoConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |c: Option<Constrain>| match c {
            Some(Constrain::Exact(v)) => format!("={v}"),
            Some(Constrain::AtLeast(v)) => format!(">={v}"),
            None => "any".to_string(),
        };
        write!(f, "width{} height{}", part(self.width), part(self.height))?;
        if let Some(a) = self.aspect_ratio {
            write!(f, " aspect~{:.4}", a.value())?;
        }
        Ok(())
    }
}

/// Named resolution presets for the interactive surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    Qvga,
    Vga,
    Hd,
    FullHd,
    FourK,
    EightK,
}

impl Preset {
    pub fn all() -> [Preset; 6] {
        [
            Preset::Qvga,
            Preset::Vga,
            Preset::Hd,
            Preset::FullHd,
            Preset::FourK,
            Preset::EightK,
        ]
    }

    pub fn constraints(&self) -> VideoConstraints {
        match self {
            Preset::Qvga => VideoConstraints::qvga(),
            Preset::Vga => VideoConstraints::vga(),
            Preset::Hd => VideoConstraints::hd(),
            Preset::FullHd => VideoConstraints::full_hd(),
            Preset::FourK => VideoConstraints::four_k(),
            Preset::EightK => VideoConstraints::eight_k(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Qvga => "qvga",
            Preset::Vga => "vga",
            Preset::Hd => "hd",
            Preset::FullHd => "full-hd",
            Preset::FourK => "4k",
            Preset::EightK => "8k",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "qvga" => Ok(Preset::Qvga),
            "vga" => Ok(Preset::Vga),
            "hd" => Ok(Preset::Hd),
            "full-hd" | "fullhd" | "full_hd" | "1080p" => Ok(Preset::FullHd),
            "4k" | "fourk" => Ok(Preset::FourK),
            "8k" | "eightk" => Ok(Preset::EightK),
            other => Err(format!("unknown preset: {other}")),
        }
    }
}

/// Actual width/height of a live video surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

impl fmt::Display for VideoDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A concrete capture mode a device can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
}

impl VideoFormat {
    pub fn new(width: u32, height: u32, fps: f32) -> Self {
        Self { width, height, fps }
    }

    pub fn dimensions(&self) -> VideoDimensions {
        VideoDimensions::new(self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.dimensions().aspect_ratio()
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.fps)
    }
}

/// Descriptor for a capture device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub formats: Vec<VideoFormat>,
    pub is_available: bool,
}

impl DeviceInfo {
    pub fn new(id: String, label: String) -> Self {
        Self {
            id,
            label,
            description: None,
            formats: Vec::new(),
            is_available: true,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_formats(mut self, formats: Vec<VideoFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_availability(mut self, available: bool) -> Self {
        self.is_available = available;
        self
    }
}

/// One captured video frame with its pixel payload and metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub device_id: String,
    pub format: String,
    pub timestamp: DateTime<Utc>,
    pub size_bytes: usize,
    #[serde(skip_serializing)]
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            width,
            height,
            device_id,
            format: "RGB8".to_string(),
            timestamp: Utc::now(),
            size_bytes: data.len(),
            data,
        }
    }

    pub fn with_format(mut self, format: String) -> Self {
        self.format = format;
        self
    }

    pub fn dimensions(&self) -> VideoDimensions {
        VideoDimensions::new(self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.dimensions().aspect_ratio()
    }

    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }
}

/// Host platform, used for diagnostics and the permission probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOS,
    Linux,
    Unknown,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "linux")]
        {
            Platform::Linux
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOS => "macos",
            Platform::Linux => "linux",
            Platform::Unknown => "unknown",
        }
    }
}
