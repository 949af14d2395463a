use std::fmt;

/// Failures surfaced by the device layer. Variant names double as the
/// error names shown by the error reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    PermissionDenied(String),
    NotFound(String),
    Overconstrained(String),
    NotReadable(String),
    TrackEnded(String),
    InvalidArgument(String),
    Backend(String),
}

impl MediaError {
    /// Short name of the failure category, used when reporting.
    pub fn name(&self) -> &'static str {
        match self {
            MediaError::PermissionDenied(_) => "PermissionDenied",
            MediaError::NotFound(_) => "NotFound",
            MediaError::Overconstrained(_) => "Overconstrained",
            MediaError::NotReadable(_) => "NotReadable",
            MediaError::TrackEnded(_) => "TrackEnded",
            MediaError::InvalidArgument(_) => "InvalidArgument",
            MediaError::Backend(_) => "Backend",
        }
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MediaError::PermissionDenied(msg) => write!(f, "Camera permission denied: {}", msg),
            MediaError::NotFound(msg) => write!(f, "No matching device: {}", msg),
            MediaError::Overconstrained(msg) => write!(f, "Constraints not satisfiable: {}", msg),
            MediaError::NotReadable(msg) => write!(f, "Device not readable: {}", msg),
            MediaError::TrackEnded(msg) => write!(f, "Track ended: {}", msg),
            MediaError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            MediaError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for MediaError {}
