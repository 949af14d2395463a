//! Configuration management for resolens
//!
//! Provides loading and saving of capture defaults, synthetic-device
//! characteristics, and demo-loop settings.

use crate::errors::MediaError;
use crate::session::SessionOptions;
use crate::source::{SyntheticProfile, AUTO_DEVICE_ID};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolensConfig {
    pub capture: CaptureSettings,
    pub synthetic: SyntheticSettings,
    pub demo: DemoSettings,
}

/// Capture defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Device to open: a native device id, "synthetic-…", or "auto"
    pub device_id: String,
    /// Preset requested when none is given on the command line
    pub default_preset: String,
}

/// Synthetic device characteristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticSettings {
    pub label: String,
    /// Largest frame the synthetic device will grant
    pub native_width: u32,
    pub native_height: u32,
}

/// Demo loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoSettings {
    /// Milliseconds between resize polls / width steps
    pub tick_interval_ms: u64,
    /// Pixels subtracted from the width per demo step
    pub width_step: u32,
}

impl Default for ResolensConfig {
    fn default() -> Self {
        Self {
            capture: CaptureSettings {
                device_id: AUTO_DEVICE_ID.to_string(),
                default_preset: "hd".to_string(),
            },
            synthetic: SyntheticSettings {
                label: "Synthetic Camera".to_string(),
                native_width: 3840,
                native_height: 2160,
            },
            demo: DemoSettings {
                tick_interval_ms: 500,
                width_step: 160,
            },
        }
    }
}

impl ResolensConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, MediaError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| MediaError::Backend(format!("Failed to read config file: {}", e)))?;

        let config: ResolensConfig = toml::from_str(&contents)
            .map_err(|e| MediaError::InvalidArgument(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MediaError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    MediaError::Backend(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| MediaError::Backend(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents)
            .map_err(|e| MediaError::Backend(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config location, next to the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("resolens.toml")
    }

    /// Load from the default location, falling back to defaults on any
    /// problem (a malformed file is logged, not fatal).
    pub fn load_or_default() -> Self {
        match Self::load_from_file(Self::default_path()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Falling back to default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Session options described by this configuration.
    pub fn session_options(&self) -> SessionOptions {
        let synthetic = SyntheticProfile {
            label: self.synthetic.label.clone(),
            ..SyntheticProfile::default()
        }
        .with_native(self.synthetic.native_width, self.synthetic.native_height);

        SessionOptions {
            device_id: self.capture.device_id.clone(),
            synthetic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = ResolensConfig::default();
        assert_eq!(config.capture.device_id, AUTO_DEVICE_ID);
        assert_eq!(config.capture.default_preset, "hd");
        assert_eq!(config.synthetic.native_width, 3840);
        assert!(config.demo.tick_interval_ms > 0);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = ResolensConfig::load_from_file("definitely/not/here.toml").unwrap();
        assert_eq!(config.capture.device_id, AUTO_DEVICE_ID);
    }

    #[test]
    fn session_options_carry_the_synthetic_ceiling() {
        let mut config = ResolensConfig::default();
        config.synthetic.native_width = 7680;
        config.synthetic.native_height = 4320;

        let options = config.session_options();
        assert_eq!(options.synthetic.native.width, 7680);
        assert_eq!(options.synthetic.native.height, 4320);
    }
}
