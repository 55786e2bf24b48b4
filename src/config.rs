use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for gif-forge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hard resource limits per session
    pub quotas: QuotaConfig,

    /// Rendering settings
    pub render: RenderConfig,

    /// Preview settings
    pub preview: PreviewConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.quotas.validate()?;
        self.render.validate()?;
        self.preview.validate()?;
        Ok(())
    }
}

/// Resource quotas. All sizes are in bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Largest single uploaded image
    pub max_upload_size: u64,

    /// Everything a session may keep on disk, uploads and outputs together
    pub max_total_storage: u64,

    /// Source frames per project
    pub max_frames: usize,

    /// Largest encoded animation
    pub max_output_size: u64,

    /// Largest width or height, for the canvas and for source images
    pub max_dimension: u32,

    /// Safety bound on decoded pixel memory held during one render
    pub max_decoded_bytes: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 10 * 1024 * 1024,
            max_total_storage: 50 * 1024 * 1024,
            max_frames: 200,
            max_output_size: 20 * 1024 * 1024,
            max_dimension: 2000,
            max_decoded_bytes: 512 * 1024 * 1024,
        }
    }
}

impl QuotaConfig {
    fn validate(&self) -> Result<()> {
        let zero = [
            ("quotas.max_upload_size", self.max_upload_size == 0),
            ("quotas.max_total_storage", self.max_total_storage == 0),
            ("quotas.max_frames", self.max_frames == 0),
            ("quotas.max_output_size", self.max_output_size == 0),
            ("quotas.max_dimension", self.max_dimension == 0),
            ("quotas.max_decoded_bytes", self.max_decoded_bytes == 0),
        ];

        if let Some((key, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: "0".to_string()
            }.into());
        }

        Ok(())
    }
}

/// Resampling filter used when fitting source images to the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    pub fn to_filter_type(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;

        match self {
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Number of parallel compositing threads
    pub worker_threads: usize,

    /// Plan steps rendered between two output-size checks
    pub quota_check_interval: usize,

    /// Filter used to resize source images
    pub resample_filter: ResampleFilter,

    /// NeuQuant sampling speed for the GIF palette (1 = best, 30 = fastest)
    pub gif_speed: i32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            quota_check_interval: 16,
            resample_filter: ResampleFilter::Lanczos3,
            gif_speed: 10,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.worker_threads".to_string(),
                value: self.worker_threads.to_string()
            }.into());
        }

        if self.quota_check_interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.quota_check_interval".to_string(),
                value: self.quota_check_interval.to_string()
            }.into());
        }

        if !(1..=30).contains(&self.gif_speed) {
            return Err(ConfigError::InvalidValue {
                key: "render.gif_speed".to_string(),
                value: self.gif_speed.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Preview configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Default `--max-frames` for command-line previews. The pipeline itself renders the
    /// whole plan when no limit is passed.
    pub max_frames: Option<usize>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { max_frames: Some(10) }
    }
}

impl PreviewConfig {
    fn validate(&self) -> Result<()> {
        if self.max_frames == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "preview.max_frames".to_string(),
                value: "0".to_string()
            }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.quotas.max_frames = 42;
        original_config.render.resample_filter = ResampleFilter::CatmullRom;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.quotas.max_frames, 42);
        assert_eq!(loaded_config.render.resample_filter, ResampleFilter::CatmullRom);
        assert_eq!(loaded_config.preview.max_frames, Some(10));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[quotas]\nmax_dimension = 512\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.quotas.max_dimension, 512);
        assert_eq!(config.quotas.max_frames, 200);
        assert_eq!(config.render.gif_speed, 10);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(dir.path().join("nope.toml"));
        assert!(matches!(
            result,
            Err(crate::ForgeError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_gif_speed() {
        let mut config = Config::default();
        config.render.gif_speed = 31;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_quota_rejected() {
        let mut config = Config::default();
        config.quotas.max_output_size = 0;
        assert!(config.validate().is_err());
    }
}
