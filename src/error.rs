use thiserror::Error;

/// Main error type for the gif-forge library
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(#[from] QuotaError),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Malformed projects and settings, rejected before any decoding
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Project must have at least one frame")]
    NoFrames,

    #[error("Frame {frame} has invalid duration: {duration}")]
    InvalidDuration { frame: String, duration: i64 },

    #[error("Scale must be between 10 and 100 percent, got {scale}")]
    InvalidScale { scale: u32 },

    #[error("Invalid canvas {axis}: {value}")]
    InvalidDimension { axis: String, value: u32 },

    #[error("Invalid project data: {details}")]
    Malformed { details: String },

    #[error("Buffer size mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    SizeMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },

    #[error("{}", .problems.join(", "))]
    Settings { problems: Vec<String> },
}

/// Source images that cannot be read
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Frame {frame}: unsupported image format ({format})")]
    UnsupportedFormat { frame: String, format: String },

    #[error("Frame {frame}: corrupt image data - {reason}")]
    Corrupt { frame: String, reason: String },
}

/// Resource limits, enforced before and during rendering
#[derive(Error, Debug)]
pub enum QuotaError {
    #[error("frame count {count} exceeds maximum {max}")]
    TooManyFrames { count: usize, max: usize },

    #[error("dimensions {width}x{height} exceed maximum {max}")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },

    #[error("projected decoded memory {bytes} bytes exceeds safety bound {max}")]
    DecodedMemory { bytes: u64, max: u64 },

    #[error("session storage {used} + {requested} bytes would exceed {max}")]
    StorageExceeded { used: u64, requested: u64, max: u64 },

    #[error("output size {bytes} bytes exceeds maximum {max}")]
    OutputTooLarge { bytes: u64, max: u64 },

    #[error("upload size {bytes} bytes exceeds maximum {max}")]
    UploadTooLarge { bytes: u64, max: u64 },
}

/// Container encoding failures
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("No frames to encode")]
    NoFrames,

    #[error("Canvas {width}x{height} does not fit the container")]
    CanvasTooLarge { width: u32, height: u32 },

    #[error("Frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    InconsistentFrame {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("Frame {index} does not match the requested colour model (transparent: {transparent})")]
    ColorModelMismatch { index: usize, transparent: bool },

    #[error("Encoder failed: {reason}")]
    Failed { reason: String },
}

/// Storage collaborator failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Image not found: {image_ref}")]
    NotFound { image_ref: String },

    #[error("Unsafe image reference: {image_ref}")]
    UnsafePath { image_ref: String },

    #[error("Failed to read {image_ref}: {reason}")]
    ReadFailed { image_ref: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ForgeError
pub type Result<T> = std::result::Result<T, ForgeError>;

impl ForgeError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if the caller may reasonably retry the same request
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Storage(StorageError::ReadFailed { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Decode(DecodeError::UnsupportedFormat { frame, .. }) => {
                format!("Frame '{}' is not a supported image. Use PNG, JPEG, GIF or WebP.", frame)
            }
            Self::Decode(DecodeError::Corrupt { frame, .. }) => {
                format!("Frame '{}' could not be read. The file may be damaged.", frame)
            }
            Self::Storage(StorageError::NotFound { image_ref }) => {
                format!("Image '{}' was not found. Upload it again and retry.", image_ref)
            }
            Self::QuotaExceeded(QuotaError::OutputTooLarge { max, .. }) => {
                format!("The animation would be larger than {:.1} MB. Reduce frames, steps or scale.",
                        *max as f64 / 1024.0 / 1024.0)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_problems_are_joined() {
        let err: ForgeError = ValidationError::Settings {
            problems: vec!["Width exceeds maximum: 2000".into(), "Frame a has invalid duration: 0".into()],
        }.into();
        assert_eq!(
            err.to_string(),
            "Validation error: Width exceeds maximum: 2000, Frame a has invalid duration: 0"
        );
    }

    #[test]
    fn test_decode_error_names_frame() {
        let err: ForgeError = DecodeError::UnsupportedFormat {
            frame: "cat.bmp".into(),
            format: "Bmp".into(),
        }.into();
        assert!(err.to_string().contains("cat.bmp"));
        assert!(err.user_message().contains("cat.bmp"));
    }

    #[test]
    fn test_quota_errors_are_not_recoverable() {
        let err: ForgeError = QuotaError::TooManyFrames { count: 201, max: 200 }.into();
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Quota exceeded: frame count 201 exceeds maximum 200");
    }
}
