use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("input directory does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("input path is not a directory: {}", .0.display())]
    InputNotDirectory(PathBuf),

    #[error("output directory must be empty or not exist: {}", .0.display())]
    OutputNotEmpty(PathBuf),

    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("unsupported data file format (expected .json, .yaml or .yml): {}", .0.display())]
    UnsupportedOverrideFormat(PathBuf),

    #[error("cannot find key 'items' (or 'files') in the data file: {}", .0.display())]
    OverrideKeyMissing(PathBuf),

    #[error("failed to resize {}: {message}", .path.display())]
    ResizeFailed { path: PathBuf, message: String },

    #[error("found no MIME type for: .{0}")]
    UnknownMimeType(String),

    #[error("value of '{key}' is not numeric: {value}")]
    NonNumericValue { key: String, value: String },

    #[error("invalid date-time '{0}' (expected YYYY:MM:DD HH:MM:SS)")]
    InvalidDateTime(String),
}

pub type Result<T> = std::result::Result<T, Error>;
