use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Name of the directory holding generated thumbnails. Never indexed.
pub const THUMBNAIL_DIR: &str = ".thumbnails";

/// Prefix under which internal files are referenced from the document.
pub const FILES_DIR: &str = "files";

/// Extensions (lowercase, without dot) recognized as photos.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "jif", "jfif", "jfi", "png", "gif", "webp", "tiff", "tif", "heif",
    "heic",
];

/// Normalize a path lexically: forward slashes, no `.` segments, `..` folded
/// into the preceding segment where possible, no trailing slash.
/// An empty result becomes `"."`.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            s => segments.push(s),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join path fragments with `/` and normalize the result. Empty fragments are ignored.
pub fn join_paths(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    normalize_path(&joined)
}

/// Normalized forward-slash form of a filesystem path.
pub fn path_to_slash(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}

/// Lowercase extension of a path without the leading dot, or empty.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// True if the path has one of the recognized photo extensions.
pub fn is_image(path: &Path) -> bool {
    let ext = extension_of(&path.to_string_lossy());
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// True for the JPEG family of extensions.
pub fn is_jpeg_extension(ext: &str) -> bool {
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "jpg" | "jpeg" | "jpe" | "jif" | "jfif" | "jfi"
    )
}

/// MIME type for an image extension (without dot, any case).
pub fn image_mime_type(ext: &str) -> Result<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" | "jif" | "jfif" | "jfi" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tiff" | "tif" => "image/tiff",
        "heif" => "image/heif",
        "heic" => "image/heic",
        _ => return Err(Error::UnknownMimeType(ext.to_string())),
    };
    Ok(mime)
}

/// Create a directory and all missing parents.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Create (truncate) a file, creating parent directories as needed.
pub fn create_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    Ok(fs::File::create(path)?)
}

/// Copy a regular file, creating parent directories of the target as needed.
pub fn copy_file(source: &Path, target: &Path) -> Result<()> {
    let metadata = fs::metadata(source)?;
    if !metadata.is_file() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", source.display()),
        )));
    }

    if let Some(parent) = target.parent() {
        create_dir(parent)?;
    }
    fs::copy(source, target)?;
    Ok(())
}

/// True if the directory does not exist or has no entries.
pub fn is_empty_or_missing(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}
