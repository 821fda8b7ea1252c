use std::path::Path;

use walkdir::WalkDir;

use crate::config::Config;
use crate::domain::ImageAsset;
use crate::error::{Error, Result};
use crate::exif::extract_metadata;
use crate::overrides::{apply_override, OverrideSet, KEY_EXTERNAL};
use crate::paths::{is_image, path_to_slash, THUMBNAIL_DIR};

/// Recursively list photo files under `root`, as normalized paths relative to it.
///
/// Entries are visited depth-first in file-name order, so the result is stable
/// across runs. `.thumbnails` directories are not descended into. Unreadable
/// entries are logged and skipped.
pub fn scan_directory(root: &Path) -> Result<Vec<String>> {
    if !root.exists() {
        return Err(Error::InputNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::InputNotDirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() > 0 && e.file_type().is_dir() && e.file_name() == THUMBNAIL_DIR)
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("{}", Error::WalkDir(e));
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(path_to_slash(relative));
        }
    }

    Ok(files)
}

/// Build an asset for a local photo: EXIF first, then the first matching override on top.
pub fn build_internal_asset(
    root: &Path,
    relative_path: &str,
    overrides: &OverrideSet,
    config: &Config,
) -> ImageAsset {
    let mut asset = ImageAsset::internal(root, relative_path);

    let meta = extract_metadata(&root.join(&asset.source_relative_path), config.default_zone);
    asset.timestamp = meta.timestamp;
    if let Some((lat, lon)) = meta.location {
        asset.latitude = lat;
        asset.longitude = lon;
        asset.has_latitude = true;
        asset.has_longitude = true;
    }
    if let Some((w, h)) = meta.dimensions {
        asset.pixel_width = w;
        asset.pixel_height = h;
    }
    asset.embedded_thumbnail = meta.thumbnail;

    match overrides.find_for(&asset.source_relative_path) {
        Some(record) => apply_override(asset, record, config.default_zone),
        None => asset,
    }
}

/// Index every photo under `root`, append the data file's external-only images,
/// and resolve the document references of all of them.
pub fn index_images(root: &Path, overrides: &OverrideSet, config: &Config) -> Result<Vec<ImageAsset>> {
    let files = scan_directory(root)?;
    log::info!("Found {} images in {}", files.len(), root.display());

    let internal = files
        .iter()
        .map(|relative| build_internal_asset(root, relative, overrides, config));

    let external = overrides.external_only().filter_map(|record| {
        match record.get_str(KEY_EXTERNAL) {
            Some(url) if !url.trim().is_empty() => {
                Some(apply_override(ImageAsset::external(), record, config.default_zone))
            }
            _ => {
                log::warn!("data file record has neither a file nor an external URL, skipped");
                None
            }
        }
    });

    let assets = internal
        .chain(external)
        .map(|asset| asset.resolve_references(config.references))
        .collect();

    Ok(assets)
}
