use std::path::{Path, PathBuf};

use chrono::DateTime;
use chrono_tz::Tz;

use crate::paths::{join_paths, FILES_DIR, THUMBNAIL_DIR};

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// KML `lon,lat,alt` form.
    pub fn to_kml(&self) -> String {
        format!("{},{},0", self.longitude, self.latitude)
    }
}

/// Which reference wins for each slot when both a local file and an external URL exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePreferences {
    pub prefer_external_image: bool,
    pub prefer_external_icon: bool,
}

impl Default for ReferencePreferences {
    fn default() -> Self {
        Self {
            prefer_external_image: true,
            prefer_external_icon: false,
        }
    }
}

/// One photo on its way to becoming a placemark.
#[derive(Debug, Clone, Default)]
pub struct ImageAsset {
    /// Path relative to `root_directory`, normalized. Empty for pure external images.
    pub source_relative_path: String,
    /// Directory `source_relative_path` and `icon_relative_path` are relative to.
    pub root_directory: PathBuf,
    /// Thumbnail path relative to `root_directory`. Empty for pure external images.
    pub icon_relative_path: String,

    pub external_image_url: String,
    pub external_icon_url: String,

    pub is_image_internal: bool,
    pub is_icon_internal: bool,

    /// Final string written into the document for the image.
    pub resolved_image_path: String,
    /// Final string written into the document for the icon.
    pub resolved_icon_path: String,

    pub timestamp: Option<DateTime<Tz>>,

    pub latitude: f64,
    pub longitude: f64,
    pub has_latitude: bool,
    pub has_longitude: bool,

    pub pixel_width: u32,
    pub pixel_height: u32,

    /// Raw thumbnail bytes embedded in the EXIF block, if any.
    pub embedded_thumbnail: Option<Vec<u8>>,

    pub display_name: String,
    pub display_description: String,
}

impl ImageAsset {
    /// An asset backed by a local file. The icon points at the thumbnail preparation will produce.
    pub fn internal(root_directory: &Path, relative_path: &str) -> Self {
        let source_relative_path = join_paths(&[relative_path]);
        let icon_relative_path = format!("{}.png", join_paths(&[THUMBNAIL_DIR, &source_relative_path]));
        Self {
            source_relative_path,
            root_directory: root_directory.to_path_buf(),
            icon_relative_path,
            ..Default::default()
        }
    }

    /// An asset with no local file at all.
    pub fn external() -> Self {
        Self::default()
    }

    pub fn is_pure_external(&self) -> bool {
        self.source_relative_path.is_empty()
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp.is_some()
    }

    /// Both axes came from a real source (EXIF GPS or a numeric override).
    pub fn has_location(&self) -> bool {
        self.has_latitude && self.has_longitude
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Human-readable identifier for log messages.
    pub fn label(&self) -> &str {
        if self.is_pure_external() {
            &self.external_image_url
        } else {
            &self.source_relative_path
        }
    }

    /// Width over height with zero dimensions treated as 1.
    pub fn aspect_ratio(&self) -> f64 {
        let w = self.pixel_width.max(1);
        let h = self.pixel_height.max(1);
        f64::from(w) / f64::from(h)
    }

    /// Decide internal/external for each slot and compute the document paths.
    ///
    /// A preference for the external reference only wins when an external value
    /// exists; otherwise a local path is used when present. With neither, the
    /// slot resolves to an empty string and is treated as external.
    pub fn resolve_references(mut self, prefs: ReferencePreferences) -> Self {
        let (image_path, image_internal) = resolve_slot(
            &self.source_relative_path,
            &self.external_image_url,
            prefs.prefer_external_image,
        );
        self.resolved_image_path = image_path;
        self.is_image_internal = image_internal;

        let (icon_path, icon_internal) = resolve_slot(
            &self.icon_relative_path,
            &self.external_icon_url,
            prefs.prefer_external_icon,
        );
        self.resolved_icon_path = icon_path;
        self.is_icon_internal = icon_internal;

        self
    }
}

fn resolve_slot(local: &str, external: &str, prefer_external: bool) -> (String, bool) {
    if (prefer_external && !external.is_empty()) || local.is_empty() {
        (external.to_string(), false)
    } else {
        (join_paths(&[FILES_DIR, local]), true)
    }
}
