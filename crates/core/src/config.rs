use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::domain::ReferencePreferences;
use crate::render::RenderMode;

pub const DEFAULT_IMAGE_MAX_SIZE: u32 = 1600;
pub const DEFAULT_ICON_MAX_SIZE: u32 = 64;

/// Everything a pipeline run needs to know, fixed before processing begins.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// JSON or YAML file with per-image overrides.
    pub data_file: Option<PathBuf>,
    pub mode: RenderMode,
    pub sort_by_time: bool,
    pub generate_path: bool,
    /// Emit placemarks for images without location (placed at 0, 0).
    pub include_no_location: bool,
    pub kmz: bool,
    pub base64_images: bool,
    pub project_name: String,
    /// Internal images are resized to fit into a box of this size.
    pub image_max_size: u32,
    pub icon_max_size: u32,
    pub references: ReferencePreferences,
    /// Zone for EXIF timestamps and for override date-times without `timeZone`.
    pub default_zone: Tz,
    /// Parent of the scratch directory; the system temp dir if unset.
    pub temp_dir: Option<PathBuf>,
}

impl Config {
    pub fn new(input_dir: &Path, output_dir: &Path) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            data_file: None,
            mode: RenderMode::default(),
            sort_by_time: false,
            generate_path: false,
            include_no_location: false,
            kmz: false,
            base64_images: false,
            project_name: String::new(),
            image_max_size: DEFAULT_IMAGE_MAX_SIZE,
            icon_max_size: DEFAULT_ICON_MAX_SIZE,
            references: ReferencePreferences::default(),
            default_zone: Tz::UTC,
            temp_dir: None,
        }
    }
}
