mod commands;

use std::path::PathBuf;

use anyhow::Result;
use chrono_tz::Tz;
use clap::Parser;
use photomap_core::config::{DEFAULT_ICON_MAX_SIZE, DEFAULT_IMAGE_MAX_SIZE};
use photomap_core::domain::ReferencePreferences;
use photomap_core::{Config, RenderMode};

/// Place photos on a map as KML placemarks
#[derive(Parser)]
#[command(name = "photomap", version, about)]
struct Cli {
    /// Directory with the photos (searched recursively)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory, must be empty or not exist
    #[arg(short, long)]
    output: PathBuf,

    /// Placemark style: photo-overlay, gx-carousel, html-balloon,
    /// html-balloon-panel or description-image
    #[arg(long, default_value = "gx-carousel", value_parser = parse_mode)]
    mode: RenderMode,

    /// JSON or YAML file with per-photo overrides (items or files array)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Sort placemarks by capture time
    #[arg(long)]
    timesort: bool,

    /// Connect the placemarks with a line
    #[arg(long)]
    path: bool,

    /// Also place photos without location (at 0,0)
    #[arg(long)]
    include_no_location: bool,

    /// Pack the output into doc.kmz
    #[arg(long)]
    kmz: bool,

    /// Embed images into the document as base64 data URIs
    #[arg(long)]
    base64: bool,

    /// Document name
    #[arg(long, default_value = "")]
    name: String,

    /// Maximum width/height of the resized images
    #[arg(long, default_value_t = DEFAULT_IMAGE_MAX_SIZE)]
    maxsize: u32,

    /// Maximum width/height of the icons
    #[arg(long, default_value_t = DEFAULT_ICON_MAX_SIZE)]
    iconsize: u32,

    /// Time zone of EXIF timestamps and of override dates without timeZone
    #[arg(long, default_value = "UTC", value_parser = parse_tz)]
    tz: Tz,

    /// Use the local image even when an external URL is given
    #[arg(long)]
    prefer_local_image: bool,

    /// Use the external URL for the icon when one is given
    #[arg(long)]
    prefer_external_icon: bool,

    /// Where to put resized images while the map is built
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::new(&self.input, &self.output);
        config.data_file = self.data;
        config.mode = self.mode;
        config.sort_by_time = self.timesort;
        config.generate_path = self.path;
        config.include_no_location = self.include_no_location;
        config.kmz = self.kmz;
        config.base64_images = self.base64;
        config.project_name = self.name;
        config.image_max_size = self.maxsize;
        config.icon_max_size = self.iconsize;
        config.references = ReferencePreferences {
            prefer_external_image: !self.prefer_local_image,
            prefer_external_icon: self.prefer_external_icon,
        };
        config.default_zone = self.tz;
        config.temp_dir = self.temp_dir;
        config
    }
}

fn parse_mode(s: &str) -> Result<RenderMode, String> {
    s.parse().map_err(|e: photomap_core::Error| e.to_string())
}

fn parse_tz(s: &str) -> Result<Tz, String> {
    photomap_core::overrides::parse_zone(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    commands::build::run(cli.into_config())
}
