pub mod archive;
pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod exif;
pub mod kml;
pub mod ordering;
pub mod overrides;
pub mod paths;
pub mod prepare;
pub mod render;
pub mod scanner;

pub use config::Config;
pub use document::AssemblyReport;
pub use error::{Error, Result};
pub use render::RenderMode;

use overrides::OverrideSet;

/// Callback events reported while a map is being built.
pub enum Progress {
    /// Indexing finished.
    Indexed { total: usize, located: usize },
    /// Starting to resize images and render thumbnails.
    PrepareStart { total: usize },
    /// One asset has been prepared.
    Prepared { label: String },
    /// Document and optional archive written.
    Complete { placemarks: usize, skipped: usize },
}

/// The main entry point: turns a photo directory into a KML document.
pub struct PhotoMap {
    config: Config,
    overrides: OverrideSet,
}

impl PhotoMap {
    /// Validate the output directory and load the override file, if any.
    pub fn new(config: Config) -> Result<Self> {
        if !paths::is_empty_or_missing(&config.output_dir)? {
            return Err(Error::OutputNotEmpty(config.output_dir.clone()));
        }

        let overrides = match config.data_file {
            Some(ref path) => {
                let set = OverrideSet::load(path)?;
                log::info!("Loaded {} override records from {}", set.records().len(), path.display());
                set
            }
            None => OverrideSet::default(),
        };

        Ok(Self { config, overrides })
    }

    /// Index, prepare, order and render every photo, then write the output.
    /// Calls `progress_cb` with progress updates if provided.
    ///
    /// Resized images live in a temporary directory removed before returning.
    pub fn run(&self, mut progress_cb: Option<&mut dyn FnMut(Progress)>) -> Result<AssemblyReport> {
        let config = &self.config;

        let assets = scanner::index_images(&config.input_dir, &self.overrides, config)?;
        if let Some(ref mut cb) = progress_cb {
            cb(Progress::Indexed {
                total: assets.len(),
                located: assets.iter().filter(|a| a.has_location()).count(),
            });
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("photomap-");
        let scratch = match config.temp_dir {
            Some(ref parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        log::debug!("Preparing images in {}", scratch.path().display());

        if let Some(ref mut cb) = progress_cb {
            cb(Progress::PrepareStart { total: assets.len() });
        }
        let assets = prepare::prepare_assets(assets, scratch.path(), config, |asset| {
            if let Some(ref mut cb) = progress_cb {
                cb(Progress::Prepared {
                    label: asset.label().to_string(),
                });
            }
        });

        let assets = if config.sort_by_time {
            ordering::sort_by_time(assets)
        } else {
            assets
        };

        let report = document::assemble(assets, config)?;

        if let Some(ref mut cb) = progress_cb {
            cb(Progress::Complete {
                placemarks: report.placemarks,
                skipped: report.skipped,
            });
        }

        Ok(report)
    }
}
