use std::io::{BufWriter, Write};
use std::path::Path;

use fast_image_resize::{self as fir, images::Image as FirImage};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};

use crate::config::Config;
use crate::domain::ImageAsset;
use crate::error::{Error, Result};
use crate::exif::read_orientation;
use crate::paths::{copy_file, create_dir, create_file, extension_of, is_jpeg_extension, join_paths, THUMBNAIL_DIR};

pub const JPEG_QUALITY: u8 = 75;

/// Produce resized images and thumbnails for every asset with an internal slot.
///
/// Outputs land in `scratch`, which becomes the assets' root directory.
/// Failures never abort the run: the original file is copied instead of the
/// resized one, and the icon falls back to the embedded EXIF thumbnail or to
/// the image itself. `on_prepared` is called once per asset, in order.
pub fn prepare_assets(
    assets: Vec<ImageAsset>,
    scratch: &Path,
    config: &Config,
    mut on_prepared: impl FnMut(&ImageAsset),
) -> Vec<ImageAsset> {
    assets
        .into_iter()
        .map(|asset| {
            let prepared = prepare_asset(asset, scratch, config);
            on_prepared(&prepared);
            prepared
        })
        .collect()
}

pub fn prepare_asset(mut asset: ImageAsset, scratch: &Path, config: &Config) -> ImageAsset {
    if !asset.is_image_internal && !asset.is_icon_internal {
        return asset;
    }

    let source = asset.root_directory.join(&asset.source_relative_path);
    let orientation = read_orientation(&source);
    match decode(&source).map(|img| apply_orientation(img, orientation)) {
        Ok(img) => {
            // EXIF dimensions describe the stored pixels, before any quarter turn.
            let turned = (5..=8).contains(&orientation);
            if turned || (asset.pixel_width == 0 && asset.pixel_height == 0) {
                asset.pixel_width = img.width();
                asset.pixel_height = img.height();
            }

            if asset.is_image_internal {
                let target = scratch.join(&asset.source_relative_path);
                if let Err(e) = resize_to_fit(&img, config.image_max_size, &source)
                    .and_then(|resized| save_image(&resized, &target))
                {
                    log::warn!("{}: {}", asset.source_relative_path, e);
                    copy_original(&asset, &source, scratch);
                }
            }

            if asset.is_icon_internal {
                let target = scratch.join(&asset.icon_relative_path);
                if let Err(e) = resize_to_fit(&img, config.icon_max_size, &source)
                    .and_then(|thumbnail| save_image(&thumbnail, &target))
                {
                    log::warn!("{}: thumbnail failed: {}", asset.source_relative_path, e);
                    asset.icon_relative_path = fallback_icon(&asset, &source, scratch);
                }
            }
        }
        Err(e) => {
            log::warn!("{}: {}", asset.source_relative_path, e);
            if asset.is_image_internal {
                copy_original(&asset, &source, scratch);
            }
            if asset.is_icon_internal {
                asset.icon_relative_path = fallback_icon(&asset, &source, scratch);
            }
        }
    }

    asset.root_directory = scratch.to_path_buf();
    asset.resolve_references(config.references)
}

/// Decode an image, format sniffed from content.
fn decode(path: &Path) -> Result<DynamicImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Apply EXIF orientation to a decoded image.
///
/// Orientations:
/// 1: Normal                    5: Mirror + rotate 90° CW
/// 2: Mirror horizontal         6: Rotate 90° CW
/// 3: Rotate 180°               7: Mirror + rotate 90° CCW
/// 4: Mirror vertical           8: Rotate 90° CCW
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Largest size fitting into a `max`×`max` box with the same aspect ratio. Never upscales.
pub fn fit_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = (f64::from(max) / f64::from(width)).min(f64::from(max) / f64::from(height));
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w, h)
}

/// Lanczos3 downscale into a `max`×`max` box, as RGB or RGBA if the source has alpha.
fn resize_to_fit(img: &DynamicImage, max: u32, source: &Path) -> Result<DynamicImage> {
    let (w, h) = (img.width(), img.height());
    let (new_w, new_h) = fit_dimensions(w, h, max);
    let alpha = img.color().has_alpha();
    if (new_w, new_h) == (w, h) {
        return Ok(if alpha {
            DynamicImage::ImageRgba8(img.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(img.to_rgb8())
        });
    }

    let failed = |message: String| Error::ResizeFailed {
        path: source.to_path_buf(),
        message,
    };

    let (pixels, pixel_type) = if alpha {
        (img.to_rgba8().into_raw(), fir::PixelType::U8x4)
    } else {
        (img.to_rgb8().into_raw(), fir::PixelType::U8x3)
    };
    let src = FirImage::from_vec_u8(w, h, pixels, pixel_type).map_err(|e| failed(e.to_string()))?;
    let mut dst = FirImage::new(new_w, new_h, pixel_type);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    fir::Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| failed(e.to_string()))?;

    let buffer = dst.buffer().to_vec();
    let resized = if alpha {
        image::RgbaImage::from_raw(new_w, new_h, buffer).map(DynamicImage::ImageRgba8)
    } else {
        image::RgbImage::from_raw(new_w, new_h, buffer).map(DynamicImage::ImageRgb8)
    };
    resized.ok_or_else(|| failed("resized buffer has unexpected size".to_string()))
}

/// Encode by target extension; the JPEG family is written at quality 75.
fn save_image(img: &DynamicImage, target: &Path) -> Result<()> {
    let ext = extension_of(&target.to_string_lossy());
    if is_jpeg_extension(&ext) {
        let file = create_file(target)?;
        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        writer.flush()?;
    } else {
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }
        img.save(target)?;
    }
    Ok(())
}

/// Put the untouched original into the scratch area.
fn copy_original(asset: &ImageAsset, source: &Path, scratch: &Path) {
    let target = scratch.join(&asset.source_relative_path);
    if target.exists() {
        return;
    }
    if let Err(e) = copy_file(source, &target) {
        log::warn!("{}: cannot copy original: {}", asset.source_relative_path, e);
    }
}

/// Icon path to use when no thumbnail could be rendered: the embedded EXIF
/// thumbnail if there is one, otherwise the image itself.
fn fallback_icon(asset: &ImageAsset, source: &Path, scratch: &Path) -> String {
    if let Some(ref bytes) = asset.embedded_thumbnail {
        let relative = embedded_thumbnail_path(&asset.source_relative_path);
        let written = create_file(&scratch.join(&relative))
            .and_then(|mut file| file.write_all(bytes).map_err(Error::from));
        match written {
            Ok(()) => return relative,
            Err(e) => log::warn!("{}: cannot write embedded thumbnail: {}", asset.source_relative_path, e),
        }
    }

    copy_original(asset, source, scratch);
    asset.source_relative_path.clone()
}

/// `.thumbnails/<path>` for JPEG sources, `.thumbnails/<path>.jpg` otherwise
/// (embedded EXIF thumbnails are always JPEG).
pub fn embedded_thumbnail_path(relative: &str) -> String {
    let path = join_paths(&[THUMBNAIL_DIR, relative]);
    if is_jpeg_extension(&extension_of(relative)) {
        path
    } else {
        format!("{path}.jpg")
    }
}
