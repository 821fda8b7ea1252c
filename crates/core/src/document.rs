use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};

use crate::archive::zip_folder_contents;
use crate::config::Config;
use crate::domain::ImageAsset;
use crate::error::Result;
use crate::kml::Element;
use crate::ordering::build_path;
use crate::paths::{copy_file, create_dir, extension_of, image_mime_type};
use crate::render::path_placemark;

pub const DOC_FILE: &str = "doc.kml";
pub const ARCHIVE_FILE: &str = "doc.kmz";

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
pub const GX_NAMESPACE: &str = "http://www.google.com/kml/ext/2.2";
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    pub document: PathBuf,
    pub placemarks: usize,
    /// Assets left out for lacking a location.
    pub skipped: usize,
    /// Points in the path line, 0 when none was emitted.
    pub path_points: usize,
    pub archive: Option<PathBuf>,
}

/// `<kml>` root with the namespaces viewers expect.
pub fn kml_root() -> Element {
    Element::new("kml")
        .attr("xmlns", KML_NAMESPACE)
        .attr("xmlns:gx", GX_NAMESPACE)
        .attr("xmlns:kml", KML_NAMESPACE)
        .attr("xmlns:atom", ATOM_NAMESPACE)
}

/// Render the assets in their current order into `output/doc.kml`.
///
/// Internal files referenced by emitted placemarks are copied to
/// `output/files/` or inlined as data URIs. With `kmz` the output directory
/// is packed into `output/doc.kmz` afterwards.
pub fn assemble(assets: Vec<ImageAsset>, config: &Config) -> Result<AssemblyReport> {
    create_dir(&config.output_dir)?;

    let mut document = Element::new("Document");
    if !config.project_name.is_empty() {
        document = document.text_child("name", &config.project_name);
    }

    let mut path_points = 0;
    if config.generate_path {
        let points = build_path(&assets, config.include_no_location);
        if points.len() >= 2 {
            path_points = points.len();
            document.push(path_placemark(&points));
        } else {
            log::info!("Not enough located images for a path ({})", points.len());
        }
    }

    let mut placemarks = 0;
    let mut skipped = 0;
    for (index, asset) in assets.into_iter().enumerate() {
        if !asset.has_location() {
            if config.include_no_location {
                log::warn!("{}: no location, placing at 0,0", asset.label());
            } else {
                log::warn!("{}: no location, skipping", asset.label());
                skipped += 1;
                continue;
            }
        }

        let asset = describe(publish(asset, config), index + 1);
        document.push(config.mode.render(&asset));
        placemarks += 1;
    }

    let doc_path = config.output_dir.join(DOC_FILE);
    fs::write(&doc_path, kml_root().child(document).to_document()?)?;
    log::info!("Wrote {} placemarks to {}", placemarks, doc_path.display());

    let archive = if config.kmz {
        let archive = config.output_dir.join(ARCHIVE_FILE);
        zip_folder_contents(&config.output_dir, &archive)?;
        log::info!("Packed {}", archive.display());
        Some(archive)
    } else {
        None
    };

    Ok(AssemblyReport {
        document: doc_path,
        placemarks,
        skipped,
        path_points,
        archive,
    })
}

/// Set the display name (1-based position) and the timestamp description.
pub fn describe(mut asset: ImageAsset, position: usize) -> ImageAsset {
    asset.display_name = position.to_string();
    let mut description = match asset.timestamp {
        Some(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        None => "unknown time".to_string(),
    };
    if !asset.has_location() {
        description.push_str(" (no location)");
    }
    asset.display_description = description;
    asset
}

/// Make the internal slots reachable from the document.
fn publish(mut asset: ImageAsset, config: &Config) -> ImageAsset {
    if asset.is_image_internal {
        asset.resolved_image_path = publish_slot(
            &asset.root_directory,
            &asset.source_relative_path,
            &asset.resolved_image_path,
            config,
        );
    }
    if asset.is_icon_internal {
        asset.resolved_icon_path = publish_slot(
            &asset.root_directory,
            &asset.icon_relative_path,
            &asset.resolved_icon_path,
            config,
        );
    }
    asset
}

fn publish_slot(root: &Path, relative: &str, resolved: &str, config: &Config) -> String {
    let source = root.join(relative);

    if config.base64_images {
        match data_uri(&source) {
            Ok(uri) => return uri,
            Err(e) => log::warn!("{}: cannot embed, copying instead: {}", relative, e),
        }
    }

    if let Err(e) = copy_file(&source, &config.output_dir.join(resolved)) {
        log::warn!("{}: {}", relative, e);
    }
    resolved.to_string()
}

/// `data:<mime>;base64,<content>` for an image file.
pub fn data_uri(path: &Path) -> Result<String> {
    let mime = image_mime_type(&extension_of(&path.to_string_lossy()))?;
    let bytes = fs::read(path)?;
    Ok(format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferencePreferences;
    use crate::error::Error;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn located(root: &Path, relative: &str, lat: f64, lon: f64) -> ImageAsset {
        let mut asset = ImageAsset::internal(root, relative);
        asset.latitude = lat;
        asset.longitude = lon;
        asset.has_latitude = true;
        asset.has_longitude = true;
        asset.resolve_references(ReferencePreferences::default())
    }

    fn write_files(root: &Path, relative: &str) {
        let image = root.join(relative);
        fs::create_dir_all(image.parent().unwrap()).unwrap();
        fs::write(&image, b"image-bytes").unwrap();
        let icon = root.join(format!(".thumbnails/{relative}.png"));
        fs::create_dir_all(icon.parent().unwrap()).unwrap();
        fs::write(&icon, b"icon-bytes").unwrap();
    }

    // ── describe ────────────────────────────────────────────────

    #[test]
    fn test_describe_with_timestamp() {
        let mut asset = located(Path::new("/r"), "a.jpg", 1.0, 1.0);
        asset.timestamp = Tz::Europe__Prague.with_ymd_and_hms(2020, 7, 1, 12, 30, 0).single();
        let asset = describe(asset, 3);
        assert_eq!(asset.display_name, "3");
        assert_eq!(asset.display_description, "2020-07-01 12:30:00 CEST");
    }

    #[test]
    fn test_describe_unknown_time_no_location() {
        let asset = describe(ImageAsset::internal(Path::new("/r"), "a.jpg"), 1);
        assert_eq!(asset.display_description, "unknown time (no location)");
    }

    // ── data_uri ────────────────────────────────────────────────

    #[test]
    fn test_data_uri() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("x.JPG");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(data_uri(&path).unwrap(), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_data_uri_unknown_mime() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("x.webp");
        fs::write(&path, b"abc").unwrap();
        assert!(matches!(data_uri(&path), Err(Error::UnknownMimeType(_))));
    }

    // ── assemble ────────────────────────────────────────────────

    #[test]
    fn test_assemble_copies_files_and_writes_document() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_files(src.path(), "trip/a.jpg");

        let mut config = Config::new(src.path(), out.path());
        config.project_name = "Trip".into();
        let report = assemble(vec![located(src.path(), "trip/a.jpg", 49.2, 16.6)], &config).unwrap();

        assert_eq!(report.placemarks, 1);
        assert_eq!(report.skipped, 0);
        assert!(report.archive.is_none());
        assert_eq!(fs::read(out.path().join("files/trip/a.jpg")).unwrap(), b"image-bytes");
        assert_eq!(
            fs::read(out.path().join("files/.thumbnails/trip/a.jpg.png")).unwrap(),
            b"icon-bytes"
        );

        let doc = fs::read_to_string(out.path().join(DOC_FILE)).unwrap();
        assert!(doc.starts_with("<?xml"));
        assert!(doc.contains(r#"xmlns:gx="http://www.google.com/kml/ext/2.2""#));
        assert!(doc.contains("<name>Trip</name>"));
        assert!(doc.contains("<gx:ImageUrl>files/trip/a.jpg</gx:ImageUrl>"));
        assert!(doc.contains("<coordinates>16.6,49.2,0</coordinates>"));
    }

    #[test]
    fn test_assemble_skips_unlocated_unless_requested() {
        let src = tempfile::tempdir().unwrap();
        write_files(src.path(), "u.jpg");
        let unlocated = ImageAsset::internal(src.path(), "u.jpg")
            .resolve_references(ReferencePreferences::default());

        let out = tempfile::tempdir().unwrap();
        let config = Config::new(src.path(), out.path());
        let report = assemble(vec![unlocated.clone()], &config).unwrap();
        assert_eq!((report.placemarks, report.skipped), (0, 1));
        assert!(!out.path().join("files/u.jpg").exists());

        let out = tempfile::tempdir().unwrap();
        let mut config = Config::new(src.path(), out.path());
        config.include_no_location = true;
        let report = assemble(vec![unlocated], &config).unwrap();
        assert_eq!((report.placemarks, report.skipped), (1, 0));
        let doc = fs::read_to_string(out.path().join(DOC_FILE)).unwrap();
        assert!(doc.contains("unknown time (no location)"));
    }

    #[test]
    fn test_assemble_base64_with_fallback() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.jpg"), b"abc").unwrap();
        fs::write(src.path().join("b.webp"), b"webp").unwrap();

        let mut a = located(src.path(), "a.jpg", 1.0, 1.0);
        a.icon_relative_path = "a.jpg".into();
        let a = a.resolve_references(ReferencePreferences::default());
        let mut b = located(src.path(), "b.webp", 2.0, 2.0);
        b.icon_relative_path = "b.webp".into();
        let b = b.resolve_references(ReferencePreferences::default());

        let out = tempfile::tempdir().unwrap();
        let mut config = Config::new(src.path(), out.path());
        config.base64_images = true;
        assemble(vec![a, b], &config).unwrap();

        let doc = fs::read_to_string(out.path().join(DOC_FILE)).unwrap();
        assert!(doc.contains("data:image/jpeg;base64,YWJj"));
        assert!(!out.path().join("files/a.jpg").exists());
        assert!(doc.contains("<gx:ImageUrl>files/b.webp</gx:ImageUrl>"));
        assert!(out.path().join("files/b.webp").exists());
    }

    #[test]
    fn test_assemble_path_first_and_kmz() {
        let src = tempfile::tempdir().unwrap();
        write_files(src.path(), "a.jpg");
        write_files(src.path(), "b.jpg");

        let out = tempfile::tempdir().unwrap();
        let mut config = Config::new(src.path(), out.path());
        config.generate_path = true;
        config.kmz = true;
        let report = assemble(
            vec![
                located(src.path(), "a.jpg", 1.0, 2.0),
                located(src.path(), "b.jpg", 3.0, 4.0),
            ],
            &config,
        )
        .unwrap();

        assert_eq!(report.path_points, 2);
        let doc = fs::read_to_string(out.path().join(DOC_FILE)).unwrap();
        let path_at = doc.find("<name>Path</name>").unwrap();
        let first_at = doc.find("<name>1</name>").unwrap();
        assert!(path_at < first_at);
        assert!(doc.contains("<coordinates>2,1,0 4,3,0</coordinates>"));

        let archive = report.archive.unwrap();
        let zip = zip::ZipArchive::new(fs::File::open(&archive).unwrap()).unwrap();
        let names: Vec<&str> = zip.file_names().collect();
        assert!(names.contains(&"doc.kml"));
        assert!(names.contains(&"files/a.jpg"));
        assert!(!names.contains(&"doc.kmz"));
    }

    #[test]
    fn test_assemble_single_point_has_no_path() {
        let src = tempfile::tempdir().unwrap();
        write_files(src.path(), "a.jpg");
        let out = tempfile::tempdir().unwrap();
        let mut config = Config::new(src.path(), out.path());
        config.generate_path = true;

        let report = assemble(vec![located(src.path(), "a.jpg", 1.0, 2.0)], &config).unwrap();
        assert_eq!(report.path_points, 0);
        let doc = fs::read_to_string(out.path().join(DOC_FILE)).unwrap();
        assert!(!doc.contains("<name>Path</name>"));
    }
}
