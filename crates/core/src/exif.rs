use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use exif::{Exif, In, Reader, Tag, Value};

/// EXIF date-time layout, also used by override files.
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Whatever could be read from a photo's EXIF block. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub timestamp: Option<DateTime<Tz>>,
    /// (latitude, longitude) in decimal degrees.
    pub location: Option<(f64, f64)>,
    /// (width, height) in pixels.
    pub dimensions: Option<(u32, u32)>,
    pub thumbnail: Option<Vec<u8>>,
}

/// Read EXIF metadata from an image file.
///
/// A file without EXIF yields an empty result; any other decode failure is
/// logged as critical and also yields an empty result. Missing tags only
/// leave their own field empty.
pub fn extract_metadata(path: &Path, zone: Tz) -> ExtractedMetadata {
    let exif = match read_exif(path) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => {
            log::debug!("{} has no EXIF data", path.display());
            return ExtractedMetadata::default();
        }
        Err(e) => {
            log::warn!("EXIF of {} has a critical error: {}", path.display(), e);
            return ExtractedMetadata::default();
        }
    };

    ExtractedMetadata {
        timestamp: read_timestamp(&exif, zone),
        location: read_location(&exif),
        dimensions: read_dimensions(&exif),
        thumbnail: read_thumbnail(&exif),
    }
}

fn read_exif(path: &Path) -> std::result::Result<Exif, exif::Error> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    Reader::new().read_from_container(&mut reader)
}

/// Read the EXIF orientation tag (1-8). Returns 1 (normal) if missing or unreadable.
pub fn read_orientation(path: &Path) -> u32 {
    read_exif(path)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|f| f.value.get_uint(0))
        })
        .unwrap_or(1)
}

/// Parse an EXIF-style date-time in the given zone, ignoring surrounding spaces and NUL padding.
///
/// Ambiguous wall-clock times take the earlier instant. Times skipped by a
/// forward transition are read with the offset in force before it, so
/// 02:30 on a spring-forward night becomes 03:30.
pub fn parse_exif_datetime(raw: &str, zone: Tz) -> Option<DateTime<Tz>> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c == ' ');
    let naive = NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT).ok()?;
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let before = zone
                .from_local_datetime(&(naive - Duration::hours(24)))
                .earliest()?;
            let utc = naive - before.offset().fix();
            Some(zone.from_utc_datetime(&utc))
        }
    }
}

fn read_timestamp(exif: &Exif, zone: Tz) -> Option<DateTime<Tz>> {
    [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
        .find_map(|field| match field.value {
            Value::Ascii(ref parts) => parts
                .first()
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .and_then(|s| parse_exif_datetime(s, zone)),
            _ => None,
        })
}

fn read_location(exif: &Exif) -> Option<(f64, f64)> {
    let latitude = read_gps_coord(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
    let longitude = read_gps_coord(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
    Some((latitude, longitude))
}

/// Degrees/minutes/seconds rationals to signed decimal degrees (S and W are negative).
fn read_gps_coord(exif: &Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let coord = exif.get_field(coord_tag, In::PRIMARY)?;
    let reference = exif.get_field(ref_tag, In::PRIMARY)?;

    let dms = match coord.value {
        Value::Rational(ref v) if !v.is_empty() => v,
        _ => return None,
    };
    let part = |i: usize| dms.get(i).map(|r| r.to_f64()).unwrap_or(0.0);
    let decimal = part(0) + part(1) / 60.0 + part(2) / 3600.0;
    if !decimal.is_finite() {
        return None;
    }

    let negative = match reference.value {
        Value::Ascii(ref parts) => parts
            .first()
            .and_then(|b| b.first())
            .is_some_and(|c| matches!(c, b'S' | b'W' | b's' | b'w')),
        _ => false,
    };

    Some(if negative { -decimal } else { decimal })
}

fn read_dimensions(exif: &Exif) -> Option<(u32, u32)> {
    let get = |tags: [Tag; 2]| {
        tags.into_iter()
            .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
            .find_map(|f| f.value.get_uint(0))
    };
    let width = get([Tag::PixelXDimension, Tag::ImageWidth])?;
    let height = get([Tag::PixelYDimension, Tag::ImageLength])?;
    Some((width, height))
}

/// Bytes of the JPEG thumbnail stored in the thumbnail IFD, if any.
fn read_thumbnail(exif: &Exif) -> Option<Vec<u8>> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let length = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    if length == 0 {
        return None;
    }
    exif.buf()
        .get(offset..offset.checked_add(length)?)
        .map(|bytes| bytes.to_vec())
}
