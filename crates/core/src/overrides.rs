use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::ImageAsset;
use crate::error::{Error, Result};
use crate::exif::parse_exif_datetime;
use crate::paths::normalize_path;

pub const KEY_FILE: &str = "file";
pub const KEY_EXTERNAL: &str = "external";
pub const KEY_DATE_TIME: &str = "dateTime";
pub const KEY_TIME_ZONE: &str = "timeZone";
pub const KEY_LATITUDE: &str = "latitude";
pub const KEY_LONGITUDE: &str = "longitude";

/// One user-supplied entry of the data file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideRecord {
    fields: Map<String, Value>,
}

impl OverrideRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// String value of a key. Non-string scalars are rendered as text.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Normalized `file` value, if present.
    pub fn file(&self) -> Option<String> {
        self.get_str(KEY_FILE).map(|f| normalize_path(&f))
    }

    /// Has an `external` URL and no `file`: an image that only exists remotely.
    pub fn is_pure_external(&self) -> bool {
        self.contains(KEY_EXTERNAL) && !self.contains(KEY_FILE)
    }
}

impl From<Value> for OverrideRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }
}

#[derive(Deserialize)]
struct DataDocument {
    items: Option<Vec<Value>>,
    files: Option<Vec<Value>>,
}

/// All records of a data file, in file order.
#[derive(Debug, Clone, Default)]
pub struct OverrideSet {
    records: Vec<OverrideRecord>,
}

impl OverrideSet {
    /// Load a JSON (`.json`) or YAML (`.yaml`, `.yml`) data file.
    /// The records are taken from the top-level `items` array, or `files` if `items` is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let ext = crate::paths::extension_of(&path.to_string_lossy());
        let document: DataDocument = match ext.as_str() {
            "json" => serde_json::from_str(&contents)?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            _ => return Err(Error::UnsupportedOverrideFormat(path.to_path_buf())),
        };
        Self::from_document(document, path)
    }

    /// Parse JSON text directly. Used where no file is involved.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let document: DataDocument = serde_json::from_str(contents)?;
        Self::from_document(document, Path::new("<inline>"))
    }

    fn from_document(document: DataDocument, path: &Path) -> Result<Self> {
        let items = document
            .items
            .or(document.files)
            .ok_or_else(|| Error::OverrideKeyMissing(PathBuf::from(path)))?;

        let records = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match item {
                Value::Object(fields) => Some(OverrideRecord::new(fields)),
                other => {
                    log::warn!("data file item #{} is not an object, skipped: {}", i + 1, other);
                    None
                }
            })
            .collect();
        Ok(Self { records })
    }

    pub fn records(&self) -> &[OverrideRecord] {
        &self.records
    }

    /// First record whose normalized `file` equals the normalized relative path.
    pub fn find_for(&self, relative_path: &str) -> Option<&OverrideRecord> {
        let wanted = normalize_path(relative_path);
        self.records
            .iter()
            .find(|r| r.file().is_some_and(|f| f == wanted))
    }

    /// Records describing images with no local file.
    pub fn external_only(&self) -> impl Iterator<Item = &OverrideRecord> {
        self.records.iter().filter(|r| r.is_pure_external())
    }
}

/// Coerce any numeric JSON/YAML value to f64.
pub fn coerce_f64(key: &str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| Error::NonNumericValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Look up an IANA zone name.
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::UnknownTimeZone(name.to_string()))
}

/// Offset difference between two zones, measured at 2000-01-01 00:00 local time in each.
///
/// Adding the result to a timestamp moves its wall clock by the zone delta.
/// DST rules that differ between the reference date and the photo's date are ignored.
pub fn zone_shift(old: Tz, new: Tz) -> Duration {
    let Some(reference) = NaiveDate::from_ymd_opt(2000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return Duration::zero();
    };
    match (
        old.from_local_datetime(&reference).earliest(),
        new.from_local_datetime(&reference).earliest(),
    ) {
        (Some(in_old), Some(in_new)) => in_old.signed_duration_since(in_new),
        _ => Duration::zero(),
    }
}

/// Shift a timestamp by the zone delta, keeping its zone.
pub fn shift_to_zone(timestamp: DateTime<Tz>, new: Tz) -> DateTime<Tz> {
    timestamp + zone_shift(timestamp.timezone(), new)
}

/// Apply a record to an asset.
///
/// Order: external path, date-time (with zone), zone-only shift, latitude, longitude.
/// Problems with individual values are logged and leave the rest of the record in effect.
pub fn apply_override(mut asset: ImageAsset, record: &OverrideRecord, default_zone: Tz) -> ImageAsset {
    if let Some(external) = record.get_str(KEY_EXTERNAL) {
        asset.external_image_url = external.clone();
        asset.external_icon_url = external;
    }

    let record_zone = record.get_str(KEY_TIME_ZONE).and_then(|name| match parse_zone(&name) {
        Ok(zone) => Some(zone),
        Err(e) => {
            log::warn!("{}: {}", asset.label(), e);
            None
        }
    });

    if let Some(raw) = record.get_str(KEY_DATE_TIME) {
        let zone = record_zone.unwrap_or(default_zone);
        match parse_exif_datetime(&raw, zone) {
            Some(ts) => asset.timestamp = Some(ts),
            None => log::warn!("{}: {}", asset.label(), Error::InvalidDateTime(raw)),
        }
    } else if let (Some(zone), Some(ts)) = (record_zone, asset.timestamp) {
        asset.timestamp = Some(shift_to_zone(ts, zone));
    }

    if let Some(value) = record.get(KEY_LATITUDE) {
        match coerce_f64(KEY_LATITUDE, value) {
            Ok(lat) => {
                asset.latitude = lat;
                asset.has_latitude = true;
            }
            Err(e) => {
                log::warn!("{}: {}", asset.label(), e);
                asset.latitude = 0.0;
                asset.has_latitude = false;
            }
        }
    }

    if let Some(value) = record.get(KEY_LONGITUDE) {
        match coerce_f64(KEY_LONGITUDE, value) {
            Ok(lon) => {
                asset.longitude = lon;
                asset.has_longitude = true;
            }
            Err(e) => {
                log::warn!("{}: {}", asset.label(), e);
                asset.longitude = 0.0;
                asset.has_longitude = false;
            }
        }
    }

    asset
}
