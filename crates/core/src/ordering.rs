use chrono::{DateTime, Utc};

use crate::domain::{Coordinate, ImageAsset};

/// Stable ascending sort by capture time.
///
/// Assets without a timestamp sort before any dated one and are warned about.
pub fn sort_by_time(mut assets: Vec<ImageAsset>) -> Vec<ImageAsset> {
    for asset in assets.iter().filter(|a| !a.has_timestamp()) {
        log::warn!("{}: no time information, sorting first", asset.label());
    }
    assets.sort_by_key(|a| {
        a.timestamp
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    });
    assets
}

/// Coordinates of the assets in order, for the path line.
///
/// Unlocated assets are skipped unless `include_unlocated`; a point equal to
/// the previous one is never repeated.
pub fn build_path(assets: &[ImageAsset], include_unlocated: bool) -> Vec<Coordinate> {
    let mut path: Vec<Coordinate> = Vec::new();
    for asset in assets {
        if !asset.has_location() && !include_unlocated {
            continue;
        }
        let point = asset.coordinate();
        if path.last() != Some(&point) {
            path.push(point);
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn located(name: &str, lat: f64, lon: f64) -> ImageAsset {
        let mut asset = ImageAsset::internal(std::path::Path::new("/p"), name);
        asset.latitude = lat;
        asset.longitude = lon;
        asset.has_latitude = true;
        asset.has_longitude = true;
        asset
    }

    fn at(mut asset: ImageAsset, zone: Tz, y: i32, h: u32) -> ImageAsset {
        asset.timestamp = zone.with_ymd_and_hms(y, 1, 1, h, 0, 0).single();
        asset
    }

    fn names(assets: &[ImageAsset]) -> Vec<&str> {
        assets.iter().map(|a| a.source_relative_path.as_str()).collect()
    }

    // ── sort_by_time ────────────────────────────────────────────

    #[test]
    fn test_sort_by_time_ascending() {
        let assets = vec![
            at(located("c.jpg", 0.0, 0.0), Tz::UTC, 2021, 0),
            at(located("a.jpg", 0.0, 0.0), Tz::UTC, 2019, 0),
            at(located("b.jpg", 0.0, 0.0), Tz::UTC, 2020, 0),
        ];
        assert_eq!(names(&sort_by_time(assets)), vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_sort_by_time_compares_instants_across_zones() {
        // 10:00 in Prague (UTC+1) is before 10:00 UTC
        let assets = vec![
            at(located("utc.jpg", 0.0, 0.0), Tz::UTC, 2020, 10),
            at(located("prague.jpg", 0.0, 0.0), Tz::Europe__Prague, 2020, 10),
        ];
        assert_eq!(names(&sort_by_time(assets)), vec!["prague.jpg", "utc.jpg"]);
    }

    #[test]
    fn test_sort_by_time_untimed_first_and_stable() {
        let assets = vec![
            at(located("timed.jpg", 0.0, 0.0), Tz::UTC, 2020, 0),
            located("x.jpg", 0.0, 0.0),
            located("y.jpg", 0.0, 0.0),
        ];
        assert_eq!(names(&sort_by_time(assets)), vec!["x.jpg", "y.jpg", "timed.jpg"]);
    }

    #[test]
    fn test_sort_by_time_untimed_before_pre_epoch() {
        let assets = vec![
            at(located("1965.jpg", 0.0, 0.0), Tz::UTC, 1965, 0),
            located("untimed.jpg", 0.0, 0.0),
        ];
        assert_eq!(names(&sort_by_time(assets)), vec!["untimed.jpg", "1965.jpg"]);
    }

    // ── build_path ──────────────────────────────────────────────

    #[test]
    fn test_build_path_skips_consecutive_duplicates() {
        let assets = vec![
            located("a", 1.0, 2.0),
            located("b", 1.0, 2.0),
            located("c", 3.0, 4.0),
            located("d", 1.0, 2.0),
        ];
        let path = build_path(&assets, false);
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].to_kml(), "2,1,0");
        assert_eq!(path[1].to_kml(), "4,3,0");
        assert_eq!(path[2].to_kml(), "2,1,0");
    }

    #[test]
    fn test_build_path_unlocated() {
        let unlocated = ImageAsset::internal(std::path::Path::new("/p"), "u.jpg");
        let assets = vec![located("a", 1.0, 2.0), unlocated, located("b", 3.0, 4.0)];

        assert_eq!(build_path(&assets, false).len(), 2);

        let with = build_path(&assets, true);
        assert_eq!(with.len(), 3);
        assert_eq!(with[1], Coordinate { latitude: 0.0, longitude: 0.0 });
    }

    #[test]
    fn test_build_path_origin_is_a_real_location() {
        let assets = vec![located("a", 0.0, 0.0), located("b", 1.0, 1.0)];
        assert_eq!(build_path(&assets, false).len(), 2);
    }
}
