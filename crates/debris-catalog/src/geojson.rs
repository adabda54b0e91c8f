//! GeoJSON export of trajectories
//!
//! Coordinates are `[longitude, latitude]` as GeoJSON requires. Each track
//! segment becomes one line of a `MultiLineString`, so no line ever crosses
//! the antimeridian.

use serde_json::{json, Value};

use crate::Trajectory;

pub fn to_geojson(trajectory: &Trajectory) -> Value {
    let lines: Vec<Vec<[f64; 2]>> = trajectory
        .ground_track
        .segments
        .iter()
        .map(|segment| segment.points.iter().map(|p| [p.longitude, p.latitude]).collect())
        .collect();

    let mut features = vec![json!({
        "type": "Feature",
        "geometry": {
            "type": "MultiLineString",
            "coordinates": lines
        },
        "properties": {
            "kind": "ground_track",
            "name": trajectory.name,
            "norad_id": trajectory.norad_id,
            "class": format!("{:?}", trajectory.class),
            "samples_attempted": trajectory.ground_track.samples_attempted,
            "samples_skipped": trajectory.ground_track.samples_skipped
        }
    })];

    if let Some(site) = trajectory.reentry_site {
        features.push(json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [site.lon, site.lat]
            },
            "properties": {
                "kind": "reentry_site",
                "name": trajectory.name
            }
        }));
    }

    json!({
        "type": "FeatureCollection",
        "features": features,
        "metadata": {
            "view_fit": trajectory.view_fit,
            "tle_age_hours": trajectory.tle_age.map(|age| age.hours)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::iss_record;
    use crate::build_trajectory;
    use orbital_mechanics::SamplingConfig;

    #[test]
    fn test_trajectory_geojson() {
        let trajectory = build_trajectory(&iss_record(), &SamplingConfig::default()).unwrap();
        let geojson = to_geojson(&trajectory);

        assert_eq!(geojson["type"], "FeatureCollection");
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        let lines = features[0]["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(lines.len(), trajectory.ground_track.segments.len());

        // [lon, lat] order
        let first = &trajectory.ground_track.segments[0].points[0];
        assert_eq!(lines[0][0][0].as_f64().unwrap(), first.longitude);
        assert_eq!(lines[0][0][1].as_f64().unwrap(), first.latitude);

        assert_eq!(features[1]["geometry"]["type"], "Point");
        assert_eq!(features[1]["geometry"]["coordinates"][0], 170.25);
        assert_eq!(geojson["metadata"]["tle_age_hours"], 12.0);
        assert_eq!(geojson["metadata"]["view_fit"]["kind"], "bounds");
    }

    #[test]
    fn test_geojson_without_reentry_site() {
        let mut record = iss_record();
        record.reentry_site = None;
        record.days_difference = None;
        let trajectory = build_trajectory(&record, &SamplingConfig::default()).unwrap();
        let geojson = to_geojson(&trajectory);

        assert_eq!(geojson["features"].as_array().unwrap().len(), 1);
        assert!(geojson["metadata"]["tle_age_hours"].is_null());
    }
}
