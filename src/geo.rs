//! Map feature synthesis: the station and line GeoJSON collections a map
//! engine renders.

use std::collections::HashSet;

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;

use crate::model::LineDetail;

/// The two deduplicated feature collections for map rendering.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkGeo {
    pub stations: FeatureCollection,
    pub lines: FeatureCollection,
}

/// Synthesizes map features from line listings.
///
/// Stations become Point features keyed by station id; the first occurrence
/// of a station wins and later duplicates (the same station on another line)
/// are ignored. Each line becomes a LineString over its geolocated stations
/// in traversal order, emitted only when at least two points accumulate.
///
/// Stations without coordinates are silently skipped from line paths, so a
/// rendered path can visually connect stops that are not adjacent on the
/// ground. That approximation is deliberate; interpolating or splitting the
/// path is a product decision this layer does not take.
pub fn build_network_geo(lines: &[LineDetail]) -> NetworkGeo {
    let mut station_features = Vec::new();
    let mut line_features = Vec::new();
    let mut seen_stations: HashSet<i64> = HashSet::new();

    for line in lines {
        let mut coords: Vec<Vec<f64>> = Vec::new();

        for station in &line.stations {
            let Some((lon, lat)) = station.coordinates() else {
                continue;
            };
            coords.push(vec![lon, lat]);

            if seen_stations.insert(station.id) {
                let mut properties = JsonObject::new();
                properties.insert("name".to_string(), json!(station.name));
                properties.insert("accessible".to_string(), json!(station.accessible));

                station_features.push(Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
                    id: Some(Id::Number(station.id.into())),
                    properties: Some(properties),
                    foreign_members: None,
                });
            }
        }

        if coords.len() >= 2 {
            let mut properties = JsonObject::new();
            properties.insert("code".to_string(), json!(line.code));
            properties.insert("name".to_string(), json!(line.name));
            properties.insert("colorHex".to_string(), json!(line.color_hex));
            properties.insert("status".to_string(), json!(line.status.to_string()));

            line_features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(coords))),
                id: Some(Id::Number(line.id.into())),
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    NetworkGeo {
        stations: FeatureCollection {
            bbox: None,
            features: station_features,
            foreign_members: None,
        },
        lines: FeatureCollection {
            bbox: None,
            features: line_features,
            foreign_members: None,
        },
    }
}
