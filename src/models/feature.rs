use geo::{Centroid, Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const FEATURE_COLLECTION: &str = "FeatureCollection";
const FEATURE: &str = "Feature";
const POINT: &str = "Point";

fn feature_collection_type() -> String {
    FEATURE_COLLECTION.to_string()
}

fn feature_type() -> String {
    FEATURE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,

    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: feature_collection_type(),
            features,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,

    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            kind: POINT.to_string(),
            coordinates: Value::from(vec![lon, lat]),
        }
    }
}

impl Feature {
    pub fn point(lon: f64, lat: f64, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_type(),
            geometry: Some(Geometry::point(lon, lat)),
            properties: Some(properties),
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    /// A single `(lon, lat)` standing in for the whole geometry.
    ///
    /// Points are taken as-is, multipoints by their first member, and
    /// linear or areal geometries by their centroid.
    pub fn representative_point(&self) -> Option<(f64, f64)> {
        let geometry = self.geometry.as_ref()?;
        let coords = &geometry.coordinates;

        let coord = match geometry.kind.as_str() {
            "Point" => position(coords),
            "MultiPoint" => coords.as_array()?.first().and_then(position),
            "LineString" => line_string(coords)?.centroid().map(Coord::from),
            "MultiLineString" => {
                let lines = coords
                    .as_array()?
                    .iter()
                    .map(line_string)
                    .collect::<Option<Vec<_>>>()?;
                MultiLineString::new(lines).centroid().map(Coord::from)
            }
            "Polygon" => polygon(coords)?.centroid().map(Coord::from),
            "MultiPolygon" => {
                let polygons = coords
                    .as_array()?
                    .iter()
                    .map(polygon)
                    .collect::<Option<Vec<_>>>()?;
                MultiPolygon::new(polygons).centroid().map(Coord::from)
            }
            _ => None,
        }?;

        if coord.x.is_finite() && coord.y.is_finite() {
            Some((coord.x, coord.y))
        } else {
            None
        }
    }
}

fn position(value: &Value) -> Option<Coord> {
    let parts = value.as_array()?;
    if parts.len() < 2 {
        return None;
    }
    Some(Coord {
        x: parts[0].as_f64()?,
        y: parts[1].as_f64()?,
    })
}

fn line_string(value: &Value) -> Option<LineString> {
    let coords = value
        .as_array()?
        .iter()
        .map(position)
        .collect::<Option<Vec<_>>>()?;
    if coords.is_empty() {
        return None;
    }
    Some(LineString::new(coords))
}

fn polygon(value: &Value) -> Option<Polygon> {
    let mut rings = value
        .as_array()?
        .iter()
        .map(line_string)
        .collect::<Option<Vec<_>>>()?
        .into_iter();
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(geometry: Value) -> Feature {
        serde_json::from_value(json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": { "name": "Test" }
        }))
        .unwrap()
    }

    #[test]
    fn test_point_representative() {
        let f = feature(json!({ "type": "Point", "coordinates": [125.75, 39.03] }));
        assert_eq!(f.representative_point(), Some((125.75, 39.03)));
    }

    #[test]
    fn test_multipoint_uses_first_member() {
        let f = feature(json!({ "type": "MultiPoint", "coordinates": [[1.0, 2.0], [3.0, 4.0]] }));
        assert_eq!(f.representative_point(), Some((1.0, 2.0)));
    }

    #[test]
    fn test_polygon_centroid() {
        let f = feature(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
        }));
        let (lon, lat) = f.representative_point().unwrap();
        assert!((lon - 1.0).abs() < 1e-9);
        assert!((lat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_linestring_centroid() {
        let f = feature(json!({ "type": "LineString", "coordinates": [[0.0, 0.0], [4.0, 0.0]] }));
        let (lon, lat) = f.representative_point().unwrap();
        assert!((lon - 2.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_multilinestring_centroid() {
        let f = feature(json!({
            "type": "MultiLineString",
            "coordinates": [[[0.0, 0.0], [2.0, 0.0]], [[0.0, 2.0], [2.0, 2.0]]]
        }));
        let (lon, lat) = f.representative_point().unwrap();
        assert!((lon - 1.0).abs() < 1e-9);
        assert!((lat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_multipolygon_centroid() {
        let f = feature(json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]],
                [[[4.0, 0.0], [6.0, 0.0], [6.0, 2.0], [4.0, 2.0], [4.0, 0.0]]]
            ]
        }));
        let (lon, lat) = f.representative_point().unwrap();
        assert!((lon - 3.0).abs() < 1e-9);
        assert!((lat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unusable_geometry() {
        assert_eq!(feature(Value::Null).representative_point(), None);
        assert_eq!(
            feature(json!({ "type": "Point", "coordinates": [1.0] })).representative_point(),
            None
        );
        assert_eq!(
            feature(json!({ "type": "Point", "coordinates": ["a", "b"] })).representative_point(),
            None
        );
        assert_eq!(
            feature(json!({ "type": "GeometryCollection", "geometries": [] }))
                .representative_point(),
            None
        );
    }

    #[test]
    fn test_collection_serializes_with_lowercase_type() {
        let mut props = Map::new();
        props.insert("name".to_string(), json!("A"));
        let fc = FeatureCollection::new(vec![Feature::point(1.5, 2.5, props)]);
        let value = serde_json::to_value(&fc).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["geometry"]["coordinates"], json!([1.5, 2.5]));
        assert_eq!(value["features"][0]["properties"]["name"], "A");
    }
}
