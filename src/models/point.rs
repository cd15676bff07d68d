use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// A normalized point of interest, ready to be persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConflatedPoint {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,

    /// MIDB category code
    pub midb_cat: String,

    /// Provenance label, e.g. "Wikimapia"
    pub source: String,

    pub date_update: DateTime<Utc>,

    /// Every property the feature carried, kept verbatim
    pub extra_features: Map<String, Value>,
}

impl ConflatedPoint {
    pub fn new(
        name: String,
        lat: f64,
        lon: f64,
        midb_cat: String,
        source: String,
        extra_features: Map<String, Value>,
    ) -> Self {
        Self {
            name,
            lat,
            lon,
            midb_cat,
            source,
            date_update: Utc::now(),
            extra_features,
        }
    }

    /// WKT representation with longitude first, as PostGIS expects
    pub fn geometry_wkt(&self) -> String {
        format!("POINT({:.6} {:.6})", self.lon, self.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, lat: f64, lon: f64) -> ConflatedPoint {
        ConflatedPoint::new(
            name.to_string(),
            lat,
            lon,
            "1102".to_string(),
            "Wikimapia".to_string(),
            Map::new(),
        )
    }

    #[test]
    fn test_point_validation() {
        assert!(point("Pyongyang Station", 39.0308, 125.7467).validate().is_ok());
        assert!(point("", 39.0308, 125.7467).validate().is_err());
        assert!(point("North of everything", 91.0, 0.0).validate().is_err());
        assert!(point("Off the map", 0.0, -180.5).validate().is_err());
    }

    #[test]
    fn test_geometry_wkt_is_lon_lat() {
        let p = point("Kaesong", 37.97, 126.55);
        assert_eq!(p.geometry_wkt(), "POINT(126.550000 37.970000)");
    }
}
