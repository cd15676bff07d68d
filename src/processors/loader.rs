use crate::error::Result;
use crate::models::{ConflatedPoint, Feature, FeatureCollection};
use crate::readers::read_feature_collection;
use crate::store::PointStore;
use crate::utils::constants::DEFAULT_NAME_KEY;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, trace};
use validator::Validate;

/// Where a record's category code comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRule {
    /// Same code for every record, as given on the command line
    Fixed(String),
    /// Read from a feature property
    Property(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Maps GeoJSON features to `ConflatedPoint`s and hands them to a store.
pub struct FeatureLoader {
    name_key: String,
    category: CategoryRule,
    source_label: String,
}

impl FeatureLoader {
    pub fn new(source_label: &str, category: CategoryRule) -> Self {
        Self {
            name_key: DEFAULT_NAME_KEY.to_string(),
            category,
            source_label: source_label.to_string(),
        }
    }

    pub fn with_name_key(mut self, name_key: &str) -> Self {
        self.name_key = name_key.to_string();
        self
    }

    pub async fn load_file<S: PointStore>(&self, path: &Path, store: &mut S) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        self.load_file_into(path, store, &mut report).await?;
        Ok(report)
    }

    /// Like `load_file`, but counts into `report` so the rows inserted
    /// before a store failure are still known to the caller.
    pub async fn load_file_into<S: PointStore>(
        &self,
        path: &Path,
        store: &mut S,
        report: &mut LoadReport,
    ) -> Result<()> {
        let collection = read_feature_collection(path)?;
        self.load_into(collection, store, report).await?;
        info!(
            file = %path.display(),
            source = %self.source_label,
            inserted = report.inserted,
            skipped = report.skipped,
            "loaded features"
        );
        Ok(())
    }

    pub async fn load_collection<S: PointStore>(
        &self,
        collection: FeatureCollection,
        store: &mut S,
    ) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        self.load_into(collection, store, &mut report).await?;
        Ok(report)
    }

    async fn load_into<S: PointStore>(
        &self,
        collection: FeatureCollection,
        store: &mut S,
        report: &mut LoadReport,
    ) -> Result<()> {
        for feature in collection.features {
            match self.to_point(feature) {
                Some(point) => {
                    trace!(name = %point.name, geometry = %point.geometry_wkt(), "inserting point");
                    store.insert(&point).await?;
                    report.inserted += 1;
                }
                None => report.skipped += 1,
            }
        }
        Ok(())
    }

    /// `None` when a required key is missing or the point does not validate
    pub fn to_point(&self, feature: Feature) -> Option<ConflatedPoint> {
        let Some((lon, lat)) = feature.representative_point() else {
            debug!("skipping feature without usable geometry");
            return None;
        };

        let Some(name) = feature.property(&self.name_key).and_then(text_value) else {
            debug!(key = %self.name_key, "skipping feature without a name");
            return None;
        };

        let category = match &self.category {
            CategoryRule::Fixed(code) => code.clone(),
            CategoryRule::Property(key) => match feature.property(key).and_then(text_value) {
                Some(code) => code,
                None => {
                    debug!(%key, %name, "skipping feature without a category");
                    return None;
                }
            },
        };

        let point = ConflatedPoint::new(
            name,
            lat,
            lon,
            category,
            self.source_label.clone(),
            feature.properties.unwrap_or_default(),
        );

        if let Err(e) = point.validate() {
            debug!(name = %point.name, error = %e, "skipping invalid point");
            return None;
        }
        Some(point)
    }
}

/// Strings as-is; numbers and booleans in their JSON spelling
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn collection(value: Value) -> FeatureCollection {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_fixed_category_load() -> Result<()> {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [125.7485, 39.0233] },
                  "properties": { "name": "Koryo Hotel", "stars": "4" } },
                { "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [125.70, 39.00] },
                  "properties": { "label": "nameless" } },
                { "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [200.0, 39.00] },
                  "properties": { "name": "Out of range" } }
            ]
        }));

        let mut store = MemoryStore::new();
        let loader = FeatureLoader::new("Yandex", CategoryRule::Fixed("1102".to_string()));
        let report = loader.load_collection(fc, &mut store).await?;

        assert_eq!(report, LoadReport { inserted: 1, skipped: 2 });
        let p = &store.points()[0];
        assert_eq!(p.name, "Koryo Hotel");
        assert_eq!(p.lat, 39.0233);
        assert_eq!(p.lon, 125.7485);
        assert_eq!(p.midb_cat, "1102");
        assert_eq!(p.source, "Yandex");
        assert_eq!(p.extra_features.get("stars"), Some(&json!("4")));
        Ok(())
    }

    #[tokio::test]
    async fn test_property_category_load() -> Result<()> {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [127.0, 38.0] },
                  "properties": { "NAME": "Depot", "TYPE": 4013 } },
                { "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [127.0, 38.0] },
                  "properties": { "NAME": "Untyped" } }
            ]
        }));

        let mut store = MemoryStore::new();
        let loader = FeatureLoader::new("GoogleMapMaker", CategoryRule::Property("TYPE".to_string()))
            .with_name_key("NAME");
        let report = loader.load_collection(fc, &mut store).await?;

        assert_eq!(report, LoadReport { inserted: 1, skipped: 1 });
        assert_eq!(store.points()[0].midb_cat, "4013");
        assert_eq!(store.points()[0].name, "Depot");
        Ok(())
    }

    #[test]
    fn test_text_value() {
        assert_eq!(text_value(&json!("a")), Some("a".to_string()));
        assert_eq!(text_value(&json!(12)), Some("12".to_string()));
        assert_eq!(text_value(&json!(true)), Some("true".to_string()));
        assert_eq!(text_value(&Value::Null), None);
        assert_eq!(text_value(&json!(["a"])), None);
    }
}
