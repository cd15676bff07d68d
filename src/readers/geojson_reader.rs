use crate::error::Result;
use crate::models::FeatureCollection;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read a GeoJSON `FeatureCollection` from disk
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
    Ok(serde_json::from_reader(reader)?)
}
