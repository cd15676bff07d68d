use crate::error::{IngestError, Result};
use crate::utils::constants::POI_SHAPEFILE_SUFFIX;
use crate::utils::intermediate_geojson;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Every `*poi_points.shp` below `root`, sorted by path
pub fn find_poi_shapefiles(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(POI_SHAPEFILE_SUFFIX))
        })
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

/// Reprojects shapefiles to WGS84 GeoJSON through `ogr2ogr`.
pub struct ShapefileConverter {
    program: String,
}

impl ShapefileConverter {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Convert `shapefile` into `<out_dir>/<stem>.geojson`
    pub fn to_geojson(&self, shapefile: &Path, out_dir: &Path) -> Result<PathBuf> {
        let output = intermediate_geojson(out_dir, shapefile);

        // the GeoJSON driver refuses to overwrite
        if output.exists() {
            fs::remove_file(&output)?;
        }

        debug!(program = %self.program, input = %shapefile.display(), "running ogr2ogr");
        let status = Command::new(&self.program)
            .args(["-f", "GeoJSON", "-t_srs", "crs:84"])
            .arg(&output)
            .arg(shapefile)
            .status()?;

        if !status.success() {
            return Err(IngestError::ExternalTool {
                tool: self.program.clone(),
                status: status.to_string(),
            });
        }

        info!(output = %output.display(), "converted shapefile");
        Ok(output)
    }
}
