use crate::error::{IngestError, Result};
use crate::utils::constants::{
    CSV_DIR, DEFAULT_OGR2OGR, DEFAULT_SETTINGS_FILE, DEFAULT_TABLE, ENV_PREFIX, GEOJSON_DIR,
    SHAPEFILE_DIR,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Runtime settings, layered: defaults, then a TOML file, then
/// `POI_INGEST_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: Option<String>,
    pub table: String,
    pub create_table: bool,
    pub ogr2ogr: String,
    pub csv_dir: String,
    pub geojson_dir: String,
    pub shapefile_dir: String,
}

impl Settings {
    /// Load settings. A missing default file is fine, a missing explicit one is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("table", DEFAULT_TABLE)?
            .set_default("create_table", false)?
            .set_default("ogr2ogr", DEFAULT_OGR2OGR)?
            .set_default("csv_dir", CSV_DIR)?
            .set_default("geojson_dir", GEOJSON_DIR)?
            .set_default("shapefile_dir", SHAPEFILE_DIR)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !is_plain_identifier(&self.table) {
            return Err(IngestError::Config(format!(
                "table must be a plain SQL identifier, got '{}'",
                self.table
            )));
        }
        for (key, dir) in [
            ("csv_dir", &self.csv_dir),
            ("geojson_dir", &self.geojson_dir),
            ("shapefile_dir", &self.shapefile_dir),
        ] {
            if dir.trim().is_empty() {
                return Err(IngestError::Config(format!("{} must not be empty", key)));
            }
        }
        Ok(())
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            IngestError::Config(format!(
                "no database URL: pass --database-url or set {}_DATABASE_URL",
                ENV_PREFIX
            ))
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            table: DEFAULT_TABLE.to_string(),
            create_table: false,
            ogr2ogr: DEFAULT_OGR2OGR.to_string(),
            csv_dir: CSV_DIR.to_string(),
            geojson_dir: GEOJSON_DIR.to_string(),
            shapefile_dir: SHAPEFILE_DIR.to_string(),
        }
    }
}

/// Letters, digits and underscores, optionally schema-qualified once
pub fn is_plain_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
