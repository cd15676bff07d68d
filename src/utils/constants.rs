/// Intermediate output directories, created inside the ingest directory
pub const CSV_DIR: &str = "CSV";
pub const GEOJSON_DIR: &str = "GeoJSON";

/// Vendor shapefile tree and the layer we pick out of it
pub const SHAPEFILE_DIR: &str = "GoogleMapMaker_Data";
pub const POI_SHAPEFILE_SUFFIX: &str = "poi_points.shp";
pub const SHAPEFILE_SOURCE_LABEL: &str = "GoogleMapMaker";
pub const SHAPEFILE_NAME_KEY: &str = "NAME";
pub const SHAPEFILE_CATEGORY_KEY: &str = "TYPE";

/// Property holding the display name in every normalized feature
pub const DEFAULT_NAME_KEY: &str = "name";

/// Property names tried, in order, for coordinates in CSV rows
pub const LATITUDE_KEYS: &[&str] = &["lat", "latitude"];
pub const LONGITUDE_KEYS: &[&str] = &["lng", "lon", "longitude"];

/// Header written by the KML converter
pub const KML_ELEMENTS: &[&str] = &[
    "name",
    "longitude",
    "latitude",
    "altitude",
    "range",
    "tilt",
    "heading",
    "altitudeMode",
    "coordinates",
];

/// Persistence defaults
pub const DEFAULT_TABLE: &str = "conflated_points";
pub const DEFAULT_OGR2OGR: &str = "ogr2ogr";
pub const DEFAULT_SETTINGS_FILE: &str = "poi-ingest.toml";
pub const ENV_PREFIX: &str = "POI_INGEST";

pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
