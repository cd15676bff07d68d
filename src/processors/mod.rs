pub mod dispatcher;
pub mod loader;
pub mod shapefile;

pub use dispatcher::{prepare_geojson, Dispatcher, FileOutcome, FileStatus, IngestReport};
pub use loader::{CategoryRule, FeatureLoader, LoadReport};
pub use shapefile::{find_poi_shapefiles, ShapefileConverter};
