pub mod geojson_reader;
pub mod kml_reader;
pub mod text_reader;

pub use geojson_reader::read_feature_collection;
pub use kml_reader::KmlConverter;
pub use text_reader::TextConverter;
