pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{intermediate_csv, intermediate_geojson};
pub use progress::ProgressReporter;
