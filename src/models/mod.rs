pub mod feature;
pub mod point;
pub mod source;

pub use feature::{Feature, FeatureCollection, Geometry};
pub use point::ConflatedPoint;
pub use source::{InputFormat, Source};
