//! Persistence seam. Records are written one at a time, no batching.

pub mod memory;
pub mod postgis;

pub use memory::MemoryStore;
pub use postgis::PostgisStore;

use crate::error::Result;
use crate::models::ConflatedPoint;
use std::future::Future;

pub trait PointStore {
    fn insert(&mut self, point: &ConflatedPoint) -> impl Future<Output = Result<()>> + Send;
}
