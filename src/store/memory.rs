use super::PointStore;
use crate::error::Result;
use crate::models::ConflatedPoint;

/// Keeps inserted points in memory. Backs `--dry-run`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: Vec<ConflatedPoint>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[ConflatedPoint] {
        &self.points
    }
}

impl PointStore for MemoryStore {
    async fn insert(&mut self, point: &ConflatedPoint) -> Result<()> {
        self.points.push(point.clone());
        Ok(())
    }
}
