use crate::model::Direction;

pub const DEFAULT_SECTOR_COUNT: usize = 64;

/// Coarse distance map: each cell holds the last direction seen in its distance bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorOccupancy {
    cells: Vec<Direction>,
}

impl SectorOccupancy {
    pub fn new(count: usize) -> Self {
        Self {
            cells: vec![Direction::None; count.max(1)],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Direction] {
        &self.cells
    }

    /// Bucket for `distance_cm`, or `None` when it falls outside `[0, max_range_cm)`.
    pub fn index_for(&self, distance_cm: f64, max_range_cm: f64) -> Option<usize> {
        if max_range_cm.is_nan() || max_range_cm <= 0.0 {
            return None;
        }
        if distance_cm.is_nan() || distance_cm < 0.0 {
            return None;
        }
        let index = (distance_cm / max_range_cm * self.cells.len() as f64).floor();
        if index < self.cells.len() as f64 {
            Some(index as usize)
        } else {
            None
        }
    }

    pub fn record(
        &mut self,
        distance_cm: f64,
        max_range_cm: f64,
        direction: Direction,
    ) -> Option<usize> {
        let index = self.index_for(distance_cm, max_range_cm)?;
        self.cells[index] = direction;
        Some(index)
    }

    pub fn reset(&mut self) {
        self.cells.fill(Direction::None);
    }
}

impl Default for SectorOccupancy {
    fn default() -> Self {
        Self::new(DEFAULT_SECTOR_COUNT)
    }
}
