//! The contribution grid: 7 weekday rows by N week columns.
//!
//! Columns are stored as `[u8; DAYS]`, so the row count cannot drift from
//! seven. Each cell holds a level in `0..=MAX_LEVEL`; zero means inactive.

mod shading;

pub use shading::{CommitTiers, Shading};

/// Rows in the graph, Sunday through Saturday.
pub const DAYS: usize = 7;
/// Highest shade GitHub renders.
pub const MAX_LEVEL: u8 = 4;
/// Default number of weeks in a pattern.
pub const DEFAULT_WEEKS: usize = 52;
/// Widest span the graph shows.
pub const MAX_WEEKS: usize = 53;

pub const WEEKDAYS: [&str; DAYS] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    columns: Vec<[u8; DAYS]>,
}

impl Grid {
    /// An empty grid `weeks` columns wide.
    pub fn new(weeks: usize) -> Self {
        Self {
            columns: vec![[0; DAYS]; weeks],
        }
    }

    /// Build from row-major data. Missing rows and short rows are padded with
    /// zeros; columns beyond `weeks` are dropped. Levels are clamped.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R], weeks: usize) -> Self {
        let mut grid = Self::new(weeks);
        for (day, row) in rows.iter().take(DAYS).enumerate() {
            for (week, &level) in row.as_ref().iter().take(weeks).enumerate() {
                grid.set(day, week, level);
            }
        }
        grid
    }

    pub fn weeks(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, day: usize, week: usize) -> u8 {
        self.columns
            .get(week)
            .and_then(|c| c.get(day))
            .copied()
            .unwrap_or(0)
    }

    /// Set a cell; out-of-range coordinates are ignored.
    pub fn set(&mut self, day: usize, week: usize, level: u8) {
        if let Some(cell) = self.columns.get_mut(week).and_then(|c| c.get_mut(day)) {
            *cell = level.min(MAX_LEVEL);
        }
    }

    pub fn columns(&self) -> &[[u8; DAYS]] {
        &self.columns
    }

    /// Active cells as `(week, day, level)` in column-major order.
    pub fn active_cells(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.columns.iter().enumerate().flat_map(|(week, col)| {
            col.iter()
                .enumerate()
                .filter(|(_, level)| **level > 0)
                .map(move |(day, level)| (week, day, *level))
        })
    }

    pub fn active_count(&self) -> usize {
        self.active_cells().count()
    }

    /// Row-major copy, the layout templates are stored in.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..DAYS)
            .map(|day| self.columns.iter().map(|col| col[day]).collect())
            .collect()
    }

    pub fn stats(&self, tiers: &CommitTiers) -> GridStats {
        let counts: Vec<u32> = self
            .active_cells()
            .map(|(_, _, level)| tiers.count(level))
            .collect();
        GridStats {
            active_days: counts.len(),
            total_commits: counts.iter().map(|&c| u64::from(c)).sum(),
            max_daily: counts.iter().copied().max().unwrap_or(0),
            cells: self.weeks() * DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridStats {
    pub active_days: usize,
    pub total_commits: u64,
    pub max_daily: u32,
    pub cells: usize,
}

impl GridStats {
    pub fn coverage(&self) -> f64 {
        if self.cells == 0 {
            return 0.0;
        }
        self.active_days as f64 / self.cells as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_pads_short_input() {
        let g = Grid::from_rows(&[vec![1, 0, 2], vec![0, 4]], 5);
        assert_eq!(g.weeks(), 5);
        assert_eq!(g.get(0, 0), 1);
        assert_eq!(g.get(0, 2), 2);
        assert_eq!(g.get(1, 1), 4);
        assert_eq!(g.get(6, 4), 0);
    }

    #[test]
    fn from_rows_drops_overflow_and_clamps_levels() {
        let rows = vec![vec![9u8; 10]; 9];
        let g = Grid::from_rows(&rows, 3);
        assert_eq!(g.weeks(), 3);
        assert_eq!(g.active_count(), 3 * DAYS);
        assert!(g.active_cells().all(|(_, _, l)| l == MAX_LEVEL));
    }

    #[test]
    fn active_cells_are_column_major() {
        let mut g = Grid::new(2);
        g.set(5, 0, 1);
        g.set(0, 1, 2);
        g.set(1, 0, 3);
        let cells: Vec<_> = g.active_cells().collect();
        assert_eq!(cells, vec![(0, 1, 3), (0, 5, 1), (1, 0, 2)]);
    }

    #[test]
    fn out_of_range_set_is_ignored() {
        let mut g = Grid::new(1);
        g.set(7, 0, 4);
        g.set(0, 1, 4);
        assert_eq!(g.active_count(), 0);
    }

    #[test]
    fn rows_round_trip_through_grid() {
        let mut rows = vec![vec![0; 2]; 7];
        rows[0] = vec![0, 1];
        rows[1] = vec![2, 0];
        rows[6] = vec![3, 4];
        assert_eq!(Grid::from_rows(&rows, 2).to_rows(), rows);
    }

    #[test]
    fn stats_follow_tiers() {
        let g = Grid::from_rows(&[vec![1, 4], vec![0, 2]], 2);
        let s = g.stats(&CommitTiers::default());
        assert_eq!(s.active_days, 3);
        assert_eq!(s.total_commits, 7);
        assert_eq!(s.max_daily, 4);
        assert!((s.coverage() - 3.0 / 14.0 * 100.0).abs() < 1e-9);
    }
}
