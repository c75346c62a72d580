//! Fenwick (binary indexed) tree over 1-based ranks.
//!
//! Supports point assignment and prefix-sum queries in O(log n). Each rank
//! keeps the raw value written to it alongside the partial sum it is
//! responsible for, so an assignment only has to propagate the difference.

use thiserror::Error;

/// Errors raised by [`PrefixSumTree`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixSumError {
    #[error("Rank {rank} is outside the prefix-sum tree (size {size})")]
    RankOutOfRange { rank: usize, size: usize },
}

/// One rank's storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cell {
    /// Value last written at this rank.
    frequency: i64,
    /// Sum of frequencies over `(rank - lowbit(rank), rank]`.
    responsibility: i64,
}

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

/// Prefix-sum tree with lazy growth past its declared size.
#[derive(Clone, Debug, Default)]
pub struct PrefixSumTree {
    cells: Vec<Cell>,
}

impl PrefixSumTree {
    /// Create a tree over ranks `1..=size`, all zero.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![Cell::default(); size],
        }
    }

    /// Number of ranks currently covered.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Value last written at `rank` (0 if never written).
    pub fn get(&self, rank: usize) -> Result<i64, PrefixSumError> {
        self.check(rank)?;
        Ok(self.cells[rank - 1].frequency)
    }

    /// Set the value at `rank` to `value` (an assignment, not a delta).
    ///
    /// Writing past the current size grows the tree first; the new ranks
    /// start at zero.
    pub fn update(&mut self, rank: usize, value: i64) -> Result<(), PrefixSumError> {
        if rank == 0 {
            return Err(PrefixSumError::RankOutOfRange {
                rank,
                size: self.len(),
            });
        }
        if rank > self.len() {
            self.grow(rank);
        }

        let cell = &mut self.cells[rank - 1];
        let delta = value - cell.frequency;
        cell.frequency = value;
        if delta == 0 {
            return Ok(());
        }

        let mut i = rank;
        while i <= self.cells.len() {
            self.cells[i - 1].responsibility += delta;
            i += lowbit(i);
        }
        Ok(())
    }

    /// Sum of values at ranks `1..=rank`. `sum(0)` is 0.
    pub fn sum(&self, rank: usize) -> Result<i64, PrefixSumError> {
        if rank > self.len() {
            return Err(PrefixSumError::RankOutOfRange {
                rank,
                size: self.len(),
            });
        }

        let mut total = 0;
        let mut i = rank;
        while i > 0 {
            total += self.cells[i - 1].responsibility;
            i -= lowbit(i);
        }
        Ok(total)
    }

    /// Append zero-valued ranks up to `new_size`.
    ///
    /// Each new cell's responsibility covers earlier cells, so it is summed
    /// from the cells already present before being pushed.
    fn grow(&mut self, new_size: usize) {
        self.cells.reserve(new_size - self.cells.len());
        for rank in self.cells.len() + 1..=new_size {
            let floor = rank - lowbit(rank);
            let mut responsibility = 0;
            let mut i = rank - 1;
            while i > floor {
                responsibility += self.cells[i - 1].responsibility;
                i -= lowbit(i);
            }
            self.cells.push(Cell {
                frequency: 0,
                responsibility,
            });
        }
    }

    fn check(&self, rank: usize) -> Result<(), PrefixSumError> {
        if rank == 0 || rank > self.len() {
            return Err(PrefixSumError::RankOutOfRange {
                rank,
                size: self.len(),
            });
        }
        Ok(())
    }
}
