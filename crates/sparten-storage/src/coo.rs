//! Coordinate-list intake for sparse tensor data.
//!
//! A [`CoordinateSet`] is the mutable staging area tensor data passes
//! through before packing: an append-only list of (coordinate, value)
//! entries in insertion order. Nothing is sorted or merged on insert;
//! [`CoordinateSet::sort`] and [`CoordinateSet::deduplicate`] are explicit.
//!
//! # Examples
//!
//! ```
//! use sparten_storage::CoordinateSet;
//!
//! let mut set = CoordinateSet::new(2);
//! set.push(&[2, 0], 2.0).unwrap();
//! set.push(&[0, 1], 1.0).unwrap();
//! assert_eq!(set.len(), 2);
//!
//! set.sort();
//! assert_eq!(set.entries()[0].coords.as_slice(), &[0, 1]);
//! ```

use num_traits::Float;
use smallvec::SmallVec;
use thiserror::Error;

/// Coordinate tuple of a single entry. Tensors up to rank 4 stay inline.
pub type Coords = SmallVec<[u32; 4]>;

/// Errors from inserting into a coordinate set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    /// A coordinate tuple had the wrong number of components.
    #[error("coordinate has {got} components but the tensor has rank {rank}")]
    RankMismatch {
        /// Rank of the coordinate set
        rank: usize,
        /// Number of components in the rejected coordinate
        got: usize,
    },
}

/// One (coordinate, value) entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateEntry<T> {
    /// The coordinate tuple
    pub coords: Coords,
    /// The value stored at that coordinate
    pub value: T,
}

/// An unordered list of (coordinate, value) entries for one tensor.
///
/// Insertion is append-only and keeps duplicates; the set remembers only its
/// rank, so coordinate bounds are checked where a shape is available (at
/// packing, or by the symbolic layer on insert).
#[derive(Debug, Clone)]
pub struct CoordinateSet<T> {
    rank: usize,
    entries: Vec<CoordinateEntry<T>>,
}

impl<T> CoordinateSet<T> {
    /// Creates an empty set for coordinates of the given rank.
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            entries: Vec::new(),
        }
    }

    /// The rank every coordinate must have.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of entries (duplicates included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries have been inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in their current order.
    pub fn entries(&self) -> &[CoordinateEntry<T>] {
        &self.entries
    }

    /// Iterates over the entries in their current order.
    pub fn iter(&self) -> impl Iterator<Item = &CoordinateEntry<T>> {
        self.entries.iter()
    }

    /// Appends an entry.
    ///
    /// Duplicate coordinates are accepted; see the crate-level notes on the
    /// duplicate contract.
    pub fn push(&mut self, coords: &[u32], value: T) -> Result<(), CoordinateError> {
        if coords.len() != self.rank {
            return Err(CoordinateError::RankMismatch {
                rank: self.rank,
                got: coords.len(),
            });
        }
        self.entries.push(CoordinateEntry {
            coords: Coords::from_slice(coords),
            value,
        });
        Ok(())
    }

    /// Removes all entries, keeping the rank.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stable lexicographic sort by coordinates; insertion order breaks ties.
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.coords.cmp(&b.coords));
    }
}

impl<T: Float> CoordinateSet<T> {
    /// Sorts the set and merges runs of equal coordinates by summing their
    /// values.
    ///
    /// This is the pre-reduce step for callers that want canonical packed
    /// output; the packer itself keeps duplicates at sparse levels.
    pub fn deduplicate(&mut self) {
        if self.entries.len() <= 1 {
            return;
        }
        self.sort();

        let before = self.entries.len();
        let mut write = 0;
        for read in 1..self.entries.len() {
            if self.entries[write].coords == self.entries[read].coords {
                self.entries[write].value = self.entries[write].value + self.entries[read].value;
            } else {
                write += 1;
                if write != read {
                    self.entries[write] = self.entries[read].clone();
                }
            }
        }
        self.entries.truncate(write + 1);

        if self.entries.len() < before {
            log::debug!(
                "deduplicate merged {} duplicate coordinates ({} entries remain)",
                before - self.entries.len(),
                self.entries.len()
            );
        }
    }
}
