//! Packing coordinate lists into compressed level storage.
//!
//! [`pack`] transforms a [`CoordinateSet`] into a [`PackedTensor`] laid out
//! per a [`Format`]: entries are permuted into storage order, sorted
//! lexicographically (stable, so insertion order breaks ties), and then
//! compressed one level at a time.
//!
//! # Structure
//!
//! For a rank-R tensor the packed result has R levels:
//! - A dense level stores no arrays; each parent group fans out implicitly
//!   over the full dimension extent, and slots with no entries materialize
//!   zeros at the leaves.
//! - A sparse level stores `segments` (cumulative child counts, one boundary
//!   per parent group plus a leading 0) and `indices` (the child coordinate
//!   values, concatenated in parent-group order).
//! - `values` holds every leaf slot in storage order; `nnz` is its length.
//!
//! # Complexity
//!
//! O(n log n) for the sort plus O(n + s) for compression, where n is the
//! entry count and s the number of dense leaf slots.

use num_traits::Float;
use sparten_core::{Format, LevelType};
use thiserror::Error;

use crate::coo::{CoordinateSet, Coords};

/// Errors from packing a coordinate set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// The format does not have one level per coordinate component.
    #[error("format has {levels} levels but the coordinate set has rank {rank}")]
    RankMismatch {
        /// Number of levels in the format
        levels: usize,
        /// Rank of the coordinate set
        rank: usize,
    },

    /// The shape does not have one extent per coordinate component.
    #[error("shape has {dims} dimensions but the coordinate set has rank {rank}")]
    ShapeMismatch {
        /// Number of dimensions in the shape
        dims: usize,
        /// Rank of the coordinate set
        rank: usize,
    },

    /// An entry lies outside the tensor's extents.
    #[error("coordinate {coords:?} is out of bounds for shape {shape:?}")]
    CoordinateOutOfBounds {
        /// The offending coordinate
        coords: Vec<u32>,
        /// The tensor extents
        shape: Vec<usize>,
    },
}

/// Index storage of one packed level.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LevelIndex {
    /// Dense level: no arrays, implicit fan-out over the dimension extent.
    Dense,
    /// Sparse level: segment boundaries and child coordinate values.
    Sparse {
        /// Cumulative child counts; one boundary per parent group plus a
        /// leading 0
        segments: Vec<u32>,
        /// Child coordinate values in parent-group order
        indices: Vec<u32>,
    },
}

impl LevelIndex {
    /// Returns true for a dense level.
    pub fn is_dense(&self) -> bool {
        matches!(self, LevelIndex::Dense)
    }

    /// The (segments, indices) arrays of a sparse level.
    pub fn as_sparse(&self) -> Option<(&[u32], &[u32])> {
        match self {
            LevelIndex::Dense => None,
            LevelIndex::Sparse { segments, indices } => Some((segments, indices)),
        }
    }
}

/// An immutable packed tensor: per-level index storage plus linearized
/// values.
///
/// # Examples
///
/// ```
/// use sparten_storage::{pack, CoordinateSet};
///
/// let mut set = CoordinateSet::new(1);
/// set.push(&[1], 1.0).unwrap();
/// set.push(&[4], 2.0).unwrap();
///
/// let packed = pack(&set, &[5], &"s".parse().unwrap()).unwrap();
/// let (segments, indices) = packed.level(0).as_sparse().unwrap();
/// assert_eq!(segments, &[0, 2]);
/// assert_eq!(indices, &[1, 4]);
/// assert_eq!(packed.values(), &[1.0, 2.0]);
/// assert_eq!(packed.nnz(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackedTensor<T> {
    shape: Vec<usize>,
    order: Vec<usize>,
    levels: Vec<LevelIndex>,
    values: Vec<T>,
}

impl<T: Float> PackedTensor<T> {
    /// The logical tensor extents.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The storage-level ordering the tensor was packed with.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Number of levels.
    pub fn rank(&self) -> usize {
        self.levels.len()
    }

    /// The index storage of every level, outermost first.
    pub fn levels(&self) -> &[LevelIndex] {
        &self.levels
    }

    /// The index storage of level `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= rank()`.
    pub fn level(&self, k: usize) -> &LevelIndex {
        &self.levels[k]
    }

    /// The linearized values, one per stored leaf slot.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Number of explicitly stored values.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Recovers every stored slot as a (logical coordinate, value) pair by
    /// walking the level tree.
    ///
    /// Slots materialized by dense levels are included with their zero
    /// values; a fully sparse tensor yields exactly its packed entries.
    pub fn entries(&self) -> Vec<(Vec<u32>, T)> {
        let mut out = Vec::with_capacity(self.values.len());
        let mut stored = vec![0u32; self.levels.len()];
        self.walk(0, 0, &mut stored, &mut out);
        out
    }

    fn walk(&self, level: usize, group: usize, stored: &mut [u32], out: &mut Vec<(Vec<u32>, T)>) {
        if level == self.levels.len() {
            // group now addresses a leaf slot
            let mut logical = vec![0u32; stored.len()];
            for (k, &dim) in self.order.iter().enumerate() {
                logical[dim] = stored[k];
            }
            out.push((logical, self.values[group]));
            return;
        }
        match &self.levels[level] {
            LevelIndex::Dense => {
                let extent = self.shape[self.order[level]];
                for slot in 0..extent {
                    stored[level] = slot as u32;
                    self.walk(level + 1, group * extent + slot, stored, out);
                }
            }
            LevelIndex::Sparse { segments, indices } => {
                for child in segments[group] as usize..segments[group + 1] as usize {
                    stored[level] = indices[child];
                    self.walk(level + 1, child, stored, out);
                }
            }
        }
    }
}

/// Packs a coordinate set into the storage layout described by `format`.
///
/// Entries are reordered by the format's storage-level ordering, sorted
/// lexicographically with insertion order breaking ties, and compressed
/// level by level. Duplicate coordinates are not reduced here: duplicates
/// reaching a sparse leaf stay as repeated indices within their segment,
/// and duplicates meeting through dense levels are summed into the shared
/// slot. Pre-reduce with [`CoordinateSet::deduplicate`] for canonical
/// output.
///
/// # Errors
///
/// Fails if the format or shape length disagrees with the set's rank, or if
/// any coordinate lies outside `shape`.
pub fn pack<T: Float>(
    set: &CoordinateSet<T>,
    shape: &[usize],
    format: &Format,
) -> Result<PackedTensor<T>, PackError> {
    let rank = set.rank();
    if format.len() != rank {
        return Err(PackError::RankMismatch {
            levels: format.len(),
            rank,
        });
    }
    if shape.len() != rank {
        return Err(PackError::ShapeMismatch {
            dims: shape.len(),
            rank,
        });
    }
    for entry in set.iter() {
        for (&coord, &extent) in entry.coords.iter().zip(shape) {
            if coord as usize >= extent {
                return Err(PackError::CoordinateOutOfBounds {
                    coords: entry.coords.to_vec(),
                    shape: shape.to_vec(),
                });
            }
        }
    }

    let order = format.order();
    let extents: Vec<usize> = order.iter().map(|&dim| shape[dim]).collect();

    // Permute into storage order, then sort; the sort is stable so entries
    // at equal coordinates keep their insertion order.
    let mut entries: Vec<(Coords, T)> = set
        .iter()
        .map(|e| {
            let permuted: Coords = order.iter().map(|&dim| e.coords[dim]).collect();
            (permuted, e.value)
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut levels: Vec<LevelIndex> = format
        .level_types()
        .iter()
        .map(|&ty| match ty {
            LevelType::Dense => LevelIndex::Dense,
            LevelType::Sparse => LevelIndex::Sparse {
                segments: vec![0],
                indices: Vec::new(),
            },
        })
        .collect();
    let mut values = Vec::new();

    pack_level(
        &entries,
        &extents,
        format.level_types(),
        0,
        0,
        entries.len(),
        &mut levels,
        &mut values,
    );

    log::debug!(
        "packed {} entries as {} into {} stored values",
        set.len(),
        format,
        values.len()
    );

    Ok(PackedTensor {
        shape: shape.to_vec(),
        order: order.to_vec(),
        levels,
        values,
    })
}

/// Packs the entry range `[begin, end)` of one parent group at `level`.
#[allow(clippy::too_many_arguments)]
fn pack_level<T: Float>(
    entries: &[(Coords, T)],
    extents: &[usize],
    types: &[LevelType],
    level: usize,
    begin: usize,
    end: usize,
    levels: &mut [LevelIndex],
    values: &mut Vec<T>,
) {
    if level == types.len() {
        // Leaf slot. A sparse parent always hands down a single entry, so
        // summation here only merges duplicates that met through dense
        // levels; an empty range is a dense slot with no entry.
        let mut value = T::zero();
        for (_, v) in &entries[begin..end] {
            value = value + *v;
        }
        values.push(value);
        return;
    }

    match types[level] {
        LevelType::Dense => {
            let mut child_begin = begin;
            for slot in 0..extents[level] {
                let mut child_end = child_begin;
                while child_end < end && entries[child_end].0[level] as usize == slot {
                    child_end += 1;
                }
                pack_level(
                    entries, extents, types, level + 1, child_begin, child_end, levels, values,
                );
                child_begin = child_end;
            }
        }
        LevelType::Sparse => {
            // At the leaf level every entry is its own child, which is what
            // keeps duplicate coordinates (and their values) intact; above
            // the leaf a child is a run of equal coordinates.
            let leaf = level + 1 == types.len();
            let mut child_begin = begin;
            while child_begin < end {
                let coord = entries[child_begin].0[level];
                let mut child_end = child_begin + 1;
                if !leaf {
                    while child_end < end && entries[child_end].0[level] == coord {
                        child_end += 1;
                    }
                }
                if let LevelIndex::Sparse { indices, .. } = &mut levels[level] {
                    indices.push(coord);
                }
                pack_level(
                    entries, extents, types, level + 1, child_begin, child_end, levels, values,
                );
                child_begin = child_end;
            }
            if let LevelIndex::Sparse { segments, indices } = &mut levels[level] {
                segments.push(indices.len() as u32);
            }
        }
    }
}
