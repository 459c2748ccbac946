//! Per-dimension storage format descriptors.
//!
//! A [`Format`] assigns one [`LevelType`] to each stored level of a tensor
//! and optionally reorders the levels relative to the logical dimensions.
//! Level `k` of the stored tree holds logical dimension `order()[k]`; the
//! ordering is the identity unless given explicitly. A dense level stores no
//! arrays and fans out over the full dimension extent; a sparse level stores
//! segment and index arrays for only the nonempty children.
//!
//! Formats print and parse as short tag strings, one character per level:
//!
//! ```
//! use sparten_core::{Format, LevelType};
//!
//! let csr: Format = "ds".parse().unwrap();
//! assert_eq!(csr.level_types(), &[LevelType::Dense, LevelType::Sparse]);
//! assert_eq!(csr.order(), &[0, 1]);
//! assert_eq!(csr.to_string(), "ds");
//! ```
//!
//! Whether a format's length matches a tensor's rank is checked where the
//! two meet: at expression binding and at packing, not at construction.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors from constructing or parsing a format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The level ordering does not have one entry per level.
    #[error("ordering has {got} entries but the format has {levels} levels")]
    OrderLength {
        /// Number of levels in the format
        levels: usize,
        /// Number of entries in the ordering
        got: usize,
    },

    /// The level ordering is not a permutation of the dimension indices.
    #[error("ordering {order:?} is not a permutation of 0..{levels}")]
    OrderNotPermutation {
        /// The rejected ordering
        order: Vec<usize>,
        /// Number of levels in the format
        levels: usize,
    },

    /// A format tag string contained a character other than 'd' or 's'.
    #[error("unknown level tag {tag:?} (expected 'd' or 's')")]
    UnknownLevelTag {
        /// The rejected character
        tag: char,
    },
}

/// Storage discipline of one level of a tensor's stored tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LevelType {
    /// Every coordinate along this dimension is stored implicitly.
    Dense,
    /// Only nonempty coordinates are stored, as segment + index arrays.
    Sparse,
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelType::Dense => write!(f, "d"),
            LevelType::Sparse => write!(f, "s"),
        }
    }
}

/// A per-dimension storage format: one level type per stored level, plus the
/// storage-level ordering over logical dimensions.
///
/// # Examples
///
/// ```
/// use sparten_core::{Format, LevelType};
///
/// // Column-major CSC: levels ordered (column, row), outer dense.
/// let csc = Format::with_order(
///     vec![LevelType::Dense, LevelType::Sparse],
///     vec![1, 0],
/// ).unwrap();
/// assert_eq!(csc.order(), &[1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Format {
    levels: Vec<LevelType>,
    order: Vec<usize>,
}

impl Format {
    /// Creates a format with the identity storage ordering.
    pub fn new(levels: Vec<LevelType>) -> Self {
        let order = (0..levels.len()).collect();
        Self { levels, order }
    }

    /// Creates a format with an explicit storage-level ordering.
    ///
    /// `order[k]` names the logical dimension stored at level `k`; it must be
    /// a permutation of `0..levels.len()`.
    pub fn with_order(levels: Vec<LevelType>, order: Vec<usize>) -> Result<Self, FormatError> {
        if order.len() != levels.len() {
            return Err(FormatError::OrderLength {
                levels: levels.len(),
                got: order.len(),
            });
        }
        let mut seen = vec![false; levels.len()];
        for &dim in &order {
            if dim >= levels.len() || seen[dim] {
                return Err(FormatError::OrderNotPermutation {
                    order,
                    levels: levels.len(),
                });
            }
            seen[dim] = true;
        }
        Ok(Self { levels, order })
    }

    /// An all-dense format of the given length.
    pub fn dense(len: usize) -> Self {
        Self::new(vec![LevelType::Dense; len])
    }

    /// An all-sparse format of the given length.
    pub fn sparse(len: usize) -> Self {
        Self::new(vec![LevelType::Sparse; len])
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true for the zero-level format.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The level types, outermost first.
    pub fn level_types(&self) -> &[LevelType] {
        &self.levels
    }

    /// The storage-level ordering: `order()[k]` is the logical dimension
    /// stored at level `k`.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// The storage level holding logical dimension `dim`, if in range.
    pub fn level_of_dimension(&self, dim: usize) -> Option<usize> {
        self.order.iter().position(|&d| d == dim)
    }

    /// Returns true if every level is dense.
    pub fn is_all_dense(&self) -> bool {
        self.levels.iter().all(|&l| l == LevelType::Dense)
    }
}

impl FromStr for Format {
    type Err = FormatError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let mut levels = Vec::with_capacity(tag.len());
        for c in tag.chars() {
            match c {
                'd' => levels.push(LevelType::Dense),
                's' => levels.push(LevelType::Sparse),
                other => return Err(FormatError::UnknownLevelTag { tag: other }),
            }
        }
        Ok(Format::new(levels))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in &self.levels {
            write!(f, "{}", level)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for tag in ["d", "s", "ds", "ss", "dds", "sss"] {
            let format: Format = tag.parse().unwrap();
            assert_eq!(format.to_string(), tag);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        let err = "dx".parse::<Format>().unwrap_err();
        assert_eq!(err, FormatError::UnknownLevelTag { tag: 'x' });
    }

    #[test]
    fn test_identity_order() {
        let format: Format = "dss".parse().unwrap();
        assert_eq!(format.order(), &[0, 1, 2]);
        assert_eq!(format.level_of_dimension(2), Some(2));
    }

    #[test]
    fn test_with_order() {
        let format = Format::with_order(
            vec![LevelType::Dense, LevelType::Sparse],
            vec![1, 0],
        )
        .unwrap();
        assert_eq!(format.level_of_dimension(1), Some(0));
        assert_eq!(format.level_of_dimension(0), Some(1));
    }

    #[test]
    fn test_with_order_rejects_bad_orderings() {
        let levels = vec![LevelType::Dense, LevelType::Sparse];

        // Wrong length
        let err = Format::with_order(levels.clone(), vec![0]).unwrap_err();
        assert!(matches!(err, FormatError::OrderLength { levels: 2, got: 1 }));

        // Repeated dimension
        let err = Format::with_order(levels.clone(), vec![0, 0]).unwrap_err();
        assert!(matches!(err, FormatError::OrderNotPermutation { .. }));

        // Out of range
        let err = Format::with_order(levels, vec![0, 2]).unwrap_err();
        assert!(matches!(err, FormatError::OrderNotPermutation { .. }));
    }

    #[test]
    fn test_helpers() {
        assert_eq!(Format::dense(3).to_string(), "ddd");
        assert_eq!(Format::sparse(2).to_string(), "ss");
        assert!(Format::dense(2).is_all_dense());
        assert!(!"ds".parse::<Format>().unwrap().is_all_dense());
    }
}
