//! Scalar kinds, dimensions, shapes, and tensor types.
//!
//! A [`TensorType`] pairs an element [`ScalarKind`] with an immutable
//! [`Shape`]. Each [`Dimension`] of a shape is either a fixed size or left
//! variable; variable dimensions *agree* with anything during typechecking
//! (see [`Dimension::agrees`]) while structural equality stays strict.

use std::fmt;

/// Scalar element kind of a tensor's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarKind {
    /// 32-bit signed integer components
    Int32,
    /// 32-bit floating point components
    Float32,
    /// 64-bit floating point components
    Float64,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Int32 => write!(f, "i32"),
            ScalarKind::Float32 => write!(f, "f32"),
            ScalarKind::Float64 => write!(f, "f64"),
        }
    }
}

/// One dimension of a tensor shape: a known size or a variable placeholder.
///
/// Equality is structural. Whether two dimensions are *compatible* is a
/// weaker relation: a variable dimension is compatible with any size. The
/// distinction matters because the compatibility relation is not transitive
/// and must not masquerade as `Eq`.
///
/// # Examples
///
/// ```
/// use sparten_core::Dimension;
///
/// assert!(Dimension::Fixed(3).agrees(&Dimension::Fixed(3)));
/// assert!(Dimension::Variable.agrees(&Dimension::Fixed(42)));
/// assert!(!Dimension::Fixed(3).agrees(&Dimension::Fixed(4)));
///
/// assert_ne!(Dimension::Variable, Dimension::Fixed(42));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dimension {
    /// A dimension with a known size
    Fixed(usize),
    /// A dimension whose size is not yet known
    Variable,
}

impl Dimension {
    /// Returns the size if this dimension is fixed.
    pub fn size(&self) -> Option<usize> {
        match self {
            Dimension::Fixed(n) => Some(*n),
            Dimension::Variable => None,
        }
    }

    /// Returns true if this dimension is compatible with `other`.
    ///
    /// Two fixed dimensions agree iff their sizes are equal; a variable
    /// dimension agrees with anything.
    pub fn agrees(&self, other: &Dimension) -> bool {
        match (self, other) {
            (Dimension::Fixed(a), Dimension::Fixed(b)) => a == b,
            _ => true,
        }
    }
}

impl From<usize> for Dimension {
    fn from(size: usize) -> Self {
        Dimension::Fixed(size)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Fixed(n) => write!(f, "{}", n),
            Dimension::Variable => write!(f, "?"),
        }
    }
}

/// An immutable, ordered sequence of dimensions.
///
/// # Examples
///
/// ```
/// use sparten_core::{Dimension, Shape};
///
/// let shape = Shape::fixed(&[2, 3, 3]);
/// assert_eq!(shape.rank(), 3);
/// assert_eq!(shape.dim(1), Dimension::Fixed(3));
/// assert_eq!(shape.to_string(), "2x3x3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    dims: Vec<Dimension>,
}

impl Shape {
    /// Creates a shape from a dimension list.
    pub fn new(dims: Vec<Dimension>) -> Self {
        Self { dims }
    }

    /// Creates a shape where every dimension has a known size.
    pub fn fixed(sizes: &[usize]) -> Self {
        Self {
            dims: sizes.iter().map(|&n| Dimension::Fixed(n)).collect(),
        }
    }

    /// Creates the rank-0 (scalar) shape.
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// The dimension at position `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= rank()`.
    pub fn dim(&self, k: usize) -> Dimension {
        self.dims[k]
    }

    /// All dimensions in order.
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    /// Returns the concrete sizes if every dimension is fixed.
    pub fn sizes(&self) -> Option<Vec<usize>> {
        self.dims.iter().map(Dimension::size).collect()
    }
}

impl From<&[usize]> for Shape {
    fn from(sizes: &[usize]) -> Self {
        Shape::fixed(sizes)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, dim) in self.dims.iter().enumerate() {
            if k > 0 {
                write!(f, "x")?;
            }
            write!(f, "{}", dim)?;
        }
        Ok(())
    }
}

/// The type of a tensor: an element kind together with a shape.
///
/// # Examples
///
/// ```
/// use sparten_core::{ScalarKind, Shape, TensorType};
///
/// let ty = TensorType::new(ScalarKind::Float64, Shape::fixed(&[5]));
/// assert_eq!(ty.kind(), ScalarKind::Float64);
/// assert_eq!(ty.shape().rank(), 1);
/// assert_eq!(ty.to_string(), "f64(5)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TensorType {
    kind: ScalarKind,
    shape: Shape,
}

impl TensorType {
    /// Creates a tensor type.
    pub fn new(kind: ScalarKind, shape: Shape) -> Self {
        Self { kind, shape }
    }

    /// The element kind.
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// The shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.rank() == 0 {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}({})", self.kind, self.shape)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_kind_display() {
        assert_eq!(ScalarKind::Int32.to_string(), "i32");
        assert_eq!(ScalarKind::Float32.to_string(), "f32");
        assert_eq!(ScalarKind::Float64.to_string(), "f64");
    }

    #[test]
    fn test_dimension_agreement() {
        assert!(Dimension::Fixed(3).agrees(&Dimension::Fixed(3)));
        assert!(!Dimension::Fixed(3).agrees(&Dimension::Fixed(4)));
        assert!(Dimension::Variable.agrees(&Dimension::Variable));
        assert!(Dimension::Variable.agrees(&Dimension::Fixed(7)));
        assert!(Dimension::Fixed(7).agrees(&Dimension::Variable));
    }

    #[test]
    fn test_dimension_equality_is_structural() {
        assert_ne!(Dimension::Variable, Dimension::Fixed(7));
        assert_eq!(Dimension::Variable, Dimension::Variable);
    }

    #[test]
    fn test_shape_accessors() {
        let shape = Shape::fixed(&[2, 3, 3]);
        assert_eq!(shape.rank(), 3);
        assert_eq!(shape.dim(0), Dimension::Fixed(2));
        assert_eq!(shape.sizes(), Some(vec![2, 3, 3]));
    }

    #[test]
    fn test_shape_with_variable_dimension() {
        let shape = Shape::new(vec![Dimension::Fixed(2), Dimension::Variable]);
        assert_eq!(shape.sizes(), None);
        assert_eq!(shape.to_string(), "2x?");
    }

    #[test]
    fn test_scalar_shape() {
        let shape = Shape::scalar();
        assert_eq!(shape.rank(), 0);
        assert_eq!(shape.to_string(), "");
    }

    #[test]
    fn test_tensor_type_display() {
        let matrix = TensorType::new(ScalarKind::Float64, Shape::fixed(&[3, 3]));
        assert_eq!(matrix.to_string(), "f64(3x3)");

        let scalar = TensorType::new(ScalarKind::Float32, Shape::scalar());
        assert_eq!(scalar.to_string(), "f32");
    }
}
