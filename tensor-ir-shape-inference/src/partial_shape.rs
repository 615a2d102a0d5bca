//! Shapes with possibly unknown rank and dimension sizes.

use std::fmt;
use std::str::FromStr;

use crate::dimension::{Dimension, Incompatible, ParseDimensionError};

/// Shape of a tensor whose rank and dimension sizes may be only partially
/// known.
///
/// `Static(vec![])` is the shape of a scalar, which is distinct from
/// `Dynamic`, a shape whose rank is unknown.
#[derive(Clone, Eq, Hash, PartialEq)]
pub enum PartialShape {
    /// Shape of unknown rank.
    Dynamic,
    /// Shape of known rank. Individual dimensions may still be dynamic.
    Static(Vec<Dimension>),
}

impl PartialShape {
    /// Return a shape with a known rank and fixed dimension sizes.
    pub fn fixed(sizes: &[u64]) -> PartialShape {
        PartialShape::Static(sizes.iter().copied().map(Dimension::fixed).collect())
    }

    /// Return the shape of a scalar.
    pub fn scalar() -> PartialShape {
        PartialShape::Static(Vec::new())
    }

    /// Return a shape of known rank where every dimension is dynamic.
    pub fn with_rank(rank: usize) -> PartialShape {
        PartialShape::Static(vec![Dimension::dynamic(); rank])
    }

    /// Return the rank if known.
    pub fn rank(&self) -> Option<usize> {
        self.dims().map(|dims| dims.len())
    }

    /// Return the dimensions if the rank is known.
    pub fn dims(&self) -> Option<&[Dimension]> {
        match self {
            Self::Dynamic => None,
            Self::Static(dims) => Some(dims),
        }
    }

    /// Return the `index`th dimension, if the rank is known and the index is
    /// in bounds.
    pub fn dim(&self, index: usize) -> Option<&Dimension> {
        self.dims().and_then(|dims| dims.get(index))
    }

    /// Return true if the rank and all dimension sizes are known.
    pub fn is_static(&self) -> bool {
        self.dims()
            .is_some_and(|dims| dims.iter().all(|d| d.is_static()))
    }

    /// Return the dimension sizes if the shape is fully static.
    pub fn to_fixed(&self) -> Option<Vec<u64>> {
        self.dims()?.iter().map(|d| d.size()).collect()
    }

    /// Return true if some tensor shape is allowed by both `self` and `other`.
    pub fn compatible(&self, other: &PartialShape) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.compatible(b))
            }
            _ => true,
        }
    }

    /// Return true if every tensor shape allowed by `other` is allowed by
    /// `self`. Labels are ignored.
    pub fn relaxes(&self, other: &PartialShape) -> bool {
        match (self, other) {
            (Self::Dynamic, _) => true,
            (Self::Static(_), Self::Dynamic) => false,
            (Self::Static(a), Self::Static(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.relaxes(b))
            }
        }
    }

    /// Narrow this shape to the shapes allowed by both `self` and `other`.
    pub fn intersect(&self, other: &PartialShape) -> Result<PartialShape, Incompatible> {
        match (self, other) {
            (Self::Dynamic, other) | (other, Self::Dynamic) => Ok(other.clone()),
            (Self::Static(a), Self::Static(b)) => {
                if a.len() != b.len() {
                    // Report the rank mismatch in terms of the rank dimension.
                    return Err(Incompatible {
                        lhs: Dimension::fixed(a.len() as u64),
                        rhs: Dimension::fixed(b.len() as u64),
                    });
                }
                a.iter()
                    .zip(b)
                    .map(|(a, b)| a.intersect(b))
                    .collect::<Result<Vec<_>, _>>()
                    .map(PartialShape::Static)
            }
        }
    }
}

impl Default for PartialShape {
    fn default() -> Self {
        Self::Dynamic
    }
}

impl From<Vec<Dimension>> for PartialShape {
    fn from(dims: Vec<Dimension>) -> Self {
        Self::Static(dims)
    }
}

impl<const N: usize> From<[u64; N]> for PartialShape {
    fn from(sizes: [u64; N]) -> Self {
        Self::fixed(&sizes)
    }
}

impl FromIterator<Dimension> for PartialShape {
    fn from_iter<I: IntoIterator<Item = Dimension>>(iter: I) -> Self {
        Self::Static(iter.into_iter().collect())
    }
}

impl fmt::Display for PartialShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dynamic => write!(f, "[...]"),
            Self::Static(dims) => {
                write!(f, "[")?;
                for (i, dim) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", dim)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Debug for PartialShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for PartialShape {
    type Err = ParseDimensionError;

    /// Parse a shape written as `[2,?,0..300]`, or `[...]` for a shape of
    /// unknown rank.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(s)
            .trim();
        if inner == "..." {
            return Ok(PartialShape::Dynamic);
        }
        if inner.is_empty() {
            return Ok(PartialShape::scalar());
        }
        inner.split(',').map(|dim| dim.parse()).collect()
    }
}

#[cfg(test)]
pub(crate) use tests::{dims, shape};
