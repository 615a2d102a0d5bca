//! Dimensions with interval-bounded sizes and optional labels.

use std::error::Error;
use std::fmt;
use std::ops::{RangeFrom, RangeInclusive};
use std::str::FromStr;

use crate::label::Label;

/// Size of one axis of a tensor.
///
/// The size is represented as a closed interval `[min, max]`, where `max` may
/// be unbounded. A static dimension has `min == max`. A fully dynamic
/// dimension is `[0, ∞)`.
///
/// A dimension may also carry a [`Label`]. Dimensions with the same label
/// are known to have the same size, even if that size is not known.
///
/// ```
/// use tensor_ir_shape_inference::Dimension;
///
/// let batch = Dimension::new(1, 32);
/// let fixed = Dimension::fixed(8);
/// assert!(fixed.is_static());
/// assert_eq!(batch.intersect(&Dimension::new(16, 64)).unwrap(), Dimension::new(16, 32));
/// ```
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Dimension {
    min: u64,

    /// Inclusive upper bound, or `None` if unbounded.
    max: Option<u64>,

    label: Option<Label>,
}

impl Dimension {
    /// Create a dimension with a size in the interval `[min, max]`.
    ///
    /// Panics if `min > max`.
    pub fn new(min: u64, max: u64) -> Dimension {
        assert!(min <= max, "dimension lower bound exceeds upper bound");
        Dimension {
            min,
            max: Some(max),
            label: None,
        }
    }

    /// Create a dimension with a known size.
    pub fn fixed(size: u64) -> Dimension {
        Self::new(size, size)
    }

    /// Create a dimension with an unknown, unbounded size.
    pub fn dynamic() -> Dimension {
        Self::at_least(0)
    }

    /// Create a dimension with a size of at least `min`.
    pub fn at_least(min: u64) -> Dimension {
        Dimension {
            min,
            max: None,
            label: None,
        }
    }

    /// Create a dimension from a lower and optional upper bound.
    ///
    /// Returns `None` if the interval is empty.
    pub fn from_bounds(min: u64, max: Option<u64>) -> Option<Dimension> {
        match max {
            Some(max) if max < min => None,
            _ => Some(Dimension {
                min,
                max,
                label: None,
            }),
        }
    }

    /// Lower bound of the size.
    pub fn min(&self) -> u64 {
        self.min
    }

    /// Upper bound of the size, or `None` if unbounded.
    pub fn max(&self) -> Option<u64> {
        self.max
    }

    /// Return the size if it is known.
    pub fn size(&self) -> Option<u64> {
        self.is_static().then_some(self.min)
    }

    pub fn is_static(&self) -> bool {
        self.max == Some(self.min)
    }

    /// Return true if this dimension has no upper bound.
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    pub fn label(&self) -> Option<Label> {
        self.label
    }

    /// Return a copy of this dimension with the given label.
    pub fn with_label(mut self, label: Label) -> Dimension {
        self.label = Some(label);
        self
    }

    /// Return a copy of this dimension with its label removed.
    pub fn without_label(mut self) -> Dimension {
        self.label = None;
        self
    }

    /// Return true if `size` is a possible value of this dimension.
    pub fn contains(&self, size: u64) -> bool {
        size >= self.min && self.max.is_none_or(|max| size <= max)
    }

    /// Return true if the intervals of `self` and `other` overlap.
    pub fn compatible(&self, other: &Dimension) -> bool {
        self.interval_intersect(other).is_some()
    }

    /// Return true if every size allowed by `other` is allowed by `self`.
    ///
    /// Labels are ignored.
    pub fn relaxes(&self, other: &Dimension) -> bool {
        let upper_ok = match (self.max, other.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a >= b,
        };
        self.min <= other.min && upper_ok
    }

    fn interval_intersect(&self, other: &Dimension) -> Option<(u64, Option<u64>)> {
        let min = self.min.max(other.min);
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        };
        match max {
            Some(max) if max < min => None,
            _ => Some((min, max)),
        }
    }

    /// Narrow this dimension to the sizes allowed by both `self` and `other`.
    ///
    /// The result keeps a label only if both inputs carry the same label.
    /// Returns an error if the intervals do not overlap.
    pub fn intersect(&self, other: &Dimension) -> Result<Dimension, Incompatible> {
        let (min, max) = self
            .interval_intersect(other)
            .ok_or_else(|| Incompatible::new(self, other))?;
        let label = match (self.label, other.label) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        };
        Ok(Dimension { min, max, label })
    }

    /// Variant of [`intersect`](Self::intersect) used when `self` is passed
    /// through unchanged by an operator and `other` is a constraint on it.
    ///
    /// The label of `self` is kept if `other` does not carry a different
    /// label.
    pub fn merge(&self, other: &Dimension) -> Result<Dimension, Incompatible> {
        let mut merged = self.intersect(other)?;
        merged.label = match (self.label, other.label) {
            (Some(a), Some(b)) if a != b => None,
            (a, b) => a.or(b),
        };
        Ok(merged)
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::dynamic()
    }
}

impl From<u64> for Dimension {
    fn from(size: u64) -> Self {
        Self::fixed(size)
    }
}

impl From<RangeInclusive<u64>> for Dimension {
    fn from(range: RangeInclusive<u64>) -> Self {
        Self::new(*range.start(), *range.end())
    }
}

impl From<RangeFrom<u64>> for Dimension {
    fn from(range: RangeFrom<u64>) -> Self {
        Self::at_least(range.start)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (min, Some(max)) if min == max => write!(f, "{}", min)?,
            (0, None) => write!(f, "?")?,
            (min, Some(max)) => write!(f, "{}..{}", min, max)?,
            (min, None) => write!(f, "{}..", min)?,
        }
        if let Some(label) = self.label {
            write!(f, "#{}", label)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Error returned when parsing a [`Dimension`] from a string fails.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseDimensionError {
    text: String,
}

impl fmt::Display for ParseDimensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid dimension \"{}\". Expected a size, `min..max`, `min..` or `?`",
            self.text
        )
    }
}

impl Error for ParseDimensionError {}

impl FromStr for Dimension {
    type Err = ParseDimensionError;

    /// Parse a dimension written as `3`, `0..300`, `8..`, `..10` or `?`,
    /// optionally followed by a label as `#<id>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDimensionError { text: s.to_string() };
        let s_trimmed = s.trim();

        let (range, label) = match s_trimmed.split_once('#') {
            Some((range, label)) => {
                let id: u64 = label.trim().parse().map_err(|_| err())?;
                (range.trim(), Some(Label::from_u64(id).ok_or_else(err)?))
            }
            None => (s_trimmed, None),
        };

        let dim = if range == "?" {
            Dimension::dynamic()
        } else if let Some((min, max)) = range.split_once("..") {
            let min: u64 = if min.is_empty() {
                0
            } else {
                min.parse().map_err(|_| err())?
            };
            let max: Option<u64> = if max.is_empty() {
                None
            } else {
                Some(max.parse().map_err(|_| err())?)
            };
            Dimension::from_bounds(min, max).ok_or_else(err)?
        } else {
            Dimension::fixed(range.parse().map_err(|_| err())?)
        };

        Ok(match label {
            Some(label) => dim.with_label(label),
            None => dim,
        })
    }
}

/// Error from [`Dimension::intersect`] when two dimensions have no size in
/// common.
#[derive(Clone, Debug, PartialEq)]
pub struct Incompatible {
    pub lhs: Dimension,
    pub rhs: Dimension,
}

impl Incompatible {
    fn new(lhs: &Dimension, rhs: &Dimension) -> Self {
        Incompatible {
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        }
    }
}

impl fmt::Display for Incompatible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dimensions {} and {} are incompatible", self.lhs, self.rhs)
    }
}

impl Error for Incompatible {}
