//! Type, shape and optional value of an operator input or output.

use std::fmt;

use crate::dimension::Dimension;
use crate::element_type::ElementType;
use crate::partial_shape::PartialShape;

/// Describes a value flowing along a graph edge.
///
/// Operators receive one descriptor per input and produce one per output.
/// In addition to the element type and shape, a descriptor may carry what
/// is known about the value itself:
///
/// - `constant_value` holds the elements of an integer tensor whose value
///   is known at compile time, in row-major order.
/// - `symbolic_value` holds bounds and labels for each element of a 1D
///   integer tensor whose elements are dimension sizes, such as the output
///   of a `ShapeOf` operator.
///
/// When a value is known, the most concrete form available should be
/// provided.
#[derive(Clone, PartialEq)]
pub struct InputDescriptor {
    pub shape: PartialShape,
    pub element_type: ElementType,
    pub constant_value: Option<Vec<i64>>,
    pub symbolic_value: Option<Vec<Dimension>>,
}

impl InputDescriptor {
    /// Create a descriptor for a value with unknown contents.
    pub fn new(element_type: ElementType, shape: impl Into<PartialShape>) -> Self {
        InputDescriptor {
            shape: shape.into(),
            element_type,
            constant_value: None,
            symbolic_value: None,
        }
    }

    /// Create a descriptor for a 1D constant.
    pub fn constant(element_type: ElementType, values: Vec<i64>) -> Self {
        InputDescriptor {
            shape: PartialShape::fixed(&[values.len() as u64]),
            element_type,
            constant_value: Some(values),
            symbolic_value: None,
        }
    }

    /// Create a descriptor for a scalar constant.
    pub fn scalar(element_type: ElementType, value: i64) -> Self {
        InputDescriptor {
            shape: PartialShape::scalar(),
            element_type,
            constant_value: Some(vec![value]),
            symbolic_value: None,
        }
    }

    /// Create a descriptor for a 1D value whose elements are dimension sizes.
    ///
    /// If all the sizes are static, the descriptor also carries them as a
    /// constant value.
    pub fn symbolic(element_type: ElementType, values: Vec<Dimension>) -> Self {
        let constant_value = values
            .iter()
            .map(|v| v.size().and_then(|size| i64::try_from(size).ok()))
            .collect();
        InputDescriptor {
            shape: PartialShape::fixed(&[values.len() as u64]),
            element_type,
            constant_value,
            symbolic_value: Some(values),
        }
    }

    /// Return the rank of the value, if known.
    pub fn rank(&self) -> Option<usize> {
        self.shape.rank()
    }

    /// Return the number of elements of a 1D value, if known.
    pub fn num_values(&self) -> Option<u64> {
        match self.shape.dims() {
            Some([len]) => len.size(),
            _ => None,
        }
    }

    /// Return true if the elements of this value are known, either as
    /// constants or symbolically.
    pub fn has_value(&self) -> bool {
        self.constant_value.is_some() || self.symbolic_value.is_some()
    }

    /// Return the `index`th element of the value, if it is a known constant.
    pub fn value_at(&self, index: usize) -> Option<i64> {
        if let Some(values) = &self.constant_value {
            return values.get(index).copied();
        }
        let size = self.symbolic_value.as_ref()?.get(index)?.size()?;
        i64::try_from(size).ok()
    }

    /// Return the elements of the value as dimension sizes.
    ///
    /// Negative constants cannot be dimension sizes and make this return
    /// `None`.
    pub fn value_as_dims(&self) -> Option<Vec<Dimension>> {
        if let Some(dims) = &self.symbolic_value {
            return Some(dims.clone());
        }
        self.constant_value
            .as_ref()?
            .iter()
            .map(|&v| u64::try_from(v).ok().map(Dimension::fixed))
            .collect()
    }
}

impl fmt::Debug for InputDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element_type, self.shape)?;
        if let Some(values) = &self.symbolic_value {
            write!(f, " = {}", PartialShape::Static(values.clone()))?;
        } else if let Some(values) = &self.constant_value {
            write!(f, " = {:?}", values)?;
        }
        Ok(())
    }
}

impl fmt::Display for InputDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
