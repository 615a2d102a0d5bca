//! Errors reported by shape inference.

use std::error::Error;
use std::fmt;

use crate::dimension::Incompatible;
use crate::element_type::ElementType;

/// Operator input that an error relates to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    Data,
    Begin,
    End,
    Stride,
    Axes,
    TargetShape,
}

impl Operand {
    /// Lower-case name of the operand, as it appears in messages.
    pub fn name(self) -> &'static str {
        match self {
            Operand::Data => "data",
            Operand::Begin => "begin",
            Operand::End => "end",
            Operand::Stride => "stride",
            Operand::Axes => "axes",
            Operand::TargetShape => "target_shape",
        }
    }

    /// Name with the first letter capitalized, for the start of a message.
    fn title(self) -> &'static str {
        match self {
            Operand::Data => "Data",
            Operand::Begin => "Begin",
            Operand::End => "End",
            Operand::Stride => "Stride",
            Operand::Axes => "Axes",
            Operand::TargetShape => "Target shape",
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Identifies one of the five strided slice mask attributes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MaskKind {
    Begin,
    End,
    NewAxis,
    ShrinkAxis,
    Ellipsis,
}

impl MaskKind {
    pub const ALL: [MaskKind; 5] = [
        MaskKind::Begin,
        MaskKind::End,
        MaskKind::NewAxis,
        MaskKind::ShrinkAxis,
        MaskKind::Ellipsis,
    ];

    /// Attribute name of the mask.
    pub fn name(self) -> &'static str {
        match self {
            MaskKind::Begin => "begin_mask",
            MaskKind::End => "end_mask",
            MaskKind::NewAxis => "new_axis_mask",
            MaskKind::ShrinkAxis => "shrink_axis_mask",
            MaskKind::Ellipsis => "ellipsis_mask",
        }
    }
}

impl fmt::Display for MaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// General category of a [`ShapeInferenceError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The operator's inputs or attributes violate a structural constraint.
    /// Inference will fail again with the same inputs.
    Structural,

    /// There is not enough information to infer the output. Inference may
    /// succeed if the caller supplies more information, such as an explicit
    /// input instead of a default.
    Underconstrained,
}

/// Errors reported when inferring the output shapes and types of an operator.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeInferenceError {
    /// Too many or too few inputs were provided for this operator.
    IncorrectInputCount { expected: usize, actual: usize },

    /// An operand which holds indices has a non-integral element type.
    ElementTypeNotIntegral {
        operand: Operand,
        element_type: ElementType,
    },

    /// An operand has a different element type than the operator requires.
    ElementTypeMismatch {
        operand: Operand,
        expected: ElementType,
        actual: ElementType,
    },

    /// An operand's rank does not match that expected by the operator.
    RankMismatch {
        operand: Operand,
        expected: usize,
        actual: usize,
    },

    /// An operand's length differs from another operand which must have the
    /// same number of values.
    LengthMismatch {
        operand: Operand,
        reference: Operand,
        expected: u64,
        actual: u64,
    },

    /// The mask attributes do not all have the same length.
    MaskLengthMismatch {
        mask: MaskKind,
        expected: usize,
        actual: usize,
    },

    /// A mask attribute contains a value other than 0 or 1.
    MaskValueInvalid {
        mask: MaskKind,
        index: usize,
        value: i64,
    },

    /// More than one ellipsis was specified.
    MultipleEllipsis { count: usize },

    /// The slicing axes consume more data axes than the data has.
    TooManySlicingAxes { required: usize, rank: usize },

    /// A stride value is zero.
    ZeroStride { axis: usize },

    /// No stride input was given and its length could not be determined.
    CannotInferDefaultStride,

    /// An axis value is outside the valid range for the data rank.
    AxisOutOfRange { axis: i64, rank: usize },

    /// Two dimensions which must be equal have no size in common.
    IncompatibleDimensions(Incompatible),
}

impl ShapeInferenceError {
    /// Return the general category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CannotInferDefaultStride => ErrorKind::Underconstrained,
            _ => ErrorKind::Structural,
        }
    }
}

impl From<Incompatible> for ShapeInferenceError {
    fn from(err: Incompatible) -> Self {
        Self::IncompatibleDimensions(err)
    }
}

impl fmt::Display for ShapeInferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncorrectInputCount { expected, actual } => {
                write!(f, "expected {} inputs but got {}", expected, actual)
            }
            Self::ElementTypeNotIntegral {
                operand,
                element_type,
            } => write!(
                f,
                "{} input must be an integral number ({} element type: {}).",
                operand.title(),
                operand,
                element_type
            ),
            Self::ElementTypeMismatch {
                operand,
                expected,
                actual,
            } => write!(
                f,
                "{} input must have element type {} ({} element type: {}).",
                operand.title(),
                expected,
                operand,
                actual
            ),
            Self::RankMismatch {
                operand,
                expected,
                actual,
            } => write!(
                f,
                "{} input must be {}D ({} rank: {}).",
                operand.title(),
                expected,
                operand,
                actual
            ),
            Self::LengthMismatch {
                operand,
                reference,
                expected,
                actual,
            } => write!(
                f,
                "{} input must have {} values to match {} ({} length: {}).",
                operand.title(),
                expected,
                reference,
                operand,
                actual
            ),
            Self::MaskLengthMismatch {
                mask,
                expected,
                actual,
            } => write!(
                f,
                "All masks of StridedSlice must have the same size ({} has length {}, expected {}).",
                mask, actual, expected
            ),
            Self::MaskValueInvalid { mask, index, value } => write!(
                f,
                "All masks of StridedSlice must be 0 or 1 ({} has value {} at index {}).",
                mask, value, index
            ),
            Self::MultipleEllipsis { count } => write!(
                f,
                "Only one non-zero bit is allowed in ellipsis_mask (found {}).",
                count
            ),
            Self::TooManySlicingAxes { required, rank } => write!(
                f,
                "Slicing axes consume {} data axes but data rank is {}.",
                required, rank
            ),
            Self::ZeroStride { axis } => {
                write!(f, "Stride must be non-zero (stride is 0 at axis {}).", axis)
            }
            Self::CannotInferDefaultStride => write!(
                f,
                "Cannot infer default stride: begin input must be 1D with a static length."
            ),
            Self::AxisOutOfRange { axis, rank } => {
                write!(f, "Axis {} is out of range for data rank {}.", axis, rank)
            }
            Self::IncompatibleDimensions(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ShapeInferenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IncompatibleDimensions(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, MaskKind, Operand, ShapeInferenceError};
    use crate::dimension::{Dimension, Incompatible};
    use crate::element_type::ElementType;

    #[test]
    fn test_messages() {
        let err = ShapeInferenceError::ElementTypeNotIntegral {
            operand: Operand::Begin,
            element_type: ElementType::F16,
        };
        assert_eq!(
            err.to_string(),
            "Begin input must be an integral number (begin element type: f16)."
        );

        let err = ShapeInferenceError::RankMismatch {
            operand: Operand::End,
            expected: 1,
            actual: 2,
        };
        assert_eq!(err.to_string(), "End input must be 1D (end rank: 2).");

        let err = ShapeInferenceError::MaskLengthMismatch {
            mask: MaskKind::Ellipsis,
            expected: 4,
            actual: 5,
        };
        assert!(err.to_string().contains("ellipsis_mask has length 5"));
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            ShapeInferenceError::CannotInferDefaultStride.kind(),
            ErrorKind::Underconstrained
        );
        assert_eq!(
            ShapeInferenceError::MultipleEllipsis { count: 2 }.kind(),
            ErrorKind::Structural
        );

        let err: ShapeInferenceError = Incompatible {
            lhs: Dimension::fixed(1),
            rhs: Dimension::fixed(2),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(std::error::Error::source(&err).is_some());
    }
}
