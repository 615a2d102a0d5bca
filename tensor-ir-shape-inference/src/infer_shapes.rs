//! The shape inference trait and helpers shared by operator implementations.

use smallvec::SmallVec;

use crate::element_type::ElementType;
use crate::error::{Operand, ShapeInferenceError};
use crate::input_desc::InputDescriptor;
use crate::label::LabelTable;

/// Infer the types and shapes of an operator's outputs given its inputs.
pub trait InferShapes {
    /// Infer the element types, shapes and optionally values of an
    /// operator's outputs given its inputs.
    ///
    /// The operator may need to create labels for output dimensions that
    /// have a new symbolic origin. These should be allocated from `labels`.
    ///
    /// Implementations must be deterministic given the same inputs and label
    /// table state, and must return results at least as precise when called
    /// again with more precise inputs.
    fn infer_shapes(
        &self,
        inputs: &[InputDescriptor],
        labels: &LabelTable,
    ) -> Result<Vec<InputDescriptor>, ShapeInferenceError>;
}

/// Resolve an index given as a value in `[-len, len-1]` to a positive index in
/// `[0, len)`, or return None if the index is out of bounds.
fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let len = len.min(i64::MAX as usize) as i64;
    if index < -len || index >= len {
        return None;
    }

    if index >= 0 {
        Some(index as usize)
    } else {
        Some((len + index) as usize)
    }
}

/// Resolve an axis given as a value in `[-ndim, ndim-1]` to the zero-based
/// dimension of a tensor with `ndim` dimensions.
pub(crate) fn resolve_axis(ndim: usize, axis: i64) -> Result<usize, ShapeInferenceError> {
    resolve_index(ndim, axis).ok_or(ShapeInferenceError::AxisOutOfRange { axis, rank: ndim })
}

/// Resolve a sequence of axes to sorted, de-duplicated dimension indexes.
pub(crate) fn resolve_axes(
    ndim: usize,
    axes: &[i64],
) -> Result<SmallVec<[usize; 4]>, ShapeInferenceError> {
    let mut resolved: SmallVec<[usize; 4]> = axes
        .iter()
        .map(|&axis| resolve_axis(ndim, axis))
        .collect::<Result<_, _>>()?;
    resolved.sort();
    resolved.dedup();
    Ok(resolved)
}

/// Check that an operand which carries indices has an integral type.
pub(crate) fn check_integral(
    input: &InputDescriptor,
    operand: Operand,
) -> Result<(), ShapeInferenceError> {
    if input.element_type.may_be_integral() {
        Ok(())
    } else {
        Err(ShapeInferenceError::ElementTypeNotIntegral {
            operand,
            element_type: input.element_type,
        })
    }
}

/// Check that an operand has the expected element type.
pub(crate) fn check_element_type(
    input: &InputDescriptor,
    operand: Operand,
    expected: ElementType,
) -> Result<(), ShapeInferenceError> {
    if input.element_type.compatible(expected) {
        Ok(())
    } else {
        Err(ShapeInferenceError::ElementTypeMismatch {
            operand,
            expected,
            actual: input.element_type,
        })
    }
}

/// Check that an operand has the expected rank, if its rank is known.
pub(crate) fn check_rank(
    input: &InputDescriptor,
    operand: Operand,
    expected: usize,
) -> Result<(), ShapeInferenceError> {
    match input.rank() {
        Some(actual) if actual != expected => Err(ShapeInferenceError::RankMismatch {
            operand,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Check that the number of inputs is in `[min, max]`.
pub(crate) fn check_input_count(
    inputs: &[InputDescriptor],
    min: usize,
    max: usize,
) -> Result<(), ShapeInferenceError> {
    if inputs.len() < min || inputs.len() > max {
        let expected = if inputs.len() < min { min } else { max };
        return Err(ShapeInferenceError::IncorrectInputCount {
            expected,
            actual: inputs.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tensor_ir_testing::TestCases;

    use super::{check_input_count, check_integral, check_rank, resolve_axes, resolve_axis};
    use crate::element_type::ElementType;
    use crate::error::{Operand, ShapeInferenceError};
    use crate::input_desc::InputDescriptor;
    use crate::partial_shape::{shape, PartialShape};

    #[test]
    fn test_resolve_axis() {
        #[derive(Debug)]
        struct Case {
            ndim: usize,
            axis: i64,
            expected: Option<usize>,
        }

        let cases = [
            Case {
                ndim: 3,
                axis: 0,
                expected: Some(0),
            },
            Case {
                ndim: 3,
                axis: -1,
                expected: Some(2),
            },
            Case {
                ndim: 3,
                axis: -3,
                expected: Some(0),
            },
            Case {
                ndim: 3,
                axis: 3,
                expected: None,
            },
            Case {
                ndim: 3,
                axis: -4,
                expected: None,
            },
            Case {
                ndim: 0,
                axis: 0,
                expected: None,
            },
        ];

        cases.test_each(|case| {
            let result = resolve_axis(case.ndim, case.axis);
            match case.expected {
                Some(axis) => assert_eq!(result, Ok(axis)),
                None => assert_eq!(
                    result,
                    Err(ShapeInferenceError::AxisOutOfRange {
                        axis: case.axis,
                        rank: case.ndim
                    })
                ),
            }
        });
    }

    #[test]
    fn test_resolve_axes() {
        let axes = resolve_axes(4, &[-1, 1, 3]).unwrap();
        assert_eq!(axes.as_slice(), &[1, 3]);
    }

    #[test]
    fn test_checks() {
        let begin = InputDescriptor::new(ElementType::F16, shape![4]);
        assert_eq!(
            check_integral(&begin, Operand::Begin),
            Err(ShapeInferenceError::ElementTypeNotIntegral {
                operand: Operand::Begin,
                element_type: ElementType::F16,
            })
        );
        let dynamic = InputDescriptor::new(ElementType::Dynamic, PartialShape::Dynamic);
        assert!(check_integral(&dynamic, Operand::Begin).is_ok());
        assert!(check_rank(&dynamic, Operand::Begin, 1).is_ok());

        let matrix = InputDescriptor::new(ElementType::I64, shape![4, 5]);
        assert_eq!(
            check_rank(&matrix, Operand::Begin, 1),
            Err(ShapeInferenceError::RankMismatch {
                operand: Operand::Begin,
                expected: 1,
                actual: 2,
            })
        );

        assert_eq!(
            check_input_count(&[matrix.clone()], 3, 4),
            Err(ShapeInferenceError::IncorrectInputCount {
                expected: 3,
                actual: 1
            })
        );
        assert!(check_input_count(&[matrix.clone(), matrix], 2, 2).is_ok());
    }
}
