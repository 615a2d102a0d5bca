//! Shape inference for individual operators.

use crate::dimension::{Dimension, Incompatible};
use crate::element_type::ElementType;
use crate::error::{Operand, ShapeInferenceError};
use crate::infer_shapes::{check_input_count, check_integral, check_rank, InferShapes};
use crate::input_desc::InputDescriptor;
use crate::label::LabelTable;
use crate::partial_shape::PartialShape;

mod reduce;
mod strided_slice;

pub use reduce::ReduceLogicalOr;
pub use strided_slice::{infer as infer_strided_slice, StridedSlice};

/// ShapeOf operator.
///
/// Returns a 1D value containing the shape of the input. The elements of the
/// output are the input's dimensions, so their bounds and labels are carried
/// as a symbolic value.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeOf {
    /// Element type of the output. Must be `i32` or `i64`.
    pub output_type: ElementType,
}

impl Default for ShapeOf {
    fn default() -> Self {
        ShapeOf {
            output_type: ElementType::I64,
        }
    }
}

impl InferShapes for ShapeOf {
    fn infer_shapes(
        &self,
        inputs: &[InputDescriptor],
        _labels: &LabelTable,
    ) -> Result<Vec<InputDescriptor>, ShapeInferenceError> {
        check_input_count(inputs, 1, 1)?;
        if !matches!(self.output_type, ElementType::I32 | ElementType::I64) {
            return Err(ShapeInferenceError::ElementTypeMismatch {
                operand: Operand::Data,
                expected: ElementType::I64,
                actual: self.output_type,
            });
        }

        let output = match inputs[0].shape.dims() {
            Some(dims) => InputDescriptor::symbolic(self.output_type, dims.to_vec()),
            None => InputDescriptor::new(
                self.output_type,
                PartialShape::Static(vec![Dimension::dynamic()]),
            ),
        };
        Ok([output].into())
    }
}

/// Broadcast operator with NumPy-style broadcasting to an explicit target
/// shape.
///
/// Takes inputs `data, target_shape`. The output has the shape given by the
/// value of `target_shape`, and each dimension of `data` must either be 1 or
/// equal to the corresponding (right-aligned) target dimension.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Broadcast;

impl InferShapes for Broadcast {
    fn infer_shapes(
        &self,
        inputs: &[InputDescriptor],
        labels: &LabelTable,
    ) -> Result<Vec<InputDescriptor>, ShapeInferenceError> {
        check_input_count(inputs, 2, 2)?;
        let [data, target] = inputs else {
            return Err(ShapeInferenceError::IncorrectInputCount {
                expected: 2,
                actual: inputs.len(),
            });
        };
        check_integral(target, Operand::TargetShape)?;
        check_rank(target, Operand::TargetShape, 1)?;

        let target_dims = match (target.value_as_dims(), target.num_values()) {
            (Some(dims), _) => dims,

            // If the length of the target is known but not the values, the
            // output rank is known. Dimensions where the input cannot be 1
            // must have the input's size.
            (None, Some(len)) => (0..len)
                .map(|_| Dimension::dynamic().with_label(labels.fresh()))
                .collect(),

            (None, None) => {
                let output = InputDescriptor::new(data.element_type, PartialShape::Dynamic);
                return Ok([output].into());
            }
        };
        let known_values = target.value_as_dims().is_some();

        let Some(data_dims) = data.shape.dims() else {
            return Ok([InputDescriptor::new(data.element_type, target_dims)].into());
        };

        let Some(pad) = target_dims.len().checked_sub(data_dims.len()) else {
            return Err(Incompatible {
                lhs: Dimension::fixed(data_dims.len() as u64),
                rhs: Dimension::fixed(target_dims.len() as u64),
            }
            .into());
        };

        let mut out_dims = target_dims;
        for (out_dim, data_dim) in out_dims[pad..].iter_mut().zip(data_dims) {
            if data_dim.contains(1) {
                // Input may be broadcast, so its size says nothing about the
                // output.
                continue;
            }
            *out_dim = if known_values {
                out_dim.merge(data_dim)?
            } else {
                data_dim.clone()
            };
        }

        Ok([InputDescriptor::new(data.element_type, out_dims)].into())
    }
}

#[cfg(test)]
mod tests {
    use tensor_ir_testing::TestCases;

    use super::{Broadcast, ShapeOf};
    use crate::dimension::Dimension;
    use crate::element_type::ElementType;
    use crate::error::ShapeInferenceError;
    use crate::infer_shapes::InferShapes;
    use crate::input_desc::InputDescriptor;
    use crate::label::LabelTable;
    use crate::masks::MaskSet;
    use crate::ops::StridedSlice;
    use crate::partial_shape::{shape, PartialShape};

    #[test]
    fn test_shape_of() {
        let labels = LabelTable::new();
        let batch = Dimension::at_least(1).with_label(labels.fresh());
        let data = InputDescriptor::new(ElementType::F32, vec![batch.clone(), 3.into()]);

        let result = ShapeOf::default().infer_shapes(&[data], &labels).unwrap();
        assert_eq!(result[0].shape, shape![2]);
        assert_eq!(result[0].element_type, ElementType::I64);
        assert_eq!(
            result[0].symbolic_value,
            Some(vec![batch, Dimension::fixed(3)])
        );
        assert_eq!(result[0].constant_value, None);

        let fixed = InputDescriptor::new(ElementType::F32, shape![2, 5]);
        let result = ShapeOf {
            output_type: ElementType::I32,
        }
        .infer_shapes(&[fixed], &labels)
        .unwrap();
        assert_eq!(result[0].constant_value, Some(vec![2, 5]));

        let unknown = InputDescriptor::new(ElementType::F32, PartialShape::Dynamic);
        let result = ShapeOf::default().infer_shapes(&[unknown.clone()], &labels).unwrap();
        assert_eq!(result[0].shape, shape![0..]);
        assert!(!result[0].has_value());

        let err = ShapeOf {
            output_type: ElementType::F32,
        }
        .infer_shapes(&[unknown], &labels)
        .unwrap_err();
        assert!(matches!(err, ShapeInferenceError::ElementTypeMismatch { .. }));
    }

    #[test]
    fn test_broadcast() {
        #[derive(Debug)]
        struct Case {
            data: PartialShape,
            target: InputDescriptor,
            expected: PartialShape,
        }

        let cases = [
            Case {
                data: shape![1],
                target: InputDescriptor::constant(ElementType::I64, vec![3]),
                expected: shape![3],
            },
            Case {
                data: shape![4, 1],
                target: InputDescriptor::constant(ElementType::I64, vec![2, 4, 5]),
                expected: shape![2, 4, 5],
            },
            // Data dims which cannot be 1 refine a dynamic target.
            Case {
                data: shape![4, 0..=1],
                target: InputDescriptor::symbolic(
                    ElementType::I64,
                    vec![Dimension::dynamic(), Dimension::dynamic()],
                ),
                expected: shape![4, 0..],
            },
            // Target of known length but unknown values.
            Case {
                data: shape![6],
                target: InputDescriptor::new(ElementType::I64, shape![2]),
                expected: shape![0.., 6],
            },
            Case {
                data: shape![6],
                target: InputDescriptor::new(ElementType::I64, shape![0..]),
                expected: PartialShape::Dynamic,
            },
            Case {
                data: PartialShape::Dynamic,
                target: InputDescriptor::constant(ElementType::I64, vec![7, 2]),
                expected: shape![7, 2],
            },
        ];

        cases.test_each(|case| {
            let labels = LabelTable::new();
            let data = InputDescriptor::new(ElementType::F32, case.data.clone());
            let result = Broadcast
                .infer_shapes(&[data, case.target.clone()], &labels)
                .unwrap();
            assert_eq!(result[0].element_type, ElementType::F32);
            // Compare without the labels minted for unknown target values.
            let shape = match &result[0].shape {
                PartialShape::Static(dims) => {
                    dims.iter().cloned().map(|d| d.without_label()).collect()
                }
                PartialShape::Dynamic => PartialShape::Dynamic,
            };
            assert_eq!(shape, case.expected);
        });
    }

    #[test]
    fn test_broadcast_unknown_values_get_labels() {
        let labels = LabelTable::new();
        let data = InputDescriptor::new(ElementType::F32, shape![1]);
        let target = InputDescriptor::new(ElementType::I64, shape![2]);
        let result = Broadcast.infer_shapes(&[data, target], &labels).unwrap();
        let dims = result[0].shape.dims().unwrap();
        assert!(dims[0].label().is_some());
        assert!(dims[1].label().is_some());
        assert_ne!(dims[0].label(), dims[1].label());
    }

    #[test]
    fn test_broadcast_invalid() {
        let labels = LabelTable::new();

        let data = InputDescriptor::new(ElementType::F32, shape![3, 4]);
        let target = InputDescriptor::constant(ElementType::I64, vec![4]);
        let err = Broadcast
            .infer_shapes(&[data.clone(), target], &labels)
            .unwrap_err();
        assert!(matches!(err, ShapeInferenceError::IncompatibleDimensions(_)));

        let target = InputDescriptor::constant(ElementType::I64, vec![2, 5]);
        let err = Broadcast
            .infer_shapes(&[data.clone(), target], &labels)
            .unwrap_err();
        assert!(matches!(err, ShapeInferenceError::IncompatibleDimensions(_)));

        let target = InputDescriptor::new(ElementType::F32, shape![2]);
        let err = Broadcast.infer_shapes(&[data, target], &labels).unwrap_err();
        assert!(matches!(
            err,
            ShapeInferenceError::ElementTypeNotIntegral { .. }
        ));
    }

    // ShapeOf -> StridedSlice -> Broadcast keeps the label of the selected
    // dimension.
    #[test]
    fn test_label_propagates_through_sliced_shape() {
        let labels = LabelTable::new();
        let marked = labels.fresh();
        let source = InputDescriptor::new(
            ElementType::F32,
            vec![Dimension::fixed(3).with_label(marked), 4.into()],
        );
        let shape_of = ShapeOf::default().infer_shapes(&[source], &labels).unwrap();

        let consts = |v: i64| InputDescriptor::constant(ElementType::I64, vec![v]);
        let slice = StridedSlice::new(MaskSet::zeros(1))
            .infer_shapes(&[shape_of[0].clone(), consts(0), consts(1), consts(1)], &labels)
            .unwrap();

        let param = InputDescriptor::new(ElementType::F32, shape![1]);
        let result = Broadcast
            .infer_shapes(&[param, slice[0].clone()], &labels)
            .unwrap();
        assert_eq!(result[0].shape.to_fixed(), Some(vec![3]));
        assert_eq!(result[0].shape.dim(0).and_then(|d| d.label()), Some(marked));
    }
}
