use crate::dimension::Dimension;
use crate::element_type::ElementType;
use crate::error::{Operand, ShapeInferenceError};
use crate::infer_shapes::{
    check_element_type, check_input_count, check_integral, resolve_axes, InferShapes,
};
use crate::input_desc::InputDescriptor;
use crate::label::LabelTable;
use crate::partial_shape::PartialShape;

/// Logical OR reduction over a set of axes.
///
/// Takes inputs `data, axes`. `data` must be boolean and `axes` a scalar or
/// 1D integer tensor. Negative axes count back from the last dimension.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReduceLogicalOr {
    /// True if reduced axes are kept as size-1 dimensions in the output.
    pub keep_dims: bool,
}

impl InferShapes for ReduceLogicalOr {
    fn infer_shapes(
        &self,
        inputs: &[InputDescriptor],
        _labels: &LabelTable,
    ) -> Result<Vec<InputDescriptor>, ShapeInferenceError> {
        check_input_count(inputs, 2, 2)?;
        let [data, axes] = inputs else {
            return Err(ShapeInferenceError::IncorrectInputCount {
                expected: 2,
                actual: inputs.len(),
            });
        };

        check_element_type(data, Operand::Data, ElementType::Boolean)?;
        check_integral(axes, Operand::Axes)?;
        if let Some(rank) = axes.rank().filter(|&rank| rank > 1) {
            return Err(ShapeInferenceError::RankMismatch {
                operand: Operand::Axes,
                expected: 1,
                actual: rank,
            });
        }

        let Some(data_dims) = data.shape.dims() else {
            return boolean_output(PartialShape::Dynamic);
        };

        let Some(axes) = &axes.constant_value else {
            if !self.keep_dims {
                return boolean_output(PartialShape::Dynamic);
            }

            // Any axis may be reduced to size 1.
            let dims = data_dims
                .iter()
                .map(|dim| {
                    let min = dim.min().min(1);
                    let max = dim.max().map(|max| max.max(1));
                    Dimension::from_bounds(min, max).unwrap_or_default()
                })
                .collect();
            return boolean_output(PartialShape::Static(dims));
        };

        let axes = resolve_axes(data_dims.len(), axes)?;
        let mut out_dims = Vec::with_capacity(data_dims.len());
        for (i, dim) in data_dims.iter().enumerate() {
            if !axes.contains(&i) {
                out_dims.push(dim.clone());
            } else if self.keep_dims {
                out_dims.push(Dimension::fixed(1));
            }
        }
        boolean_output(PartialShape::Static(out_dims))
    }
}

fn boolean_output(shape: PartialShape) -> Result<Vec<InputDescriptor>, ShapeInferenceError> {
    Ok([InputDescriptor::new(ElementType::Boolean, shape)].into())
}

#[cfg(test)]
mod tests {
    use tensor_ir_testing::TestCases;

    use super::ReduceLogicalOr;
    use crate::dimension::Dimension;
    use crate::element_type::ElementType;
    use crate::error::{Operand, ShapeInferenceError};
    use crate::infer_shapes::InferShapes;
    use crate::input_desc::InputDescriptor;
    use crate::label::LabelTable;
    use crate::partial_shape::{shape, PartialShape};

    #[test]
    fn test_reduce_logical_or() {
        #[derive(Debug)]
        struct Case {
            data: PartialShape,
            axes: InputDescriptor,
            keep_dims: bool,
            expected: PartialShape,
        }

        let axes = |values: &[i64]| InputDescriptor::constant(ElementType::I64, values.to_vec());

        let cases = [
            Case {
                data: shape![2, 3, 4],
                axes: axes(&[1]),
                keep_dims: false,
                expected: shape![2, 4],
            },
            Case {
                data: shape![2, 3, 4],
                axes: axes(&[0, -1]),
                keep_dims: true,
                expected: shape![1, 3, 1],
            },
            Case {
                data: shape![2, 3, 4],
                axes: InputDescriptor::scalar(ElementType::I32, 2),
                keep_dims: false,
                expected: shape![2, 3],
            },
            Case {
                data: shape![2, 3, 4],
                axes: axes(&[]),
                keep_dims: false,
                expected: shape![2, 3, 4],
            },
            // Unknown axes.
            Case {
                data: shape![0..=5, 3],
                axes: InputDescriptor::new(ElementType::I64, shape![1]),
                keep_dims: true,
                expected: shape![0..=5, 1..=3],
            },
            Case {
                data: shape![2, 3],
                axes: InputDescriptor::new(ElementType::I64, shape![1]),
                keep_dims: false,
                expected: PartialShape::Dynamic,
            },
            Case {
                data: PartialShape::Dynamic,
                axes: axes(&[0]),
                keep_dims: true,
                expected: PartialShape::Dynamic,
            },
        ];

        cases.test_each(|case| {
            let labels = LabelTable::new();
            let data = InputDescriptor::new(ElementType::Boolean, case.data.clone());
            let op = ReduceLogicalOr {
                keep_dims: case.keep_dims,
            };
            let result = op.infer_shapes(&[data, case.axes.clone()], &labels).unwrap();
            assert_eq!(result[0].shape, case.expected);
            assert_eq!(result[0].element_type, ElementType::Boolean);
        });
    }

    #[test]
    fn test_reduce_keeps_labels_of_other_axes() {
        let labels = LabelTable::new();
        let batch = Dimension::at_least(1).with_label(labels.fresh());
        let data = InputDescriptor::new(ElementType::Boolean, vec![batch.clone(), 8.into()]);
        let axes = InputDescriptor::constant(ElementType::I64, vec![1]);
        let result = ReduceLogicalOr { keep_dims: false }
            .infer_shapes(&[data, axes], &labels)
            .unwrap();
        assert_eq!(result[0].shape, PartialShape::from(vec![batch]));
    }

    #[test]
    fn test_reduce_invalid() {
        let labels = LabelTable::new();
        let op = ReduceLogicalOr { keep_dims: false };
        let axes = InputDescriptor::constant(ElementType::I64, vec![3]);

        let data = InputDescriptor::new(ElementType::F32, shape![2, 3]);
        let err = op.infer_shapes(&[data, axes.clone()], &labels).unwrap_err();
        assert_eq!(
            err,
            ShapeInferenceError::ElementTypeMismatch {
                operand: Operand::Data,
                expected: ElementType::Boolean,
                actual: ElementType::F32,
            }
        );

        let data = InputDescriptor::new(ElementType::Boolean, shape![2, 3]);
        let err = op.infer_shapes(&[data.clone(), axes], &labels).unwrap_err();
        assert_eq!(err, ShapeInferenceError::AxisOutOfRange { axis: 3, rank: 2 });

        let float_axes = InputDescriptor::new(ElementType::F32, shape![1]);
        let err = op
            .infer_shapes(&[data.clone(), float_axes], &labels)
            .unwrap_err();
        assert!(matches!(
            err,
            ShapeInferenceError::ElementTypeNotIntegral {
                operand: Operand::Axes,
                ..
            }
        ));

        let matrix_axes = InputDescriptor::new(ElementType::I64, shape![1, 1]);
        let err = op.infer_shapes(&[data, matrix_axes], &labels).unwrap_err();
        assert!(matches!(err, ShapeInferenceError::RankMismatch { .. }));
    }
}
