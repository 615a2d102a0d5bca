use tensor_ir_shape_inference::ops::{Broadcast, ReduceLogicalOr, ShapeOf, StridedSlice};
use tensor_ir_shape_inference::{InferShapes, InputDescriptor, LabelTable, ShapeInferenceError};

/// Operators which can appear in a [`Graph`](crate::Graph).
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    StridedSlice(StridedSlice),
    ShapeOf(ShapeOf),
    Broadcast(Broadcast),
    ReduceLogicalOr(ReduceLogicalOr),
}

impl Op {
    /// Return the operator type name, as used in graph descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Op::StridedSlice(_) => "StridedSlice",
            Op::ShapeOf(_) => "ShapeOf",
            Op::Broadcast(_) => "Broadcast",
            Op::ReduceLogicalOr(_) => "ReduceLogicalOr",
        }
    }

    fn as_infer_shapes(&self) -> &dyn InferShapes {
        match self {
            Op::StridedSlice(op) => op,
            Op::ShapeOf(op) => op,
            Op::Broadcast(op) => op,
            Op::ReduceLogicalOr(op) => op,
        }
    }
}

impl InferShapes for Op {
    fn infer_shapes(
        &self,
        inputs: &[InputDescriptor],
        labels: &LabelTable,
    ) -> Result<Vec<InputDescriptor>, ShapeInferenceError> {
        self.as_infer_shapes().infer_shapes(inputs, labels)
    }
}

macro_rules! impl_from_op {
    ($variant:ident) => {
        impl From<$variant> for Op {
            fn from(op: $variant) -> Op {
                Op::$variant(op)
            }
        }
    };
}

impl_from_op!(StridedSlice);
impl_from_op!(ShapeOf);
impl_from_op!(Broadcast);
impl_from_op!(ReduceLogicalOr);

#[cfg(test)]
mod tests {
    use tensor_ir_shape_inference::ops::{Broadcast, ShapeOf};
    use tensor_ir_shape_inference::{
        ElementType, InferShapes, InputDescriptor, LabelTable, PartialShape,
    };

    use super::Op;

    #[test]
    fn test_op_delegates_inference() {
        let labels = LabelTable::new();
        let op: Op = ShapeOf::default().into();
        assert_eq!(op.name(), "ShapeOf");

        let data = InputDescriptor::new(ElementType::F32, PartialShape::fixed(&[2, 3]));
        let outputs = op.infer_shapes(&[data], &labels).unwrap();
        assert_eq!(outputs[0].constant_value, Some(vec![2, 3]));

        let op: Op = Broadcast.into();
        assert_eq!(op.name(), "Broadcast");
        assert!(op.infer_shapes(&[], &labels).is_err());
    }
}
