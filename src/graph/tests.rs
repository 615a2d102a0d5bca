use tensor_ir_shape_inference::ops::{Broadcast, ReduceLogicalOr, ShapeOf, StridedSlice};
use tensor_ir_shape_inference::{
    Dimension, ElementType, MaskSet, PartialShape, ShapeInferenceError,
};
use tensor_ir_testing::TestCases;

use super::{Graph, GraphErrorKind, GraphOptions, NodeId, NodeKind};
use crate::op::Op;

fn options(parallel: bool) -> GraphOptions {
    GraphOptions {
        verbose: false,
        label_dynamic_dims: true,
        parallel,
    }
}

fn slice_op(num_axes: usize) -> Op {
    StridedSlice::new(MaskSet::zeros(num_axes)).into()
}

#[test]
fn test_graph_build_and_query() {
    let mut g = Graph::with_options(options(false));
    let x = g
        .add_parameter("x", ElementType::F32, PartialShape::fixed(&[2, 3]))
        .unwrap();
    let shape = g.add_op("shape", ShapeOf::default().into(), &[x]).unwrap();

    assert_eq!(g.len(), 2);
    assert_eq!(g.op_count(), 1);
    assert_eq!(g.node_id("shape").unwrap(), shape);
    assert_eq!(g.node_name(x).unwrap(), "x");
    assert_eq!(g.value_info(shape).unwrap().constant_value, Some(vec![2, 3]));

    let node = g.get_node(shape).unwrap();
    let op = node.as_operator().unwrap();
    assert_eq!(op.inputs(), &[x]);
    assert_eq!(op.op().name(), "ShapeOf");
    assert_eq!(op.level(), 1);

    let names: Vec<_> = g.iter().map(|(_, node)| node.name()).collect();
    assert_eq!(names, ["x", "shape"]);
}

#[test]
fn test_graph_debug() {
    let mut g = Graph::with_options(options(false));
    let x = g
        .add_parameter("x", ElementType::F32, PartialShape::fixed(&[2, 3]))
        .unwrap();
    g.add_op("shape", ShapeOf::default().into(), &[x]).unwrap();

    let debug = format!("{:?}", g);
    assert!(debug.starts_with(r#"{"x": f32 [2,3], "shape": "#));
    assert!(debug.ends_with('}'));
}

#[test]
fn test_parameter_dims_are_labelled() {
    let mut g = Graph::with_options(options(false));
    let shape: PartialShape = "[?,3,1..8]".parse().unwrap();
    let x = g.add_parameter("x", ElementType::F32, shape).unwrap();

    let dims = g.value_info(x).unwrap().shape.dims().unwrap().to_vec();
    assert!(dims[0].label().is_some());
    assert_eq!(dims[1].label(), None);
    assert!(dims[2].label().is_some());
    assert_ne!(dims[0].label(), dims[2].label());

    let mut g = Graph::with_options(GraphOptions {
        label_dynamic_dims: false,
        ..options(false)
    });
    let shape: PartialShape = "[?,3]".parse().unwrap();
    let x = g.add_parameter("x", ElementType::F32, shape).unwrap();
    let dims = g.value_info(x).unwrap().shape.dims().unwrap().to_vec();
    assert_eq!(dims[0].label(), None);
}

// The label of the batch dimension flows from the parameter through its
// shape into the output of the broadcast.
#[test]
fn test_label_flows_through_graph() {
    let mut g = Graph::with_options(options(false));
    let image = g
        .add_parameter(
            "image",
            ElementType::F32,
            "[?,3,224,224]".parse().unwrap(),
        )
        .unwrap();
    let scalar = g
        .add_parameter("scale", ElementType::F32, PartialShape::fixed(&[1]))
        .unwrap();
    let shape = g.add_op("shape", ShapeOf::default().into(), &[image]).unwrap();
    let begin = g.add_constant("begin", ElementType::I64, vec![0]).unwrap();
    let end = g.add_constant("end", ElementType::I64, vec![1]).unwrap();
    let batch = g
        .add_op("batch", slice_op(1), &[shape, begin, end])
        .unwrap();
    let out = g
        .add_op("out", Broadcast.into(), &[scalar, batch])
        .unwrap();

    let batch_label = g.value_info(image).unwrap().shape.dim(0).unwrap().label();
    assert!(batch_label.is_some());

    let out_info = g.value_info(out).unwrap();
    assert_eq!(out_info.shape.rank(), Some(1));
    assert_eq!(out_info.shape.dim(0).unwrap().label(), batch_label);
    assert_eq!(g.get_node(out).unwrap().as_operator().unwrap().level(), 3);
}

#[test]
fn test_add_op_failure_leaves_graph_unchanged() {
    let mut g = Graph::with_options(options(false));
    let data = g
        .add_parameter("data", ElementType::F32, PartialShape::fixed(&[4]))
        .unwrap();
    let begin = g.add_constant("begin", ElementType::I64, vec![0]).unwrap();
    let end = g.add_constant("end", ElementType::I64, vec![1]).unwrap();
    let stride = g.add_constant("stride", ElementType::I64, vec![0]).unwrap();

    let err = g
        .add_op("slice", slice_op(1), &[data, begin, end, stride])
        .unwrap_err();
    assert_eq!(err.kind(), GraphErrorKind::InferenceError);
    assert_eq!(err.node_name(), Some("slice"));
    assert_eq!(
        err.inference_error(),
        Some(&ShapeInferenceError::ZeroStride { axis: 0 })
    );
    assert!(g.node_id("slice").is_err());
    assert_eq!(g.len(), 4);
    assert_eq!(g.op_count(), 0);
}

#[test]
fn test_invalid_graph_operations() {
    let mut g = Graph::with_options(options(false));
    let x = g
        .add_parameter("x", ElementType::Boolean, PartialShape::fixed(&[2]))
        .unwrap();

    let err = g
        .add_constant("x", ElementType::I64, vec![1])
        .unwrap_err();
    assert_eq!(err.kind(), GraphErrorKind::InvalidGraph);

    let missing = NodeId::from_u32(10).unwrap();
    let err = g
        .add_op("reduce", ReduceLogicalOr::default().into(), &[x, missing])
        .unwrap_err();
    assert_eq!(err.kind(), GraphErrorKind::NodeNotFound);

    let err = g.node_id("y").unwrap_err();
    assert_eq!(err.kind(), GraphErrorKind::NodeNotFound);
    assert_eq!(err.node_name(), Some("y"));

    // Boolean parameters cannot hold a constant index value.
    let err = g.set_constant(x, vec![0, 1]).unwrap_err();
    assert_eq!(err.kind(), GraphErrorKind::InvalidGraph);
}

#[test]
fn test_set_constant_errors() {
    let mut g = Graph::with_options(options(false));
    let axes = g
        .add_parameter("axes", ElementType::I64, PartialShape::fixed(&[2]))
        .unwrap();
    let c = g.add_constant("c", ElementType::I64, vec![1]).unwrap();

    let err = g.set_constant(c, vec![2]).unwrap_err();
    assert_eq!(err.kind(), GraphErrorKind::InvalidGraph);
    assert_eq!(err.node_name(), Some("c"));

    let err = g.set_constant(axes, vec![0, 1, 2]).unwrap_err();
    assert_eq!(err.kind(), GraphErrorKind::InvalidGraph);

    g.set_constant(axes, vec![0, 1]).unwrap();
    assert!(matches!(g.get_node(axes).unwrap().kind(), NodeKind::Constant));
    assert_eq!(g.value_info(axes).unwrap().constant_value, Some(vec![0, 1]));
}

#[test]
fn test_reinfer_after_set_constant() {
    #[derive(Debug)]
    struct Case {
        parallel: bool,
    }

    let cases = [Case { parallel: false }, Case { parallel: true }];

    cases.test_each(|case| {
        let mut g = Graph::with_options(options(case.parallel));
        let data = g
            .add_parameter("data", ElementType::F32, PartialShape::fixed(&[4, 5]))
            .unwrap();
        let begin = g
            .add_parameter("begin", ElementType::I64, PartialShape::fixed(&[1]))
            .unwrap();
        let end = g.add_constant("end", ElementType::I64, vec![3]).unwrap();
        let stride = g.add_constant("stride", ElementType::I64, vec![1]).unwrap();
        let slice = g
            .add_op("slice", slice_op(1), &[data, begin, end, stride])
            .unwrap();
        let shape = g.add_op("shape", ShapeOf::default().into(), &[slice]).unwrap();

        let before = g.value_info(slice).unwrap().shape.clone();
        assert_eq!(
            before,
            PartialShape::from(vec![Dimension::new(0, 4), Dimension::fixed(5)])
        );
        assert_eq!(g.value_info(shape).unwrap().constant_value, None);

        g.set_constant(begin, vec![1]).unwrap();
        g.reinfer().unwrap();

        let after = g.value_info(slice).unwrap().shape.clone();
        assert_eq!(after, PartialShape::fixed(&[2, 5]));
        assert!(before.relaxes(&after));
        assert_eq!(g.value_info(shape).unwrap().constant_value, Some(vec![2, 5]));
    });
}

#[test]
fn test_reinfer_is_stable() {
    let mut g = Graph::with_options(options(true));
    let x = g
        .add_parameter("x", ElementType::Boolean, "[?,4,2..6]".parse().unwrap())
        .unwrap();
    let axes = g.add_constant("axes", ElementType::I64, vec![1]).unwrap();
    let reduce = g
        .add_op(
            "reduce",
            ReduceLogicalOr { keep_dims: true }.into(),
            &[x, axes],
        )
        .unwrap();

    let before = g.value_info(reduce).unwrap().clone();
    g.reinfer().unwrap();
    assert_eq!(g.value_info(reduce).unwrap(), &before);
}
