//! tensor-ir is a graph representation for tensor programs, with shape and
//! type inference.
//!
//! # Building graphs
//!
//! A [`Graph`] is built by adding parameters (inputs whose values are
//! supplied later), constants and operators. The output type and shape of
//! each operator is inferred when it is added, using the descriptions of its
//! inputs. If inference fails, for example because the inputs have
//! incompatible shapes, the operator is not added and an error describing
//! the problem is returned.
//!
//! ```
//! use tensor_ir::{Graph, Op};
//! use tensor_ir::shape_inference::ops::ShapeOf;
//! use tensor_ir::shape_inference::{ElementType, PartialShape};
//!
//! let mut graph = Graph::new();
//! let image = graph
//!     .add_parameter("image", ElementType::F32, "[?,3,224,224]".parse().unwrap())
//!     .unwrap();
//! let shape = graph
//!     .add_op("shape", Op::ShapeOf(ShapeOf::default()), &[image])
//!     .unwrap();
//! assert_eq!(
//!     graph.value_info(shape).unwrap().shape,
//!     PartialShape::fixed(&[4])
//! );
//! ```
//!
//! # Dynamic dimensions
//!
//! Parameters may have dimensions whose size is unknown or only bounded.
//! By default each such dimension is given a unique label when the parameter
//! is added. Labels are carried through operators which preserve the size of
//! a dimension, so that two values can be proven to have the same size even
//! when that size is not known.
//!
//! When more information about a parameter becomes available, it can be
//! replaced by a constant with [`Graph::set_constant`] and the graph
//! re-inferred with [`Graph::reinfer`].
//!
//! # Configuration
//!
//! Graph behavior is controlled by [`GraphOptions`]. The default options
//! are read from the `TIR_VERBOSE`, `TIR_LABEL_DIMS` and `TIR_PARALLEL`
//! environment variables.

mod env;
mod graph;
mod iter_util;
mod op;

pub use graph::{
    Graph, GraphError, GraphErrorKind, GraphOptions, Node, NodeId, NodeKind, OperatorNode,
};
pub use op::Op;

/// Shape and type inference for individual operators.
pub use tensor_ir_shape_inference as shape_inference;
