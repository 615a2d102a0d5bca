//! JSON description of a graph.
//!
//! A graph file lists nodes in evaluation order. Each node has a unique name
//! and is either a parameter, a constant or an operator:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "name": "x", "parameter": { "element_type": "f32", "shape": "[?,3]" } },
//!     { "name": "begin", "constant": { "element_type": "i64", "values": [0] } },
//!     { "name": "shape", "op": { "type": "ShapeOf", "inputs": ["x"] } }
//!   ]
//! }
//! ```

use std::error::Error;

use serde::Deserialize;
use tensor_ir::shape_inference::ops::{Broadcast, ReduceLogicalOr, ShapeOf, StridedSlice};
use tensor_ir::shape_inference::{ElementType, MaskSet, PartialShape};
use tensor_ir::{Graph, GraphOptions, NodeId, Op};

use crate::dim_size::DimSize;

#[derive(Debug, Deserialize)]
pub struct GraphFile {
    pub nodes: Vec<NodeDesc>,
}

#[derive(Debug, Deserialize)]
pub struct NodeDesc {
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKindDesc,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKindDesc {
    Parameter {
        element_type: ElementType,

        /// Shape in the `[2,?,1..8]` syntax. Defaults to a shape of unknown
        /// rank.
        #[serde(default)]
        shape: Option<String>,
    },
    Constant {
        element_type: ElementType,
        values: Vec<i64>,
    },
    Op(OpDesc),
}

#[derive(Debug, Deserialize)]
pub struct OpDesc {
    /// Names of the operator's inputs.
    pub inputs: Vec<String>,

    #[serde(flatten)]
    pub op: OpType,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum OpType {
    StridedSlice {
        #[serde(default)]
        masks: MaskSet,
    },
    ShapeOf {
        #[serde(default)]
        output_type: Option<ElementType>,
    },
    Broadcast,
    ReduceLogicalOr {
        #[serde(default)]
        keep_dims: bool,
    },
}

impl OpType {
    fn to_op(&self) -> Op {
        match self {
            OpType::StridedSlice { masks } => StridedSlice::new(masks.clone()).into(),
            OpType::ShapeOf { output_type } => {
                let mut op = ShapeOf::default();
                if let Some(output_type) = output_type {
                    op.output_type = *output_type;
                }
                op.into()
            }
            OpType::Broadcast => Broadcast.into(),
            OpType::ReduceLogicalOr { keep_dims } => ReduceLogicalOr {
                keep_dims: *keep_dims,
            }
            .into(),
        }
    }
}

impl GraphFile {
    pub fn parse(json: &str) -> Result<GraphFile, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build a graph from this description.
    ///
    /// The dimensions of parameters are overridden by matching entries in
    /// `sizes`.
    pub fn build(&self, sizes: &[DimSize], options: GraphOptions) -> Result<Graph, Box<dyn Error>> {
        let mut graph = Graph::with_options(options);
        for node in &self.nodes {
            match &node.kind {
                NodeKindDesc::Parameter {
                    element_type,
                    shape,
                } => {
                    let shape = match shape {
                        Some(shape) => shape.parse().map_err(|err| {
                            format!("invalid shape for parameter \"{}\": {}", node.name, err)
                        })?,
                        None => PartialShape::Dynamic,
                    };
                    let shape = DimSize::apply(sizes, &node.name, shape);
                    graph.add_parameter(&node.name, *element_type, shape)?;
                }
                NodeKindDesc::Constant {
                    element_type,
                    values,
                } => {
                    graph.add_constant(&node.name, *element_type, values.clone())?;
                }
                NodeKindDesc::Op(desc) => {
                    let inputs = desc
                        .inputs
                        .iter()
                        .map(|name| graph.node_id(name))
                        .collect::<Result<Vec<NodeId>, _>>()?;
                    graph.add_op(&node.name, desc.op.to_op(), &inputs)?;
                }
            }
        }
        Ok(graph)
    }
}
