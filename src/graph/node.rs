use smallvec::SmallVec;
use tensor_ir_shape_inference::InputDescriptor;

use super::NodeId;
use crate::op::Op;

/// A node in a [`Graph`](crate::Graph) together with the inferred type,
/// shape and value of its output.
#[derive(Clone, Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
    value: InputDescriptor,
}

impl Node {
    pub(crate) fn new(name: &str, kind: NodeKind, value: InputDescriptor) -> Self {
        Node {
            name: name.to_string(),
            kind,
            value,
        }
    }

    /// Return the unique name of this node.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Return what is known about the value this node produces.
    pub fn value_info(&self) -> &InputDescriptor {
        &self.value
    }

    /// Return the contained operator, if this an operator node.
    pub fn as_operator(&self) -> Option<&OperatorNode> {
        match &self.kind {
            NodeKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub(crate) fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub(crate) fn set_value_info(&mut self, value: InputDescriptor) {
        self.value = value;
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A graph input whose value is supplied at runtime.
    Parameter,
    /// A value which is known when the graph is built.
    Constant,
    Operator(OperatorNode),
}

#[derive(Clone, Debug)]
pub struct OperatorNode {
    op: Op,
    inputs: SmallVec<[NodeId; 4]>,

    /// Length of the longest path from a parameter or constant to this
    /// node. Operators with the same level do not depend on each other.
    level: u32,
}

impl OperatorNode {
    pub(crate) fn new(op: Op, inputs: &[NodeId], level: u32) -> Self {
        OperatorNode {
            op,
            inputs: inputs.into(),
            level,
        }
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    /// Return the IDs of this operator's inputs.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}
