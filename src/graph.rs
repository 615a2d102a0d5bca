use std::fmt;
use std::iter::zip;

// The std HashMap provides DOS resistance. Keys here are node names from a
// trusted graph description, so we prefer faster hashing instead.
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tensor_ir_shape_inference::{
    ElementType, InferShapes, InputDescriptor, LabelTable, PartialShape,
};

use crate::env::env_flag;
use crate::iter_util::MaybeParIter;
use crate::op::Op;

mod error;
mod node;
mod node_id;

#[cfg(test)]
mod tests;

pub use error::{GraphError, GraphErrorKind};
use error::GraphErrorImpl;
pub use node::{Node, NodeKind, OperatorNode};
pub use node_id::NodeId;

/// Options which control graph construction and inference.
///
/// The default options are read from environment variables:
///
/// - `TIR_VERBOSE` enables a trace of each operator's inputs and outputs as
///   it is inferred (default: false).
/// - `TIR_LABEL_DIMS` gives each dynamic dimension of a parameter its own
///   label (default: true).
/// - `TIR_PARALLEL` runs inference for independent operators in parallel
///   when re-inferring a graph (default: true).
#[derive(Clone, Debug, PartialEq)]
pub struct GraphOptions {
    /// Print each operator's inputs and outputs as it is inferred.
    pub verbose: bool,

    /// Label the dynamic dimensions of parameters when they are added.
    pub label_dynamic_dims: bool,

    /// Use parallelism in [`Graph::reinfer`].
    pub parallel: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        GraphOptions {
            verbose: env_flag("TIR_VERBOSE", false),
            label_dynamic_dims: env_flag("TIR_LABEL_DIMS", true),
            parallel: env_flag("TIR_PARALLEL", true),
        }
    }
}

/// A graph of tensor operators whose output types and shapes are inferred
/// as the graph is built.
///
/// Nodes can only refer to nodes added before them, so the order in which
/// nodes are added is a valid evaluation order.
pub struct Graph {
    nodes: Vec<Node>,

    /// Map of node name to ID.
    names: FxHashMap<String, NodeId>,

    labels: LabelTable,
    options: GraphOptions,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Graph {
    /// Lists each node's name and inferred value, in evaluation order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for node in &self.nodes {
            map.entry(&node.name(), &format_args!("{}", node.value_info()));
        }
        map.finish()
    }
}

impl Graph {
    /// Create a new empty graph, with options read from the environment.
    pub fn new() -> Graph {
        Self::with_options(GraphOptions::default())
    }

    /// Create a new empty graph.
    pub fn with_options(options: GraphOptions) -> Graph {
        Graph {
            nodes: Vec::new(),
            names: FxHashMap::default(),
            labels: LabelTable::new(),
            options,
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Return the table from which dimension labels in this graph are
    /// allocated.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Add a graph input with a given element type and shape.
    pub fn add_parameter(
        &mut self,
        name: &str,
        element_type: ElementType,
        shape: PartialShape,
    ) -> Result<NodeId, GraphError> {
        let shape = if self.options.label_dynamic_dims {
            self.labels.label_dynamic(&shape)
        } else {
            shape
        };
        let value = InputDescriptor::new(element_type, shape);
        self.add_node(Node::new(name, NodeKind::Parameter, value))
    }

    /// Add a 1D integer constant.
    pub fn add_constant(
        &mut self,
        name: &str,
        element_type: ElementType,
        values: Vec<i64>,
    ) -> Result<NodeId, GraphError> {
        let value = InputDescriptor::constant(element_type, values);
        self.add_node(Node::new(name, NodeKind::Constant, value))
    }

    /// Add an operator node and infer its output.
    ///
    /// If inference fails, the graph is left unchanged and the error is
    /// returned.
    pub fn add_op(&mut self, name: &str, op: Op, inputs: &[NodeId]) -> Result<NodeId, GraphError> {
        if self.names.contains_key(name) {
            return Err(GraphErrorImpl::DuplicateName(name.to_string()).into());
        }

        let mut level = 1;
        for &id in inputs {
            let input = self.node(id)?;
            let input_level = input.as_operator().map(|op| op.level()).unwrap_or(0);
            level = level.max(input_level + 1);
        }

        let input_values = self.input_values(inputs);
        let output = infer_node(name, &op, &input_values, &self.labels)?;
        if self.options.verbose {
            print_trace(self.nodes.len(), name, &op, &input_values, &output);
        }

        let kind = NodeKind::Operator(OperatorNode::new(op, inputs, level));
        self.add_node(Node::new(name, kind, output))
    }

    /// Return the ID of the node with a given name.
    pub fn node_id(&self, name: &str) -> Result<NodeId, GraphError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| GraphErrorImpl::InvalidNodeName(name.to_string()).into())
    }

    /// Return the name of the node with a given ID.
    pub fn node_name(&self, id: NodeId) -> Result<&str, GraphError> {
        self.node(id).map(|node| node.name())
    }

    /// Return what is known about the output of a node.
    pub fn value_info(&self, id: NodeId) -> Result<&InputDescriptor, GraphError> {
        self.node(id).map(|node| node.value_info())
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_usize())
    }

    /// Iterate over the nodes in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().filter_map(|(i, node)| {
            let id = NodeId::from_u32(u32::try_from(i).ok()?)?;
            Some((id, node))
        })
    }

    /// Return the total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return the number of operator nodes.
    pub fn op_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.as_operator().is_some())
            .count()
    }

    /// Replace a parameter with a constant value.
    ///
    /// The constant has the parameter's element type and must be a 1D value
    /// which matches the parameter's shape. Operators which use the
    /// parameter are not updated until [`reinfer`](Self::reinfer) is called.
    pub fn set_constant(&mut self, id: NodeId, values: Vec<i64>) -> Result<(), GraphError> {
        let node = self.node(id)?;
        if !matches!(node.kind(), NodeKind::Parameter) {
            return Err(GraphErrorImpl::NotAParameter(node.name().to_string()).into());
        }

        let param = node.value_info();
        let mismatch = |error: String| -> GraphError {
            GraphErrorImpl::ConstantMismatch {
                name: node.name().to_string(),
                error,
            }
            .into()
        };
        if !param.element_type.may_be_integral() {
            return Err(mismatch(format!(
                "element type {} cannot hold integer values",
                param.element_type
            )));
        }
        let value = InputDescriptor::constant(param.element_type, values);
        if !param.shape.compatible(&value.shape) {
            return Err(mismatch(format!(
                "constant shape {} is not compatible with {}",
                value.shape, param.shape
            )));
        }

        let node = &mut self.nodes[id.as_usize()];
        node.set_kind(NodeKind::Constant);
        node.set_value_info(value);
        Ok(())
    }

    /// Re-run inference for every operator in the graph.
    ///
    /// This is used after inputs have been narrowed, for example with
    /// [`set_constant`](Self::set_constant). Each new result is intersected
    /// with the previous one, so results never become less precise.
    ///
    /// Operators are processed one level at a time. Operators within a level
    /// do not depend on each other and are inferred in parallel if
    /// [`GraphOptions::parallel`] is set.
    pub fn reinfer(&mut self) -> Result<(), GraphError> {
        let mut levels: Vec<Vec<usize>> = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(op) = node.as_operator() {
                let level = op.level() as usize;
                if levels.len() < level {
                    levels.resize_with(level, Vec::new);
                }
                levels[level - 1].push(index);
            }
        }

        for level in levels {
            let results = level.as_slice().maybe_par_iter(self.options.parallel).map_collect(
                |&index| -> Result<Option<_>, GraphError> {
                    let node = &self.nodes[index];
                    let Some(op) = node.as_operator() else {
                        return Ok(None);
                    };
                    let inputs = self.input_values(op.inputs());
                    let output = infer_node(node.name(), op.op(), &inputs, &self.labels)?;
                    Ok(Some((inputs, output)))
                },
            );

            for (index, result) in zip(level, results) {
                let Some((inputs, output)) = result? else {
                    continue;
                };
                let node = &self.nodes[index];
                let refined = refine(node.name(), &output, node.value_info())?;
                if self.options.verbose {
                    if let Some(op) = node.as_operator() {
                        print_trace(index, node.name(), op.op(), &inputs, &refined);
                    }
                }
                self.nodes[index].set_value_info(refined);
            }
        }

        Ok(())
    }

    fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.get_node(id)
            .ok_or_else(|| GraphErrorImpl::InvalidNodeId(id).into())
    }

    fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.names.contains_key(node.name()) {
            return Err(GraphErrorImpl::DuplicateName(node.name().to_string()).into());
        }
        let id = u32::try_from(self.nodes.len())
            .ok()
            .and_then(NodeId::from_u32)
            .ok_or(GraphErrorImpl::TooManyNodes)?;
        self.names.insert(node.name().to_string(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Collect the values of the given nodes. IDs must have been validated.
    fn input_values(&self, ids: &[NodeId]) -> SmallVec<[InputDescriptor; 4]> {
        ids.iter()
            .map(|id| self.nodes[id.as_usize()].value_info().clone())
            .collect()
    }
}

/// Infer the single output of an operator node.
fn infer_node(
    name: &str,
    op: &Op,
    inputs: &[InputDescriptor],
    labels: &LabelTable,
) -> Result<InputDescriptor, GraphError> {
    let outputs = op
        .infer_shapes(inputs, labels)
        .map_err(|err| GraphError::inference_error_at(name, op.name(), err, inputs))?;
    let [output] = <[InputDescriptor; 1]>::try_from(outputs).map_err(|outputs| {
        GraphErrorImpl::OutputMismatch {
            name: name.to_string(),
            error: format!("expected 1 output but got {}", outputs.len()),
        }
    })?;
    Ok(output)
}

/// Combine a newly inferred output with the previous result for the same
/// node.
///
/// Labels on the new result take precedence.
fn refine(
    name: &str,
    new: &InputDescriptor,
    old: &InputDescriptor,
) -> Result<InputDescriptor, GraphError> {
    let mismatch = |error: String| -> GraphError {
        GraphErrorImpl::OutputMismatch {
            name: name.to_string(),
            error,
        }
        .into()
    };

    let shape = match (&new.shape, &old.shape) {
        (PartialShape::Static(new_dims), PartialShape::Static(old_dims)) => {
            if new_dims.len() != old_dims.len() {
                return Err(mismatch(format!(
                    "rank changed from {} to {}",
                    old_dims.len(),
                    new_dims.len()
                )));
            }
            zip(new_dims, old_dims)
                .map(|(new_dim, old_dim)| new_dim.merge(old_dim))
                .collect::<Result<Vec<_>, _>>()
                .map(PartialShape::Static)
                .map_err(|err| mismatch(err.to_string()))?
        }
        (PartialShape::Dynamic, shape) | (shape, PartialShape::Dynamic) => shape.clone(),
    };
    let element_type = new
        .element_type
        .merge(old.element_type)
        .ok_or_else(|| {
            mismatch(format!(
                "element type changed from {} to {}",
                old.element_type, new.element_type
            ))
        })?;

    let mut refined = InputDescriptor::new(element_type, shape);
    if new.has_value() {
        refined.constant_value = new.constant_value.clone();
        refined.symbolic_value = new.symbolic_value.clone();
    } else {
        refined.constant_value = old.constant_value.clone();
        refined.symbolic_value = old.symbolic_value.clone();
    }
    Ok(refined)
}

fn print_trace(
    index: usize,
    name: &str,
    op: &Op,
    inputs: &[InputDescriptor],
    output: &InputDescriptor,
) {
    println!("#{} {} ({})", index, op.name(), name);
    for (i, input) in inputs.iter().enumerate() {
        println!("  input {}: {}", i, input);
    }
    println!("  output: {}", output);
}
