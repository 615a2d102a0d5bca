use std::error::Error;
use std::fmt::{Display, Formatter};

use tensor_ir_shape_inference::{InputDescriptor, ShapeInferenceError};

use super::NodeId;

/// Errors that occur when constructing a graph or inferring the types of
/// its values.
#[derive(Debug)]
pub struct GraphError(GraphErrorImpl);

impl GraphError {
    /// Return the general category of error.
    pub fn kind(&self) -> GraphErrorKind {
        self.0.kind()
    }

    /// Name of the node which this error relates to, if any.
    pub fn node_name(&self) -> Option<&str> {
        self.0.node_name()
    }

    /// Return the shape inference error which caused this error, if any.
    pub fn inference_error(&self) -> Option<&ShapeInferenceError> {
        match &self.0 {
            GraphErrorImpl::InferenceError { error, .. } => Some(error),
            _ => None,
        }
    }

    pub(crate) fn inference_error_at(
        name: &str,
        op: &'static str,
        error: ShapeInferenceError,
        inputs: &[InputDescriptor],
    ) -> Self {
        GraphErrorImpl::InferenceError {
            name: name.to_string(),
            op,
            error,
            inputs: inputs.to_vec(),
        }
        .into()
    }
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.0 {
            GraphErrorImpl::InferenceError { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<GraphErrorImpl> for GraphError {
    fn from(inner: GraphErrorImpl) -> Self {
        Self(inner)
    }
}

/// The category of graph error. See [`GraphError::kind`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum GraphErrorKind {
    /// A node ID or name does not refer to a node in the graph.
    NodeNotFound,
    /// A node could not be added or updated because the result would not be
    /// a valid graph.
    InvalidGraph,
    /// Inferring the outputs of an operator failed.
    InferenceError,
}

/// Internal implementation of [`GraphError`].
#[derive(Debug)]
pub(crate) enum GraphErrorImpl {
    /// A node ID is invalid.
    InvalidNodeId(NodeId),

    /// No node with a given name could be found.
    InvalidNodeName(String),

    /// A node with the same name already exists.
    DuplicateName(String),

    /// The graph has reached the maximum number of nodes.
    TooManyNodes,

    /// A node was used as a parameter but is not one.
    NotAParameter(String),

    /// A constant does not match the type or shape of the parameter it
    /// replaces.
    ConstantMismatch {
        /// Name of the parameter node.
        name: String,

        /// Error details.
        error: String,
    },

    /// Inference for an operator failed.
    InferenceError {
        /// Name of the operator node.
        name: String,

        /// Operator type name.
        op: &'static str,

        error: ShapeInferenceError,

        /// Types of operator inputs.
        inputs: Vec<InputDescriptor>,
    },

    /// Re-running inference for an operator produced a result which
    /// contradicts the previous result.
    OutputMismatch {
        /// Name of the operator node.
        name: String,

        /// Error details.
        error: String,
    },
}

impl GraphErrorImpl {
    fn kind(&self) -> GraphErrorKind {
        type Kind = GraphErrorKind;

        match self {
            Self::InvalidNodeId(_) | Self::InvalidNodeName(_) => Kind::NodeNotFound,
            Self::DuplicateName(_)
            | Self::TooManyNodes
            | Self::NotAParameter(_)
            | Self::ConstantMismatch { .. } => Kind::InvalidGraph,
            Self::InferenceError { .. } | Self::OutputMismatch { .. } => Kind::InferenceError,
        }
    }

    fn node_name(&self) -> Option<&str> {
        match self {
            Self::InvalidNodeId(_) | Self::TooManyNodes => None,
            Self::InvalidNodeName(name)
            | Self::DuplicateName(name)
            | Self::NotAParameter(name)
            | Self::ConstantMismatch { name, .. }
            | Self::InferenceError { name, .. }
            | Self::OutputMismatch { name, .. } => Some(name.as_str()),
        }
    }
}

impl Display for GraphErrorImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNodeId(id) => write!(f, "node ID {} is invalid", id),
            Self::InvalidNodeName(name) => write!(f, "no node found with name {}", name),
            Self::DuplicateName(name) => write!(f, "a node named \"{}\" already exists", name),
            Self::TooManyNodes => write!(f, "graph has too many nodes"),
            Self::NotAParameter(name) => write!(f, "node \"{}\" is not a parameter", name),
            Self::ConstantMismatch { name, error } => {
                write!(f, "constant for parameter \"{}\" does not match: {}", name, error)
            }
            Self::InferenceError {
                name,
                op,
                error,
                inputs,
            } => {
                write!(
                    f,
                    "{} operator \"{}\" failed: {} Inputs were (",
                    op, name, error
                )?;
                for (i, input) in inputs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", input)?;
                }
                write!(f, ")")
            }
            Self::OutputMismatch { name, error } => {
                write!(f, "operator \"{}\" output mismatch: {}", name, error)
            }
        }
    }
}
