//! Shape and type inference for tensor-ir graphs.
//!
//! # About shape inference
//!
//! Compilers for machine learning models need to know the shapes and element
//! types of values flowing through a graph before it is executed, in order
//! to plan memory, select kernels and verify that operators are used
//! correctly. Many models have inputs with dynamic sizes however. A language
//! model for example typically has dynamic batch size and sequence length
//! dimensions.
//!
//! Shape inference computes, for each operator, the most precise description
//! of its outputs that can be proven from the descriptions of its inputs.
//! Descriptions are _partial_: the rank of a value may be unknown, and each
//! dimension is an interval of possible sizes rather than a single size.
//!
//! # Labels
//!
//! Intervals alone cannot express that two dynamic dimensions are equal. To
//! express this, a dimension can carry a [`Label`], an opaque tag allocated
//! from a [`LabelTable`]. Dimensions with the same label are known to have
//! the same size. Operators forward a label from an input dimension to an
//! output dimension only where the output is provably the same size.
//!
//! As an example, given an input of shape `[batch, 3, height, width]`:
//!
//! ```text
//! S = ShapeOf(Image)               // [batch, 3, height, width]
//! H = StridedSlice(S, [2], [3])    // [height]
//! M = Broadcast(Scalar, H)         // shape [height]
//! ```
//!
//! The output `M` has a dimension labelled `height`, so a later pass can
//! prove that its size matches the third dimension of `Image`.
//!
//! # Crate overview
//!
//! The main export of this crate is the [`InferShapes`] trait, plus the
//! operator types in [`ops`] which implement it. The most involved of these
//! is [`StridedSlice`](ops::StridedSlice), a NumPy-style slice with five
//! mask attributes which insert, remove and skip axes.
//!
//! Operator inputs and outputs are described by [`InputDescriptor`], which
//! combines an [`ElementType`], a [`PartialShape`] made of [`Dimension`]s and
//! optionally the value itself, when it is known at compile time.

mod dimension;
mod element_type;
mod error;
mod infer_shapes;
mod input_desc;
mod label;
mod masks;
pub mod ops;
mod partial_shape;
mod slice_range;

pub use dimension::{Dimension, Incompatible, ParseDimensionError};
pub use element_type::{ElementType, UnknownElementType};
pub use error::{ErrorKind, MaskKind, Operand, ShapeInferenceError};
pub use infer_shapes::InferShapes;
pub use input_desc::InputDescriptor;
pub use label::{Label, LabelTable};
pub use masks::{plan_axes, AxisPlan, AxisPlans, MaskSet};
pub use partial_shape::PartialShape;
pub use slice_range::{slice_dimension, AxisSlice, SliceBound, SliceRange};
