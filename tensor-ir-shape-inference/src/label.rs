//! Symbolic dimension labels and the table which allocates them.

use std::fmt;
use std::num::NonZero;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::dimension::Dimension;
use crate::partial_shape::PartialShape;

/// Opaque identity tag attached to a [`Dimension`].
///
/// Two dimensions carrying the same label are known to have the same value,
/// even if that value is not known. Labels support only identity comparison.
#[derive(Copy, Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Label(NonZero<u64>);

impl Label {
    /// Construct a label from its numeric ID.
    ///
    /// Returns `None` if `id` is zero, which is reserved so that
    /// `Option<Label>` is the same size as `Label`.
    pub fn from_u64(id: u64) -> Option<Label> {
        NonZero::new(id).map(Label)
    }

    /// Return the numeric ID of this label.
    pub fn as_u64(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_u64().fmt(f)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", self.as_u64())
    }
}

/// Allocates labels for dimensions with distinct symbolic origins.
///
/// A table is scoped to one graph construction or inference session. Label
/// allocation uses an atomic counter, so a table can be shared by reference
/// between threads that run inference for independent operators in parallel.
/// Labels are never reused within a table.
///
/// Tests should create a fresh table so that label IDs are deterministic.
#[derive(Debug)]
pub struct LabelTable {
    next_label: AtomicU64,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelTable {
    pub fn new() -> Self {
        Self::with_first_label(1)
    }

    /// Create a table whose first allocated label has the ID `first`.
    ///
    /// This is useful when labels from an earlier session must not collide
    /// with new ones. An ID of zero is treated as 1.
    pub fn with_first_label(first: u64) -> Self {
        Self {
            next_label: AtomicU64::new(first.max(1)),
        }
    }

    /// Allocate a new label.
    pub fn fresh(&self) -> Label {
        let id = self.next_label.fetch_add(1, Ordering::Relaxed);
        Label::from_u64(id).expect("label counter overflowed")
    }

    /// Return the number of labels allocated so far, including any skipped
    /// by [`with_first_label`](Self::with_first_label).
    pub fn allocated(&self) -> u64 {
        self.next_label.load(Ordering::Relaxed) - 1
    }

    /// Return a copy of `shape` where every unlabelled dimension whose size
    /// is not static has been given a fresh label.
    pub fn label_dynamic(&self, shape: &PartialShape) -> PartialShape {
        self.label_where(shape, |dim| !dim.is_static())
    }

    /// Return a copy of `shape` where every unlabelled dimension has been
    /// given a fresh label.
    pub fn label_all(&self, shape: &PartialShape) -> PartialShape {
        self.label_where(shape, |_| true)
    }

    fn label_where(&self, shape: &PartialShape, pred: impl Fn(&Dimension) -> bool) -> PartialShape {
        let Some(dims) = shape.dims() else {
            return PartialShape::Dynamic;
        };
        dims.iter()
            .map(|dim| {
                if dim.label().is_none() && pred(dim) {
                    dim.clone().with_label(self.fresh())
                } else {
                    dim.clone()
                }
            })
            .collect()
    }

    /// Return true if `a` and `b` are provably the same value.
    ///
    /// This holds if both are static with the same size, or both carry the
    /// same label.
    pub fn same_value(&self, a: &Dimension, b: &Dimension) -> bool {
        if let (Some(a_size), Some(b_size)) = (a.size(), b.size()) {
            return a_size == b_size;
        }
        match (a.label(), b.label()) {
            (Some(a_label), Some(b_label)) => a_label == b_label,
            _ => false,
        }
    }
}
