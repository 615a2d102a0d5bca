use std::fmt;
use std::num::NonZero;

/// ID of a node in a [`Graph`](crate::Graph).
///
/// IDs are assigned sequentially as nodes are added, so an ID is also the
/// index of the node in the graph.
#[derive(Copy, Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(NonZero<u32>);

impl NodeId {
    /// Return the underlying u32 value of the ID.
    pub fn as_u32(self) -> u32 {
        self.0.get() - 1
    }

    /// Return the underlying ID value as a usize, for slice indexing.
    pub fn as_usize(self) -> usize {
        self.as_u32() as usize
    }

    /// Construct a node ID from a u32 value.
    ///
    /// Returns `None` if the value is `u32::MAX`.
    pub fn from_u32(value: u32) -> Option<NodeId> {
        // IDs are stored offset by one so that zero is a niche, which makes
        // `Option<NodeId>` the same size as `NodeId`.
        value.checked_add(1).and_then(NonZero::new).map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_u32().fmt(f)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.as_u32())
    }
}
