//! Node addressing shared by both trees.

use std::fmt;

/// Address of a node in one of the trees.
///
/// Positions are plain values: two positions with the same index and height
/// are the same node no matter how they were reached.
pub trait Position: Clone + fmt::Debug + PartialEq + Eq + Send + Sync {
    /// Height of the node above the leaves.
    fn height(&self) -> u16;

    /// Storage key: index bytes followed by the big-endian height.
    fn bytes(&self) -> Vec<u8>;

    /// Audit path key, `"<hex index>|<height>"`.
    fn string_id(&self) -> String;
}
