//! Pruned tree snapshots.
//!
//! A [`Visitable`] is built fresh by a pruner for a single operation, walked
//! once by a visitor and dropped. It is never the persistent representation
//! of a tree.

use crate::{hashing::Digest, position::Position};

/// A node of a pruned tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visitable<P> {
    /// Top of the tree, its digest is the tree commitment.
    Root {
        /// Node address
        pos: P,
        /// Left subtree
        left: Box<Visitable<P>>,
        /// Right subtree
        right: Box<Visitable<P>>,
    },
    /// Interior node with both children.
    Node {
        /// Node address
        pos: P,
        /// Left subtree
        left: Box<Visitable<P>>,
        /// Right subtree
        right: Box<Visitable<P>>,
    },
    /// Interior node on the append-only frontier, its right sibling does not
    /// exist yet.
    PartialNode {
        /// Node address
        pos: P,
        /// Only subtree
        left: Box<Visitable<P>>,
    },
    /// Terminal node holding a raw value.
    Leaf {
        /// Node address
        pos: P,
        /// Leaf value
        value: Vec<u8>,
    },
    /// Terminal node whose digest is already known.
    Cached {
        /// Node address
        pos: P,
        /// Known digest of the whole subtree
        digest: Digest,
    },
    /// Marks the wrapped subtree's digest for persistence.
    Collectable(Box<Visitable<P>>),
}

/// Visitor walking children before their parent.
pub trait PostOrderVisitor<P> {
    /// Value produced for every node.
    type Output;

    /// Visit the root once both children have been visited.
    fn visit_root(&mut self, pos: &P, left: Self::Output, right: Self::Output) -> Self::Output;
    /// Visit an interior node once both children have been visited.
    fn visit_node(&mut self, pos: &P, left: Self::Output, right: Self::Output) -> Self::Output;
    /// Visit a frontier node once its only child has been visited.
    fn visit_partial_node(&mut self, pos: &P, left: Self::Output) -> Self::Output;
    /// Visit a leaf.
    fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> Self::Output;
    /// Visit a node with a known digest.
    fn visit_cached(&mut self, pos: &P, digest: &Digest) -> Self::Output;
    /// Visit a collectable wrapper once the wrapped subtree has been visited.
    fn visit_collectable(&mut self, pos: &P, result: Self::Output) -> Self::Output;
}

/// Visitor walking parents before their children.
pub trait PreOrderVisitor<P> {
    /// Visit the root.
    fn visit_root(&mut self, pos: &P);
    /// Visit an interior node.
    fn visit_node(&mut self, pos: &P);
    /// Visit a frontier node.
    fn visit_partial_node(&mut self, pos: &P);
    /// Visit a leaf.
    fn visit_leaf(&mut self, pos: &P, value: &[u8]);
    /// Visit a node with a known digest.
    fn visit_cached(&mut self, pos: &P, digest: &Digest);
    /// Visit a collectable wrapper, before the wrapped subtree.
    fn visit_collectable(&mut self, pos: &P);
}

impl<P: Position> Visitable<P> {
    /// Root node.
    pub fn root(pos: P, left: Visitable<P>, right: Visitable<P>) -> Self {
        Visitable::Root {
            pos,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Interior node.
    pub fn node(pos: P, left: Visitable<P>, right: Visitable<P>) -> Self {
        Visitable::Node {
            pos,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Frontier node.
    pub fn partial_node(pos: P, left: Visitable<P>) -> Self {
        Visitable::PartialNode {
            pos,
            left: Box::new(left),
        }
    }

    /// Leaf node.
    pub fn leaf(pos: P, value: Vec<u8>) -> Self {
        Visitable::Leaf { pos, value }
    }

    /// Node with a known digest.
    pub fn cached(pos: P, digest: Digest) -> Self {
        Visitable::Cached { pos, digest }
    }

    /// Wrap `inner` so its digest gets collected.
    pub fn collectable(inner: Visitable<P>) -> Self {
        Visitable::Collectable(Box::new(inner))
    }

    /// Address of this node. A collectable wrapper shares its inner node's
    /// position.
    pub fn pos(&self) -> &P {
        match self {
            Visitable::Root { pos, .. }
            | Visitable::Node { pos, .. }
            | Visitable::PartialNode { pos, .. }
            | Visitable::Leaf { pos, .. }
            | Visitable::Cached { pos, .. } => pos,
            Visitable::Collectable(inner) => inner.pos(),
        }
    }

    /// Walk the tree children first.
    pub fn post_order<V: PostOrderVisitor<P>>(&self, visitor: &mut V) -> V::Output {
        match self {
            Visitable::Root { pos, left, right } => {
                let left = left.post_order(visitor);
                let right = right.post_order(visitor);
                visitor.visit_root(pos, left, right)
            }
            Visitable::Node { pos, left, right } => {
                let left = left.post_order(visitor);
                let right = right.post_order(visitor);
                visitor.visit_node(pos, left, right)
            }
            Visitable::PartialNode { pos, left } => {
                let left = left.post_order(visitor);
                visitor.visit_partial_node(pos, left)
            }
            Visitable::Leaf { pos, value } => visitor.visit_leaf(pos, value),
            Visitable::Cached { pos, digest } => visitor.visit_cached(pos, digest),
            Visitable::Collectable(inner) => {
                let result = inner.post_order(visitor);
                visitor.visit_collectable(inner.pos(), result)
            }
        }
    }

    /// Walk the tree parents first.
    pub fn pre_order<V: PreOrderVisitor<P>>(&self, visitor: &mut V) {
        match self {
            Visitable::Root { pos, left, right } => {
                visitor.visit_root(pos);
                left.pre_order(visitor);
                right.pre_order(visitor);
            }
            Visitable::Node { pos, left, right } => {
                visitor.visit_node(pos);
                left.pre_order(visitor);
                right.pre_order(visitor);
            }
            Visitable::PartialNode { pos, left } => {
                visitor.visit_partial_node(pos);
                left.pre_order(visitor);
            }
            Visitable::Leaf { pos, value } => visitor.visit_leaf(pos, value),
            Visitable::Cached { pos, digest } => visitor.visit_cached(pos, digest),
            Visitable::Collectable(inner) => {
                visitor.visit_collectable(inner.pos());
                inner.pre_order(visitor);
            }
        }
    }
}
