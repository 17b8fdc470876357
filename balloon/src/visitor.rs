//! Visitors over pruned trees.

use crate::{
    cache::AuditPath,
    hashing::{Digest, Hasher},
    node::{PostOrderVisitor, PreOrderVisitor},
    position::Position,
};

/// Digest scheme of the history tree: leaves hash their value, interior
/// nodes hash their children, frontier nodes pass their only child through.
#[derive(Debug)]
pub struct ComputeHashVisitor<'h> {
    hasher: &'h dyn Hasher,
}

impl<'h> ComputeHashVisitor<'h> {
    /// Create a visitor hashing with `hasher`.
    pub fn new(hasher: &'h dyn Hasher) -> Self {
        Self { hasher }
    }
}

impl<P: Position> PostOrderVisitor<P> for ComputeHashVisitor<'_> {
    type Output = Digest;

    fn visit_root(&mut self, _pos: &P, left: Digest, right: Digest) -> Digest {
        self.hasher.hash(&[left.as_slice(), right.as_slice()])
    }

    fn visit_node(&mut self, _pos: &P, left: Digest, right: Digest) -> Digest {
        self.hasher.hash(&[left.as_slice(), right.as_slice()])
    }

    fn visit_partial_node(&mut self, _pos: &P, left: Digest) -> Digest {
        left
    }

    fn visit_leaf(&mut self, _pos: &P, value: &[u8]) -> Digest {
        self.hasher.hash(&[value])
    }

    fn visit_cached(&mut self, _pos: &P, digest: &Digest) -> Digest {
        digest.clone()
    }

    fn visit_collectable(&mut self, _pos: &P, result: Digest) -> Digest {
        result
    }
}

/// Digest scheme of the hyper tree.
///
/// Leaves are salted with their position so that an all-zero value cannot
/// collide with an absent one. Interior nodes are salted too, except when
/// both children carry the same digest, which is the case for every pair of
/// empty subtrees and keeps default hashes position independent.
#[derive(Debug)]
pub struct SaltedHashVisitor<'h> {
    hasher: &'h dyn Hasher,
}

impl<'h> SaltedHashVisitor<'h> {
    /// Create a visitor hashing with `hasher`.
    pub fn new(hasher: &'h dyn Hasher) -> Self {
        Self { hasher }
    }

    fn interior<P: Position>(&self, pos: &P, left: Digest, right: Digest) -> Digest {
        if left == right {
            self.hasher.hash(&[left.as_slice(), right.as_slice()])
        } else {
            self.hasher.salted(&pos.bytes(), &[left.as_slice(), right.as_slice()])
        }
    }
}

impl<P: Position> PostOrderVisitor<P> for SaltedHashVisitor<'_> {
    type Output = Digest;

    fn visit_root(&mut self, pos: &P, left: Digest, right: Digest) -> Digest {
        self.interior(pos, left, right)
    }

    fn visit_node(&mut self, pos: &P, left: Digest, right: Digest) -> Digest {
        self.interior(pos, left, right)
    }

    fn visit_partial_node(&mut self, _pos: &P, left: Digest) -> Digest {
        left
    }

    fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> Digest {
        self.hasher.salted(&pos.bytes(), &[value])
    }

    fn visit_cached(&mut self, _pos: &P, digest: &Digest) -> Digest {
        digest.clone()
    }

    fn visit_collectable(&mut self, _pos: &P, result: Digest) -> Digest {
        result
    }
}

/// Decorates a hashing visitor, collecting the digest of every collectable
/// node so it can be persisted.
#[derive(Debug)]
pub struct CachingVisitor<P, V> {
    decorated: V,
    collected: Vec<(P, Digest)>,
}

impl<P, V> CachingVisitor<P, V> {
    /// Wrap `decorated`.
    pub fn new(decorated: V) -> Self {
        Self {
            decorated,
            collected: Vec::new(),
        }
    }

    /// Collected `(position, digest)` pairs in post-order.
    pub fn result(self) -> Vec<(P, Digest)> {
        self.collected
    }
}

impl<P, V> PostOrderVisitor<P> for CachingVisitor<P, V>
where
    P: Position,
    V: PostOrderVisitor<P, Output = Digest>,
{
    type Output = Digest;

    fn visit_root(&mut self, pos: &P, left: Digest, right: Digest) -> Digest {
        self.decorated.visit_root(pos, left, right)
    }

    fn visit_node(&mut self, pos: &P, left: Digest, right: Digest) -> Digest {
        self.decorated.visit_node(pos, left, right)
    }

    fn visit_partial_node(&mut self, pos: &P, left: Digest) -> Digest {
        self.decorated.visit_partial_node(pos, left)
    }

    fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> Digest {
        self.decorated.visit_leaf(pos, value)
    }

    fn visit_cached(&mut self, pos: &P, digest: &Digest) -> Digest {
        self.decorated.visit_cached(pos, digest)
    }

    fn visit_collectable(&mut self, pos: &P, result: Digest) -> Digest {
        let digest = self.decorated.visit_collectable(pos, result);
        self.collected.push((pos.clone(), digest.clone()));
        digest
    }
}

/// Decorates a hashing visitor, building an [`AuditPath`] out of every
/// collectable node.
#[derive(Debug)]
pub struct AuditPathVisitor<V> {
    decorated: V,
    audit_path: AuditPath,
}

impl<V> AuditPathVisitor<V> {
    /// Wrap `decorated`.
    pub fn new(decorated: V) -> Self {
        Self {
            decorated,
            audit_path: AuditPath::default(),
        }
    }

    /// The audit path gathered so far.
    pub fn result(self) -> AuditPath {
        self.audit_path
    }
}

impl<P, V> PostOrderVisitor<P> for AuditPathVisitor<V>
where
    P: Position,
    V: PostOrderVisitor<P, Output = Digest>,
{
    type Output = Digest;

    fn visit_root(&mut self, pos: &P, left: Digest, right: Digest) -> Digest {
        self.decorated.visit_root(pos, left, right)
    }

    fn visit_node(&mut self, pos: &P, left: Digest, right: Digest) -> Digest {
        self.decorated.visit_node(pos, left, right)
    }

    fn visit_partial_node(&mut self, pos: &P, left: Digest) -> Digest {
        self.decorated.visit_partial_node(pos, left)
    }

    // target leaves are not part of the path
    fn visit_leaf(&mut self, pos: &P, value: &[u8]) -> Digest {
        self.decorated.visit_leaf(pos, value)
    }

    fn visit_cached(&mut self, pos: &P, digest: &Digest) -> Digest {
        self.decorated.visit_cached(pos, digest)
    }

    fn visit_collectable(&mut self, pos: &P, result: Digest) -> Digest {
        let digest = self.decorated.visit_collectable(pos, result);
        self.audit_path.insert(pos.string_id(), digest.clone());
        digest
    }
}

/// Renders a pruned tree as indented lines, one per node.
#[derive(Debug)]
pub struct PrintVisitor {
    depth: u16,
    lines: Vec<String>,
}

impl PrintVisitor {
    /// Create a printer for a tree whose root sits at height `depth`.
    pub fn new(depth: u16) -> Self {
        Self {
            depth,
            lines: Vec::new(),
        }
    }

    /// Rendered tree.
    pub fn result(self) -> String {
        self.lines.join("\n")
    }

    fn push<P: Position>(&mut self, pos: &P, line: String) {
        let indent = self.depth.saturating_sub(pos.height()) as usize;
        self.lines.push(format!("{}{}", "\t".repeat(indent), line));
    }
}

impl<P: Position> PreOrderVisitor<P> for PrintVisitor {
    fn visit_root(&mut self, pos: &P) {
        self.push(pos, format!("Root({})", pos.string_id()));
    }

    fn visit_node(&mut self, pos: &P) {
        self.push(pos, format!("Node({})", pos.string_id()));
    }

    fn visit_partial_node(&mut self, pos: &P) {
        self.push(pos, format!("PartialNode({})", pos.string_id()));
    }

    fn visit_leaf(&mut self, pos: &P, value: &[u8]) {
        self.push(pos, format!("Leaf({})[ {} ]", pos.string_id(), hex::encode(value)));
    }

    fn visit_cached(&mut self, pos: &P, digest: &Digest) {
        self.push(pos, format!("Cached({})[ {} ]", pos.string_id(), hex::encode(digest)));
    }

    fn visit_collectable(&mut self, pos: &P) {
        self.push(pos, format!("Collectable({})", pos.string_id()));
    }
}
