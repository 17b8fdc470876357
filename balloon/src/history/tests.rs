use std::sync::Arc;

use assert_matches::assert_matches;
use balloon_storage::{MemoryStore, Prefix, Store};
use proptest::prelude::*;

use super::*;
use crate::{
    BalloonError, Position,
    cache::{AuditPath, PassThroughCache},
    hashing::{Blake3Hasher, Digest, FakeHasher, Hasher, XorHasher},
};

type TestTree = HistoryTree<PassThroughCache<MemoryStore>>;

fn new_tree(hasher: Arc<dyn Hasher>) -> (TestTree, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let cache = PassThroughCache::new(Prefix::HistoryCache, store.clone());
    (HistoryTree::new(hasher, cache), store)
}

/// Add `events` in order, persisting every batch, and return the root digest
/// after each addition.
fn add_all(
    tree: &TestTree,
    store: &MemoryStore,
    hasher: &dyn Hasher,
    events: &[Vec<u8>],
) -> Vec<Digest> {
    events
        .iter()
        .enumerate()
        .map(|(version, event)| {
            let (root, mutations) = tree
                .add(&hasher.hash(&[event.as_slice()]), version as u64)
                .expect("add should succeed");
            store.mutate(mutations).expect("mutate");
            root
        })
        .collect()
}

fn xor_events(n: u8) -> Vec<Vec<u8>> {
    (0..n).map(|i| vec![i]).collect()
}

// ── Add tests ────────────────────────────────────────────────────────

#[test]
fn test_add_xor_roots() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    let roots = add_all(&tree, &store, hasher.as_ref(), &xor_events(10));
    let expected: Vec<Digest> = [0u8, 1, 3, 0, 4, 1, 7, 0, 8, 1]
        .iter()
        .map(|d| vec![*d])
        .collect();
    assert_eq!(roots, expected);
}

#[test]
fn test_add_collects_leaf_and_settled_subtrees() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    add_all(&tree, &store, hasher.as_ref(), &xor_events(3));

    let (root, mutations) = tree.add(&[3], 3).expect("add");
    assert_eq!(root, vec![0]);
    let keys: Vec<Vec<u8>> = mutations.iter().map(|m| m.key.clone()).collect();
    assert_eq!(
        keys,
        vec![
            HistoryPosition::new(3, 0).bytes(),
            HistoryPosition::new(2, 1).bytes(),
            HistoryPosition::new(0, 2).bytes(),
        ]
    );
    assert!(mutations.iter().all(|m| m.prefix == Prefix::HistoryCache));
    assert_eq!(mutations[1].value, vec![2 ^ 3]);
}

#[test]
fn test_add_frontier_is_not_collected() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    add_all(&tree, &store, hasher.as_ref(), &xor_events(4));

    // version 4 hangs alone on the right of a depth 3 tree
    let (root, mutations) = tree.add(&[4], 4).expect("add");
    assert_eq!(root, vec![4]);
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].key, HistoryPosition::new(4, 0).bytes());
}

#[test]
fn test_add_with_missing_cache_is_corruption() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, _store) = new_tree(hasher);
    // leaf 0 was never persisted
    assert_matches!(tree.add(&[1], 1), Err(BalloonError::Corruption(_)));
}

// ── Membership tests ─────────────────────────────────────────────────

#[test]
fn test_prove_membership_audit_path() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    add_all(&tree, &store, hasher.as_ref(), &xor_events(4));

    let proof = tree.prove_membership(3, 3).expect("prove");
    let expected: AuditPath = [("0|1", vec![1u8]), ("2|0", vec![2u8])].into_iter().collect();
    assert_eq!(proof.audit_path, expected);
    assert!(proof.verify(hasher.as_ref(), &[3], &[0]));
}

#[test]
fn test_prove_membership_double_targeted_audit_path() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    add_all(&tree, &store, hasher.as_ref(), &xor_events(6));

    let proof = tree.prove_membership(2, 5).expect("prove");
    let expected: AuditPath = [("0|1", vec![1u8]), ("3|0", vec![3u8]), ("4|1", vec![1u8])]
        .into_iter()
        .collect();
    assert_eq!(proof.audit_path, expected);
    // root at version 5 is 0^1^2^3^4^5 = 1
    assert!(proof.verify(hasher.as_ref(), &[2], &[1]));
    assert!(!proof.verify(hasher.as_ref(), &[2], &[0]));
}

#[test]
fn test_every_membership_proof_verifies() {
    let hasher: Arc<dyn Hasher> = Arc::new(Blake3Hasher);
    let (tree, store) = new_tree(hasher.clone());
    let events: Vec<Vec<u8>> = (0u32..17).map(|i| i.to_be_bytes().to_vec()).collect();
    let roots = add_all(&tree, &store, hasher.as_ref(), &events);

    for version in 0..events.len() as u64 {
        for index in 0..=version {
            let proof = tree.prove_membership(index, version).expect("prove");
            let digest = hasher.hash(&[events[index as usize].as_slice()]);
            assert!(
                proof.verify(hasher.as_ref(), &digest, &roots[version as usize]),
                "proof for index {index} at version {version} should verify"
            );
        }
    }
}

#[test]
fn test_membership_proof_rejects_wrong_event_and_tampering() {
    let hasher: Arc<dyn Hasher> = Arc::new(Blake3Hasher);
    let (tree, store) = new_tree(hasher.clone());
    let events: Vec<Vec<u8>> = (0u8..6).map(|i| vec![i; 4]).collect();
    let roots = add_all(&tree, &store, hasher.as_ref(), &events);

    let proof = tree.prove_membership(1, 5).expect("prove");
    let digest = hasher.hash(&[events[1].as_slice()]);
    assert!(proof.verify(hasher.as_ref(), &digest, &roots[5]));

    let other = hasher.hash(&[events[2].as_slice()]);
    assert!(!proof.verify(hasher.as_ref(), &other, &roots[5]));

    let mut tampered = proof.clone();
    let (id, _) = tampered
        .audit_path
        .iter()
        .next()
        .map(|(k, v)| (k.clone(), v.clone()))
        .expect("non-empty path");
    tampered.audit_path.insert(id, vec![0u8; 32]);
    assert!(!tampered.verify(hasher.as_ref(), &digest, &roots[5]));

    let truncated = MembershipProof::new(AuditPath::new(), 1, 5);
    assert!(!truncated.verify(hasher.as_ref(), &digest, &roots[5]));
}

#[test]
fn test_prove_membership_rejects_future_index() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    add_all(&tree, &store, hasher.as_ref(), &xor_events(2));
    assert_matches!(tree.prove_membership(2, 1), Err(BalloonError::InvalidInput(_)));
}

// ── Consistency tests ────────────────────────────────────────────────

#[test]
fn test_every_consistency_proof_verifies() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    let roots = add_all(&tree, &store, hasher.as_ref(), &xor_events(10));

    for end in 0..10u64 {
        for start in 0..=end {
            let proof = tree.prove_consistency(start, end).expect("prove");
            assert!(
                proof.verify(hasher.as_ref(), &roots[start as usize], &roots[end as usize]),
                "consistency {start}..{end} should verify"
            );
        }
    }
}

#[test]
fn test_consistency_proof_rejects_wrong_digests() {
    let hasher: Arc<dyn Hasher> = Arc::new(Blake3Hasher);
    let (tree, store) = new_tree(hasher.clone());
    let events: Vec<Vec<u8>> = (0u8..8).map(|i| vec![i]).collect();
    let roots = add_all(&tree, &store, hasher.as_ref(), &events);

    let proof = tree.prove_consistency(2, 6).expect("prove");
    assert!(proof.verify(hasher.as_ref(), &roots[2], &roots[6]));
    assert!(!proof.verify(hasher.as_ref(), &roots[3], &roots[6]));
    assert!(!proof.verify(hasher.as_ref(), &roots[2], &roots[7]));

    let empty = IncrementalProof::new(AuditPath::new(), 2, 6);
    assert!(!empty.verify(hasher.as_ref(), &roots[2], &roots[6]));
}

#[test]
fn test_prove_consistency_rejects_decreasing_versions() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    add_all(&tree, &store, hasher.as_ref(), &xor_events(4));
    assert_matches!(tree.prove_consistency(3, 1), Err(BalloonError::InvalidInput(_)));
}

#[test]
fn test_proof_encoding() {
    let hasher = Arc::new(FakeHasher(XorHasher));
    let (tree, store) = new_tree(hasher.clone());
    let roots = add_all(&tree, &store, hasher.as_ref(), &xor_events(7));

    let proof = tree.prove_consistency(2, 6).expect("prove");
    let bytes = proof.encode_to_vec().expect("encode");
    let decoded = IncrementalProof::decode_from_slice(&bytes).expect("decode");
    assert_eq!(decoded, proof);
    assert!(decoded.verify(hasher.as_ref(), &roots[2], &roots[6]));
}

// ── Property tests ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_consistency_is_transitive(a in 0u64..24, b in 0u64..24, c in 0u64..24) {
        let mut versions = [a, b, c];
        versions.sort_unstable();
        let [a, b, c] = versions;

        let hasher: Arc<dyn Hasher> = Arc::new(Blake3Hasher);
        let (tree, store) = new_tree(hasher.clone());
        let events: Vec<Vec<u8>> = (0..=c).map(|i| i.to_le_bytes().to_vec()).collect();
        let roots = add_all(&tree, &store, hasher.as_ref(), &events);
        let root = |v: u64| roots[v as usize].clone();

        let ab = tree.prove_consistency(a, b).expect("prove a..b");
        let bc = tree.prove_consistency(b, c).expect("prove b..c");
        let ac = tree.prove_consistency(a, c).expect("prove a..c");
        prop_assert!(ab.verify(hasher.as_ref(), &root(a), &root(b)));
        prop_assert!(bc.verify(hasher.as_ref(), &root(b), &root(c)));
        prop_assert!(ac.verify(hasher.as_ref(), &root(a), &root(c)));
    }

    #[test]
    fn prop_resolvers_are_pure(
        index in 0u64..1024,
        height in 0u16..11,
        start in 0u64..1024,
        delta in 0u64..1024,
    ) {
        let pos = HistoryPosition::new(index, height);
        let end = start + delta;
        let resolvers: [&dyn CacheResolver; 3] = [
            &SingleTargetedCacheResolver::new(end),
            &DoubleTargetedCacheResolver::new(start, end),
            &IncrementalCacheResolver::new(start, end),
        ];
        for resolver in resolvers {
            prop_assert_eq!(
                resolver.should_get_from_cache(&pos),
                resolver.should_get_from_cache(&pos)
            );
        }
    }
}
