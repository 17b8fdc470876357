//! Tests

use super::test_utils::TempStore;
use crate::{KVPair, Mutation, Prefix, Store};

fn fill(store: &TempStore) {
    store
        .mutate(vec![
            Mutation::new(Prefix::Index, vec![0x00], vec![0]),
            Mutation::new(Prefix::Index, vec![0x10], vec![1]),
            Mutation::new(Prefix::Index, vec![0xff], vec![2]),
            Mutation::new(Prefix::HyperCache, vec![0x10, 0x00, 0x04], vec![3]),
            Mutation::version(2),
        ])
        .expect("cannot apply batch");
}

#[test]
fn test_get_is_prefix_scoped() {
    let store = TempStore::new();
    fill(&store);
    assert_eq!(store.get(Prefix::Index, &[0x10]).expect("get"), Some(vec![1]));
    assert_eq!(store.get(Prefix::HistoryCache, &[0x10]).expect("get"), None);
}

#[test]
fn test_get_range_stops_at_prefix_end() {
    let store = TempStore::new();
    fill(&store);
    let range = store
        .get_range(Prefix::Index, &[0x00], &[0xff])
        .expect("range");
    assert_eq!(range.len(), 3);
    let range = store
        .get_range(Prefix::Index, &[0x01], &[0x10])
        .expect("range");
    assert_eq!(range.into_inner(), vec![KVPair::new(vec![0x10], vec![1])]);
}

#[test]
fn test_get_all() {
    let store = TempStore::new();
    fill(&store);
    let all = store.get_all(Prefix::HyperCache).expect("all");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].key, vec![0x10, 0x00, 0x04]);
}
