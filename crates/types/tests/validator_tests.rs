//! Tests for canonical and connected validator sets

use quorumsig_crypto::BlsPrivateKey;
use quorumsig_types::{CanonicalValidatorSet, Error, NodeId, Validator};
use std::collections::HashSet;

fn node(n: u8) -> NodeId {
    NodeId::new([n; 20])
}

fn entries(weights: &[u64]) -> Vec<Validator> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| Validator::new(BlsPrivateKey::random().public_key(), *w, node(i as u8 + 1)))
        .collect()
}

#[test]
fn test_sorted_by_public_key() {
    let set = CanonicalValidatorSet::new(entries(&[10, 20, 30, 40, 50])).unwrap();
    assert_eq!(set.len(), 5);
    assert_eq!(set.total_weight(), 150);

    for pair in set.validators().windows(2) {
        assert!(pair[0].public_key_bytes() < pair[1].public_key_bytes());
    }
}

#[test]
fn test_order_independent_of_input() {
    let raw = entries(&[1, 2, 3, 4]);
    let mut reversed = raw.clone();
    reversed.reverse();

    let a = CanonicalValidatorSet::new(raw).unwrap();
    let b = CanonicalValidatorSet::new(reversed).unwrap();
    assert_eq!(a.validators(), b.validators());
}

#[test]
fn test_shared_key_merged() {
    let key = BlsPrivateKey::random().public_key();
    let set = CanonicalValidatorSet::new(vec![
        Validator::new(key.clone(), 30, node(1)),
        Validator::new(key, 70, node(2)),
    ])
    .unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.total_weight(), 100);
    assert_eq!(set.get(0).unwrap().node_ids, vec![node(1), node(2)]);
    assert_eq!(set.index_of(&node(1)), Some(0));
    assert_eq!(set.index_of(&node(2)), Some(0));
    assert_eq!(set.index_of(&node(3)), None);
}

#[test]
fn test_weight_overflow() {
    let result = CanonicalValidatorSet::new(entries(&[u64::MAX, 1]));
    assert!(matches!(result, Err(Error::WeightOverflow)));
}

#[test]
fn test_empty_set() {
    let set = CanonicalValidatorSet::new(Vec::new()).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.total_weight(), 0);
}

#[test]
fn test_connected_weight() {
    let set = CanonicalValidatorSet::new(entries(&[10, 20, 30])).unwrap();
    let peers: HashSet<NodeId> = [node(1), node(3), node(99)].into_iter().collect();

    let connected = set.connected(&peers);
    assert_eq!(connected.connected_weight, 40);
    assert_eq!(connected.validator_indices.len(), 2);
    assert!(connected.is_connected(&node(1)));
    assert!(!connected.is_connected(&node(2)));
    // Peers outside the set are ignored
    assert!(!connected.is_connected(&node(99)));
}

#[test]
fn test_multi_node_validator_counted_once() {
    let key = BlsPrivateKey::random().public_key();
    let set = CanonicalValidatorSet::new(vec![
        Validator::new(key.clone(), 50, node(1)),
        Validator::new(key, 50, node(2)),
    ])
    .unwrap();

    let peers: HashSet<NodeId> = [node(1), node(2)].into_iter().collect();
    let connected = set.connected(&peers);
    assert_eq!(connected.connected_weight, 100);
    assert_eq!(connected.validator_indices.len(), 1);
}

#[test]
fn test_nobody_connected() {
    let set = CanonicalValidatorSet::new(entries(&[10, 20])).unwrap();
    let connected = set.connected(&HashSet::new());
    assert_eq!(connected.connected_weight, 0);
    assert!(connected.validator_indices.is_empty());
}
