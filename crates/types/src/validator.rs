//! Weighted validator sets.
//!
//! A [`CanonicalValidatorSet`] is the deterministic view of a subnet's
//! validators at one height: entries sorted by public-key bytes, one entry per
//! public key, with the weights of every node staking behind that key summed.
//! Signer bitsets index into this ordering, so two independent aggregations at
//! the same height agree on what bit `i` means.

use crate::{Error, NodeId, Result};
use quorumsig_crypto::{BlsPublicKey, PublicKeyBytes};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Minimum weight needed for `pct` percent of `total_weight`.
///
/// Rounds up so a fractional requirement is never under-counted.
pub fn threshold_weight(total_weight: u64, pct: u64) -> u64 {
    let numerator = total_weight as u128 * pct as u128;
    // pct <= 100 keeps the quotient within total_weight
    numerator.div_ceil(100).min(u64::MAX as u128) as u64
}

/// One canonical validator: a public key, its weight, and the nodes behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// BLS public key shared by every node in `node_ids`
    pub public_key: BlsPublicKey,
    /// Aggregate stake weight
    pub weight: u64,
    /// Nodes staking behind this key
    pub node_ids: Vec<NodeId>,
}

impl Validator {
    /// Create a validator backed by a single node.
    pub fn new(public_key: BlsPublicKey, weight: u64, node_id: NodeId) -> Self {
        Self {
            public_key,
            weight,
            node_ids: vec![node_id],
        }
    }

    /// Compressed public key bytes.
    pub fn public_key_bytes(&self) -> PublicKeyBytes {
        self.public_key.to_bytes()
    }
}

/// Ordered validator set for one subnet at one height.
#[derive(Debug, Clone, Default)]
pub struct CanonicalValidatorSet {
    validators: Vec<Validator>,
    total_weight: u64,
    node_index: HashMap<NodeId, usize>,
}

impl CanonicalValidatorSet {
    /// Build the canonical set from raw entries.
    ///
    /// Entries sharing a public key are merged: weights are summed and node
    /// ids concatenated. Fails if any weight sum overflows a u64.
    pub fn new(entries: Vec<Validator>) -> Result<Self> {
        let mut by_key: HashMap<PublicKeyBytes, Validator> = HashMap::with_capacity(entries.len());
        for entry in entries {
            match by_key.get_mut(&entry.public_key_bytes()) {
                Some(existing) => {
                    existing.weight = existing
                        .weight
                        .checked_add(entry.weight)
                        .ok_or(Error::WeightOverflow)?;
                    for node_id in entry.node_ids {
                        if !existing.node_ids.contains(&node_id) {
                            existing.node_ids.push(node_id);
                        }
                    }
                }
                None => {
                    by_key.insert(entry.public_key_bytes(), entry);
                }
            }
        }

        let mut validators: Vec<Validator> = by_key.into_values().collect();
        validators.sort_by(|a, b| a.public_key.cmp(&b.public_key));

        let total_weight = validators
            .iter()
            .try_fold(0u64, |acc, v| acc.checked_add(v.weight))
            .ok_or(Error::WeightOverflow)?;

        let mut node_index = HashMap::new();
        for (i, validator) in validators.iter().enumerate() {
            for node_id in &validator.node_ids {
                node_index.insert(*node_id, i);
            }
        }

        Ok(Self {
            validators,
            total_weight,
            node_index,
        })
    }

    /// Validators in canonical order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Get a validator by canonical index.
    pub fn get(&self, index: usize) -> Option<&Validator> {
        self.validators.get(index)
    }

    /// Sum of all validator weights.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Canonical index of the validator a node stakes behind.
    pub fn index_of(&self, node_id: &NodeId) -> Option<usize> {
        self.node_index.get(node_id).copied()
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Combined weight of the given validator indices. Unknown indices count
    /// as zero.
    pub fn weight_of<'a>(&self, indices: impl IntoIterator<Item = &'a usize>) -> u64 {
        indices
            .into_iter()
            .filter_map(|i| self.validators.get(*i))
            .map(|v| v.weight)
            .sum()
    }

    /// Intersect the set with the nodes currently reachable.
    ///
    /// A validator counts as connected if at least one of its nodes is.
    pub fn connected(&self, peers: &HashSet<NodeId>) -> ConnectedValidators {
        let mut validator_indices = BTreeSet::new();
        let mut connected_nodes = HashSet::new();

        for node_id in peers {
            if let Some(index) = self.index_of(node_id) {
                validator_indices.insert(index);
                connected_nodes.insert(*node_id);
            }
        }

        let connected_weight = self.weight_of(&validator_indices);

        ConnectedValidators {
            connected_weight,
            connected_nodes,
            validator_indices,
        }
    }
}

/// The reachable part of a [`CanonicalValidatorSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectedValidators {
    /// Weight of validators with at least one connected node
    pub connected_weight: u64,
    /// Connected nodes that belong to the set
    pub connected_nodes: HashSet<NodeId>,
    /// Canonical indices of connected validators
    pub validator_indices: BTreeSet<usize>,
}

impl ConnectedValidators {
    /// Check whether a node is connected and in the set.
    pub fn is_connected(&self, node_id: &NodeId) -> bool {
        self.connected_nodes.contains(node_id)
    }
}
