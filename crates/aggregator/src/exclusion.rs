//! Exclusion of validators without sufficient on-chain stake.
//!
//! A validator is excluded only when every node behind it has an on-chain
//! staking registration and each of those registrations is underfunded or has
//! no known balance. A single node without a registration, or with enough
//! balance, keeps the validator in. Excluded validators are never asked to
//! sign and never count toward quorum, whether or not they are connected.

use crate::error::{AggregationError, Result};
use crate::source::{OnChainStaker, ValidatorSetSource};
use quorumsig_types::{CanonicalValidatorSet, NodeId, SubnetId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Computes the validators to leave out of an aggregation.
#[derive(Debug, Clone, Copy)]
pub struct ExclusionFilter {
    min_balance: u64,
}

impl ExclusionFilter {
    /// Create a filter. Balances strictly below `min_balance` are underfunded.
    pub fn new(min_balance: u64) -> Self {
        Self { min_balance }
    }

    /// Minimum balance.
    pub fn min_balance(&self) -> u64 {
        self.min_balance
    }

    /// Fetch the subnet's stakers and compute the excluded validator indices.
    ///
    /// Errors from the source abort the aggregation.
    pub async fn compute<S>(
        &self,
        source: &S,
        subnet_id: SubnetId,
        validator_set: &CanonicalValidatorSet,
    ) -> Result<BTreeSet<usize>>
    where
        S: ValidatorSetSource + ?Sized,
    {
        let stakers = source
            .get_current_on_chain_stakers(subnet_id)
            .await
            .map_err(AggregationError::ValidatorSource)?;

        let excluded = self.excluded(validator_set, &stakers);
        if !excluded.is_empty() {
            debug!(
                %subnet_id,
                excluded = excluded.len(),
                weight = validator_set.weight_of(&excluded),
                "Excluding underfunded validators"
            );
        }
        Ok(excluded)
    }

    /// Excluded indices of `validator_set`, given staker data.
    pub fn excluded(
        &self,
        validator_set: &CanonicalValidatorSet,
        stakers: &[OnChainStaker],
    ) -> BTreeSet<usize> {
        // Best balance per node. None < Some, so any known balance wins.
        let mut balances: HashMap<NodeId, Option<u64>> = HashMap::new();
        for staker in stakers {
            let entry = balances.entry(staker.node_id).or_insert(staker.balance);
            *entry = (*entry).max(staker.balance);
        }

        validator_set
            .validators()
            .iter()
            .enumerate()
            .filter(|(_, validator)| {
                !validator.node_ids.is_empty()
                    && validator
                        .node_ids
                        .iter()
                        .all(|node_id| self.is_underfunded(balances.get(node_id)))
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn is_underfunded(&self, record: Option<&Option<u64>>) -> bool {
        match record {
            // Not staked on-chain: outside the balance check
            None => false,
            Some(None) => true,
            Some(Some(balance)) => *balance < self.min_balance,
        }
    }
}
