//! Validator-set data source.

use async_trait::async_trait;
use quorumsig_types::{CanonicalValidatorSet, ChainId, NodeId, SubnetId, ValidationId};
use std::collections::HashMap;
use std::fmt;

/// Which base-chain height to read a validator set at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PChainHeight {
    /// The latest height the source considers safe to use
    #[default]
    Proposed,
    /// An explicit historical height
    Height(u64),
}

impl fmt::Display for PChainHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PChainHeight::Proposed => write!(f, "proposed"),
            PChainHeight::Height(h) => write!(f, "{}", h),
        }
    }
}

/// One staking registration on the base chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainStaker {
    /// Node the registration belongs to
    pub node_id: NodeId,
    /// Registration identifier
    pub validation_id: ValidationId,
    /// Remaining balance, `None` if unknown
    pub balance: Option<u64>,
}

/// Source of validator sets and staking data.
///
/// Errors are reported as strings and abort the aggregation that hit them.
#[async_trait]
pub trait ValidatorSetSource: Send + Sync {
    /// Subnet that validates `chain_id`.
    async fn get_subnet_id(&self, chain_id: ChainId) -> Result<SubnetId, String>;

    /// Canonical validator set of one subnet.
    ///
    /// The default implementation picks the subnet out of
    /// [`get_all_validator_sets`]; a subnet with no entry yields an empty set.
    ///
    /// [`get_all_validator_sets`]: ValidatorSetSource::get_all_validator_sets
    async fn get_validator_set(
        &self,
        subnet_id: SubnetId,
        height: PChainHeight,
    ) -> Result<CanonicalValidatorSet, String> {
        let mut sets = self.get_all_validator_sets(height).await?;
        Ok(sets.remove(&subnet_id).unwrap_or_default())
    }

    /// Canonical validator sets of every subnet.
    async fn get_all_validator_sets(
        &self,
        height: PChainHeight,
    ) -> Result<HashMap<SubnetId, CanonicalValidatorSet>, String>;

    /// Current on-chain staking registrations of a subnet.
    async fn get_current_on_chain_stakers(
        &self,
        subnet_id: SubnetId,
    ) -> Result<Vec<OnChainStaker>, String>;
}
