//! Peer network abstraction.

use async_trait::async_trait;
use quorumsig_types::{ChainId, NodeId, SubnetId};
use std::collections::HashSet;
use std::time::Duration;

/// Which peers a request may be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllowPolicy {
    /// Only validators of the target subnet
    #[default]
    Validators,
    /// Any connected peer
    Any,
}

/// A request handed to the network for delivery to validators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Chain the request is addressed to
    pub chain_id: ChainId,
    /// Correlates responses with this request
    pub request_id: u32,
    /// How long the sender will wait for a response
    pub timeout: Duration,
    /// Encoded [`SignatureRequest`](quorumsig_types::SignatureRequest)
    pub payload: Vec<u8>,
}

/// Connection manager delivering requests to peers.
///
/// Responses come back asynchronously through a
/// [`ResponseHandler`](crate::ResponseHandler) obtained from the aggregator.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Nodes currently connected.
    async fn connected_peers(&self) -> HashSet<NodeId>;

    /// Start tracking a subnet's validators as peers.
    fn track_subnet(&self, subnet_id: SubnetId);

    /// Send `request` to `targets`. Returns the nodes it was actually sent to.
    fn send(
        &self,
        request: OutboundRequest,
        targets: &HashSet<NodeId>,
        subnet_id: SubnetId,
        policy: AllowPolicy,
    ) -> HashSet<NodeId>;
}
