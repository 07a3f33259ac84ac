//! Request fan-out and response correlation.
//!
//! Every outstanding ask occupies a slot keyed by `(chain_id, request_id,
//! node_id)` in a shared correlation table. The network's inbound path resolves slots through
//! a [`ResponseHandler`]; a [`PendingRound`] yields resolved responses until
//! its deadline and clears any slot still open when dropped. Request ids grow
//! with every round, so a late response to an abandoned round finds no slot
//! and is discarded.

use crate::network::{AllowPolicy, OutboundRequest, PeerNetwork};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use parking_lot::Mutex;
use quorumsig_crypto::{PublicKeyBytes, SignatureBytes, SignatureScheme};
use quorumsig_types::{ChainId, NodeId, SignatureResponse, SubnetId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::trace;

type SlotKey = (ChainId, u32, NodeId);
type Slots = Arc<Mutex<HashMap<SlotKey, oneshot::Sender<Vec<u8>>>>>;

/// Handle for delivering validator responses to the dispatcher.
#[derive(Clone)]
pub struct ResponseHandler {
    slots: Slots,
}

impl ResponseHandler {
    /// Resolve the slot for `(chain_id, request_id, node_id)` with a raw
    /// response.
    ///
    /// Returns `false` if no request is waiting on it: the response is stale,
    /// duplicated, unsolicited or addressed to another chain, and is dropped.
    pub fn deliver(
        &self,
        chain_id: ChainId,
        request_id: u32,
        node_id: NodeId,
        response: Vec<u8>,
    ) -> bool {
        let sender = self.slots.lock().remove(&(chain_id, request_id, node_id));
        match sender {
            Some(sender) => sender.send(response).is_ok(),
            None => {
                trace!(%chain_id, request_id, %node_id, "Dropping unsolicited response");
                false
            }
        }
    }

    /// Number of open slots.
    pub fn pending(&self) -> usize {
        self.slots.lock().len()
    }
}

impl std::fmt::Debug for ResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseHandler")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Sends signature requests over a [`PeerNetwork`] and correlates responses.
pub struct RequestDispatcher<N> {
    network: Arc<N>,
    slots: Slots,
}

impl<N: PeerNetwork> RequestDispatcher<N> {
    /// Create a dispatcher over `network`.
    pub fn new(network: Arc<N>) -> Self {
        Self {
            network,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The underlying network.
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Handle for the network's inbound path.
    pub fn response_handler(&self) -> ResponseHandler {
        ResponseHandler {
            slots: Arc::clone(&self.slots),
        }
    }

    /// Send `request` to `targets` and return the round awaiting their
    /// responses until `deadline`.
    ///
    /// Slots are registered before sending so an immediate response is never
    /// missed; slots for nodes the network did not send to are released.
    pub fn dispatch(
        &self,
        request: OutboundRequest,
        targets: &HashSet<NodeId>,
        subnet_id: SubnetId,
        deadline: Instant,
    ) -> PendingRound {
        let request_id = request.request_id;
        let chain_id = request.chain_id;
        let mut receivers = Vec::with_capacity(targets.len());
        {
            let mut slots = self.slots.lock();
            for node_id in targets {
                let (tx, rx) = oneshot::channel();
                slots.insert((chain_id, request_id, *node_id), tx);
                receivers.push((*node_id, rx));
            }
        }

        let sent = self
            .network
            .send(request, targets, subnet_id, AllowPolicy::Validators);

        let responses = FuturesUnordered::new();
        let mut keys = Vec::with_capacity(sent.len());
        {
            let mut slots = self.slots.lock();
            for (node_id, rx) in receivers {
                if sent.contains(&node_id) {
                    keys.push((chain_id, request_id, node_id));
                    let response: BoxFuture<'static, (NodeId, Option<Vec<u8>>)> =
                        rx.map(move |result| (node_id, result.ok())).boxed();
                    responses.push(response);
                } else {
                    slots.remove(&(chain_id, request_id, node_id));
                }
            }
        }

        trace!(
            request_id,
            targets = targets.len(),
            sent = keys.len(),
            "Dispatched signature requests"
        );

        PendingRound {
            request_id,
            deadline,
            responses,
            keys,
            slots: Arc::clone(&self.slots),
        }
    }
}

/// Responses outstanding for one round of requests.
pub struct PendingRound {
    request_id: u32,
    deadline: Instant,
    responses: FuturesUnordered<BoxFuture<'static, (NodeId, Option<Vec<u8>>)>>,
    keys: Vec<SlotKey>,
    slots: Slots,
}

impl PendingRound {
    /// Request id of this round.
    pub fn request_id(&self) -> u32 {
        self.request_id
    }

    /// Number of nodes the request went out to.
    pub fn dispatched(&self) -> usize {
        self.keys.len()
    }

    /// Next response, or `None` once every slot resolved or the deadline
    /// passed. Nodes that never answered are timeouts.
    pub async fn next(&mut self) -> Option<(NodeId, Vec<u8>)> {
        loop {
            match tokio::time::timeout_at(self.deadline, self.responses.next()).await {
                Ok(Some((node_id, Some(response)))) => return Some((node_id, response)),
                // Slot released without a response
                Ok(Some((_, None))) => continue,
                Ok(None) => return None,
                Err(_) => {
                    trace!(
                        request_id = self.request_id,
                        unresolved = self.responses.len(),
                        "Round deadline reached"
                    );
                    return None;
                }
            }
        }
    }
}

impl Drop for PendingRound {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        for key in &self.keys {
            slots.remove(key);
        }
    }
}

/// How one validator answered a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShareOutcome {
    /// A share that verified against the message and the validator's key
    Signed(SignatureBytes),
    /// The validator chose not to sign
    Declined,
    /// Malformed payload or a share that failed verification
    Invalid(String),
}

/// Decode and verify a raw response.
pub(crate) fn classify_response(
    response: &[u8],
    public_key: &PublicKeyBytes,
    message: &[u8],
    scheme: &dyn SignatureScheme,
) -> ShareOutcome {
    let share = match SignatureResponse::decode(response).and_then(|r| r.share()) {
        Ok(Some(share)) => share,
        Ok(None) => return ShareOutcome::Declined,
        Err(e) => return ShareOutcome::Invalid(e.to_string()),
    };

    if scheme.verify_share(public_key, message, &share) {
        ShareOutcome::Signed(share)
    } else {
        ShareOutcome::Invalid("signature verification failed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quorumsig_crypto::{BlsPrivateKey, BlsScheme, MessageSigner};
    use std::time::Duration;

    /// Accepts every target and never answers.
    struct SinkNetwork;

    #[async_trait]
    impl PeerNetwork for SinkNetwork {
        async fn connected_peers(&self) -> HashSet<NodeId> {
            HashSet::new()
        }

        fn track_subnet(&self, _subnet_id: SubnetId) {}

        fn send(
            &self,
            _request: OutboundRequest,
            targets: &HashSet<NodeId>,
            _subnet_id: SubnetId,
            _policy: AllowPolicy,
        ) -> HashSet<NodeId> {
            targets.clone()
        }
    }

    #[tokio::test]
    async fn test_responses_correlate_by_chain() {
        let dispatcher = RequestDispatcher::new(Arc::new(SinkNetwork));
        let handler = dispatcher.response_handler();
        let chain = ChainId::new([1u8; 32]);
        let other_chain = ChainId::new([2u8; 32]);
        let node = NodeId::new([9u8; 20]);

        let request = OutboundRequest {
            chain_id: chain,
            request_id: 7,
            timeout: Duration::from_secs(1),
            payload: Vec::new(),
        };
        let mut round = dispatcher.dispatch(
            request,
            &HashSet::from([node]),
            SubnetId::ZERO,
            Instant::now() + Duration::from_secs(1),
        );
        assert_eq!(round.dispatched(), 1);
        assert_eq!(handler.pending(), 1);

        assert!(!handler.deliver(other_chain, 7, node, b"a".to_vec()));
        assert!(!handler.deliver(chain, 8, node, b"b".to_vec()));
        assert!(handler.deliver(chain, 7, node, b"c".to_vec()));
        assert!(!handler.deliver(chain, 7, node, b"d".to_vec()));

        assert_eq!(round.next().await, Some((node, b"c".to_vec())));
        assert_eq!(round.next().await, None);
        drop(round);
        assert_eq!(handler.pending(), 0);
    }

    #[tokio::test]
    async fn test_dropped_round_releases_slots() {
        let dispatcher = RequestDispatcher::new(Arc::new(SinkNetwork));
        let handler = dispatcher.response_handler();
        let chain = ChainId::new([1u8; 32]);
        let targets: HashSet<NodeId> = (1..=3u8).map(|i| NodeId::new([i; 20])).collect();

        let request = OutboundRequest {
            chain_id: chain,
            request_id: 0,
            timeout: Duration::from_secs(1),
            payload: Vec::new(),
        };
        let round = dispatcher.dispatch(
            request,
            &targets,
            SubnetId::ZERO,
            Instant::now() + Duration::from_secs(1),
        );
        assert_eq!(handler.pending(), 3);

        drop(round);
        assert_eq!(handler.pending(), 0);
        assert!(!handler.deliver(chain, 0, NodeId::new([1u8; 20]), Vec::new()));
    }

    #[test]
    fn test_classify_response() {
        let key = BlsPrivateKey::random();
        let pk = key.public_key().to_bytes();
        let message = b"message";

        let signed = SignatureResponse::signed(key.sign_bytes(message))
            .encode()
            .unwrap();
        assert!(matches!(
            classify_response(&signed, &pk, message, &BlsScheme),
            ShareOutcome::Signed(_)
        ));

        let declined = SignatureResponse::declined().encode().unwrap();
        assert_eq!(
            classify_response(&declined, &pk, message, &BlsScheme),
            ShareOutcome::Declined
        );

        assert!(matches!(
            classify_response(b"garbage", &pk, message, &BlsScheme),
            ShareOutcome::Invalid(_)
        ));

        let other = BlsPrivateKey::random();
        let wrong_key = SignatureResponse::signed(other.sign_bytes(message))
            .encode()
            .unwrap();
        assert!(matches!(
            classify_response(&wrong_key, &pk, message, &BlsScheme),
            ShareOutcome::Invalid(_)
        ));
    }
}
