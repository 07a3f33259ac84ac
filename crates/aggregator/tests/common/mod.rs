//! Shared mocks for aggregator integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use quorumsig_aggregator::{
    AggregatorConfig, AllowPolicy, OnChainStaker, OutboundRequest, PChainHeight, PeerNetwork,
    ResponseHandler, SignatureAggregator, ValidatorSetSource,
};
use quorumsig_crypto::{BlsPrivateKey, BlsScheme, MessageSigner};
use quorumsig_types::{
    CanonicalValidatorSet, ChainId, NodeId, SignatureRequest, SignatureResponse, SubnetId,
    UnsignedMessage, ValidationId, Validator,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

// ============================================================================
// Fixtures
// ============================================================================

pub const NETWORK_ID: u32 = 5;

pub fn node(i: u8) -> NodeId {
    NodeId::new([i; 20])
}

pub fn chain() -> ChainId {
    ChainId::new([0xc1; 32])
}

pub fn subnet() -> SubnetId {
    SubnetId::new([0x5b; 32])
}

pub fn message() -> UnsignedMessage {
    UnsignedMessage::new(NETWORK_ID, chain(), b"transfer 100 to bob".to_vec())
}

/// One validator per key, each backed by a single node `node(i + 1)`.
pub fn keys_and_set(weights: &[u64]) -> (Vec<Arc<BlsPrivateKey>>, CanonicalValidatorSet) {
    let keys: Vec<Arc<BlsPrivateKey>> = weights
        .iter()
        .map(|_| Arc::new(BlsPrivateKey::random()))
        .collect();
    let entries = keys
        .iter()
        .zip(weights)
        .enumerate()
        .map(|(i, (key, weight))| Validator::new(key.public_key(), *weight, node(i as u8 + 1)))
        .collect();
    (keys, CanonicalValidatorSet::new(entries).unwrap())
}

// ============================================================================
// Mock Network
// ============================================================================

/// How a node answers signature requests.
#[derive(Clone)]
pub enum Behavior {
    /// Sign with the given key
    Sign(Arc<BlsPrivateKey>),
    /// Answer with an empty signature
    Decline,
    /// Accept the request and never answer
    Silent,
    /// Ignore the first request, sign every later one
    SilentOnce(Arc<BlsPrivateKey>),
    /// Answer with bytes that do not decode
    Garbage,
    /// Sign with a key that is not the validator's
    WrongKey(Arc<BlsPrivateKey>),
    /// The network refuses to send to this node
    Unreachable,
}

/// Network that answers requests synchronously from inside `send`.
#[derive(Default)]
pub struct MockNetwork {
    handler: OnceLock<ResponseHandler>,
    connected: Mutex<HashSet<NodeId>>,
    behaviors: Mutex<HashMap<NodeId, Behavior>>,
    requests_seen: Mutex<HashMap<NodeId, usize>>,
    sends: Mutex<Vec<(u32, HashSet<NodeId>)>>,
    tracked: Mutex<Vec<SubnetId>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response_handler(&self, handler: ResponseHandler) {
        let _ = self.handler.set(handler);
    }

    /// Connect `node_id` with the given behavior.
    pub fn add_node(&self, node_id: NodeId, behavior: Behavior) {
        self.connected.lock().insert(node_id);
        self.behaviors.lock().insert(node_id, behavior);
    }

    pub fn disconnect(&self, node_id: &NodeId) {
        self.connected.lock().remove(node_id);
    }

    /// `(request_id, targets)` of every send, in order.
    pub fn sends(&self) -> Vec<(u32, HashSet<NodeId>)> {
        self.sends.lock().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().len()
    }

    pub fn tracked(&self) -> Vec<SubnetId> {
        self.tracked.lock().clone()
    }

    fn respond(&self, node_id: NodeId, message: &[u8]) -> Option<Vec<u8>> {
        let behavior = self.behaviors.lock().get(&node_id).cloned()?;
        let seen = {
            let mut requests_seen = self.requests_seen.lock();
            let seen = requests_seen.entry(node_id).or_insert(0);
            *seen += 1;
            *seen
        };
        match behavior {
            Behavior::Sign(key) | Behavior::WrongKey(key) => {
                Some(SignatureResponse::signed(key.sign_bytes(message)).encode().unwrap())
            }
            Behavior::SilentOnce(key) if seen > 1 => {
                Some(SignatureResponse::signed(key.sign_bytes(message)).encode().unwrap())
            }
            Behavior::Decline => Some(SignatureResponse::declined().encode().unwrap()),
            Behavior::Garbage => Some(b"not a response".to_vec()),
            Behavior::Silent | Behavior::SilentOnce(_) | Behavior::Unreachable => None,
        }
    }
}

#[async_trait]
impl PeerNetwork for MockNetwork {
    async fn connected_peers(&self) -> HashSet<NodeId> {
        self.connected.lock().clone()
    }

    fn track_subnet(&self, subnet_id: SubnetId) {
        self.tracked.lock().push(subnet_id);
    }

    fn send(
        &self,
        request: OutboundRequest,
        targets: &HashSet<NodeId>,
        _subnet_id: SubnetId,
        _policy: AllowPolicy,
    ) -> HashSet<NodeId> {
        self.sends
            .lock()
            .push((request.request_id, targets.clone()));

        let decoded = SignatureRequest::decode(&request.payload).unwrap();
        let message = decoded.message.bytes();

        let mut sent = HashSet::new();
        for node_id in targets {
            let unreachable = matches!(
                self.behaviors.lock().get(node_id),
                None | Some(Behavior::Unreachable)
            );
            if unreachable {
                continue;
            }
            sent.insert(*node_id);
            if let Some(response) = self.respond(*node_id, &message) {
                if let Some(handler) = self.handler.get() {
                    handler.deliver(request.chain_id, request.request_id, *node_id, response);
                }
            }
        }
        sent
    }
}

// ============================================================================
// Mock Validator Source
// ============================================================================

/// Source serving one validator set per subnet.
pub struct MockValidatorSource {
    subnets: Mutex<HashMap<ChainId, SubnetId>>,
    sets: Mutex<HashMap<SubnetId, CanonicalValidatorSet>>,
    stakers: Mutex<Vec<OnChainStaker>>,
    fail: AtomicBool,
    pub subnet_lookups: AtomicUsize,
    pub set_lookups: AtomicUsize,
}

impl MockValidatorSource {
    /// Source where `chain()` is validated by `subnet()` with `set`.
    pub fn new(set: CanonicalValidatorSet) -> Self {
        let source = Self {
            subnets: Mutex::new(HashMap::new()),
            sets: Mutex::new(HashMap::new()),
            stakers: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            subnet_lookups: AtomicUsize::new(0),
            set_lookups: AtomicUsize::new(0),
        };
        source.map_chain(chain(), subnet());
        source.set_validators(subnet(), set);
        source
    }

    pub fn map_chain(&self, chain_id: ChainId, subnet_id: SubnetId) {
        self.subnets.lock().insert(chain_id, subnet_id);
    }

    pub fn set_validators(&self, subnet_id: SubnetId, set: CanonicalValidatorSet) {
        self.sets.lock().insert(subnet_id, set);
    }

    pub fn add_staker(&self, node_id: NodeId, balance: Option<u64>) {
        self.stakers.lock().push(OnChainStaker {
            node_id,
            validation_id: ValidationId::new([node_id.as_bytes()[0]; 32]),
            balance,
        });
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("source unavailable".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl ValidatorSetSource for MockValidatorSource {
    async fn get_subnet_id(&self, chain_id: ChainId) -> Result<SubnetId, String> {
        self.subnet_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.subnets
            .lock()
            .get(&chain_id)
            .copied()
            .ok_or_else(|| format!("unknown chain {}", chain_id))
    }

    async fn get_all_validator_sets(
        &self,
        _height: PChainHeight,
    ) -> Result<HashMap<SubnetId, CanonicalValidatorSet>, String> {
        self.set_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.sets.lock().clone())
    }

    async fn get_current_on_chain_stakers(
        &self,
        _subnet_id: SubnetId,
    ) -> Result<Vec<OnChainStaker>, String> {
        self.check()?;
        Ok(self.stakers.lock().clone())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub type TestAggregator = SignatureAggregator<MockValidatorSource, MockNetwork, BlsScheme>;

/// Aggregator wired to a mock network and source.
pub fn harness(
    set: CanonicalValidatorSet,
    config: AggregatorConfig,
) -> (TestAggregator, Arc<MockNetwork>, Arc<MockValidatorSource>) {
    let network = Arc::new(MockNetwork::new());
    let source = Arc::new(MockValidatorSource::new(set));
    let aggregator =
        SignatureAggregator::new(Arc::clone(&source), Arc::clone(&network), BlsScheme, config);
    network.set_response_handler(aggregator.response_handler());
    (aggregator, network, source)
}
