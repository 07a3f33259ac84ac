//! Signature aggregation.
//!
//! [`SignatureAggregator::create_signed_message`] drives one aggregation:
//!
//! ```text
//! validate quorum -> resolve subnet -> fetch validator set -> check connected stake
//!     -> exclude underfunded -> seed from cache
//!         -> [quorum met] ------------------------------------> aggregate
//!         -> request round -> verify + cache shares -> [quorum met] -> aggregate
//!                 ^                                   |
//!                 |______ backoff, next request id ___| [rounds or time left]
//!                                                     |
//!                                                     +-> not enough signatures
//! ```
//!
//! Rounds are strictly sequential. Within a round every eligible validator is
//! asked concurrently and the round ends when all answered, the target weight
//! is reached, or the round deadline passes.

use crate::cache::SignatureCache;
use crate::config::AggregatorConfig;
use crate::dispatcher::{classify_response, RequestDispatcher, ResponseHandler, ShareOutcome};
use crate::error::{AggregationError, Result};
use crate::exclusion::ExclusionFilter;
use crate::network::{OutboundRequest, PeerNetwork};
use crate::quorum::QuorumRules;
use crate::source::{PChainHeight, ValidatorSetSource};
use parking_lot::RwLock;
use quorumsig_crypto::{BlsScheme, SignatureBytes, SignatureScheme};
use quorumsig_types::{
    CanonicalValidatorSet, ChainId, MessageId, NodeId, SignatureRequest, SignedMessage, SignerBitSet,
    SubnetId, UnsignedMessage,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, field, info, trace, warn, Instrument, Span};

/// Parameters of one aggregation.
#[derive(Debug, Clone)]
pub struct AggregationRequest {
    /// Message to collect signatures for
    pub message: UnsignedMessage,
    /// Evidence forwarded to validators
    pub justification: Vec<u8>,
    /// Subnet asked to sign; `None` means the message's source subnet
    pub signing_subnet: Option<SubnetId>,
    /// Percentage of total weight that must sign
    pub required_quorum_pct: u64,
    /// Best-effort percentage on top of the required quorum
    pub quorum_buffer_pct: u64,
    /// Height to read the validator set at
    pub height: PChainHeight,
    /// Overall deadline; `None` bounds the call by rounds alone
    pub deadline: Option<Instant>,
}

impl AggregationRequest {
    /// Request with explicit quorum percentages and no other options.
    pub fn new(message: UnsignedMessage, required_quorum_pct: u64, quorum_buffer_pct: u64) -> Self {
        Self {
            message,
            justification: Vec::new(),
            signing_subnet: None,
            required_quorum_pct,
            quorum_buffer_pct,
            height: PChainHeight::Proposed,
            deadline: None,
        }
    }

    /// Attach justification bytes.
    pub fn with_justification(mut self, justification: Vec<u8>) -> Self {
        self.justification = justification;
        self
    }

    /// Ask a specific subnet to sign.
    pub fn with_signing_subnet(mut self, subnet_id: SubnetId) -> Self {
        self.signing_subnet = Some(subnet_id);
        self
    }

    /// Read the validator set at `height`.
    pub fn at_height(mut self, height: PChainHeight) -> Self {
        self.height = height;
        self
    }

    /// Give up at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Collects signature shares from a subnet's validators and aggregates them.
///
/// Safe to share between tasks: concurrent calls only share the signature
/// cache, the subnet lookup cache and the request-id counter.
pub struct SignatureAggregator<S, N, C = BlsScheme> {
    source: Arc<S>,
    dispatcher: RequestDispatcher<N>,
    scheme: C,
    cache: SignatureCache,
    exclusion: ExclusionFilter,
    config: AggregatorConfig,
    next_request_id: AtomicU32,
    subnet_ids: RwLock<HashMap<ChainId, SubnetId>>,
}

impl<S, N, C> SignatureAggregator<S, N, C>
where
    S: ValidatorSetSource,
    N: PeerNetwork,
    C: SignatureScheme,
{
    /// Create an aggregator.
    pub fn new(source: Arc<S>, network: Arc<N>, scheme: C, config: AggregatorConfig) -> Self {
        Self {
            source,
            dispatcher: RequestDispatcher::new(network),
            scheme,
            cache: SignatureCache::new(config.signature_cache_size),
            exclusion: ExclusionFilter::new(config.min_validator_balance),
            config,
            next_request_id: AtomicU32::new(0),
            subnet_ids: RwLock::new(HashMap::new()),
        }
    }

    /// Handle the network uses to deliver validator responses.
    pub fn response_handler(&self) -> ResponseHandler {
        self.dispatcher.response_handler()
    }

    /// Shares observed so far.
    pub fn cache(&self) -> &SignatureCache {
        &self.cache
    }

    /// Configuration in use.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Request id the next round will use.
    pub fn next_request_id(&self) -> u32 {
        self.next_request_id.load(Ordering::SeqCst)
    }

    /// Build a request using the configured default quorum.
    pub fn request(&self, message: UnsignedMessage) -> AggregationRequest {
        AggregationRequest::new(
            message,
            self.config.default_required_quorum_pct,
            self.config.default_quorum_buffer_pct,
        )
    }

    /// Resolve `(source_subnet, signing_subnet)` for a message.
    ///
    /// The source subnet is always resolved and cached per chain; the signing
    /// subnet is `explicit` when given, otherwise the source subnet.
    pub async fn select_signing_subnet(
        &self,
        chain_id: ChainId,
        explicit: Option<SubnetId>,
    ) -> Result<(SubnetId, SubnetId)> {
        let cached = self.subnet_ids.read().get(&chain_id).copied();
        let source_subnet = match cached {
            Some(subnet_id) => subnet_id,
            None => {
                let subnet_id = self
                    .source
                    .get_subnet_id(chain_id)
                    .await
                    .map_err(AggregationError::ValidatorSource)?;
                self.subnet_ids.write().insert(chain_id, subnet_id);
                subnet_id
            }
        };
        Ok((source_subnet, explicit.unwrap_or(source_subnet)))
    }

    /// Collect shares until quorum and return the aggregate-signed message.
    pub async fn create_signed_message(&self, request: AggregationRequest) -> Result<SignedMessage> {
        let span = tracing::info_span!(
            "create_signed_message",
            message_id = %request.message.id(),
            source_chain = %request.message.source_chain_id,
            signing_subnet = field::Empty,
        );
        self.aggregate(request).instrument(span).await
    }

    async fn aggregate(&self, request: AggregationRequest) -> Result<SignedMessage> {
        let quorum = QuorumRules::new(request.required_quorum_pct, request.quorum_buffer_pct)?;

        let (source_subnet, signing_subnet) = self
            .select_signing_subnet(request.message.source_chain_id, request.signing_subnet)
            .await?;
        Span::current().record("signing_subnet", field::display(signing_subnet));
        if !signing_subnet.is_primary_network() {
            self.dispatcher.network().track_subnet(signing_subnet);
        }

        let validator_set = self
            .source
            .get_validator_set(signing_subnet, request.height)
            .await
            .map_err(AggregationError::ValidatorSource)?;
        let total_weight = validator_set.total_weight();
        if total_weight == 0 {
            warn!(height = %request.height, "Signing subnet has no validator weight");
            return Err(AggregationError::NoSigners {
                subnet_id: signing_subnet,
            });
        }

        let required = quorum.required_weight(total_weight);
        let target = quorum.target_weight(total_weight);

        let peers = self.dispatcher.network().connected_peers().await;
        let connected = validator_set.connected(&peers);
        if connected.connected_weight < required {
            warn!(
                connected = connected.connected_weight,
                required,
                total = total_weight,
                "Insufficient connected stake"
            );
            return Err(AggregationError::InsufficientConnectedStake {
                connected: connected.connected_weight,
                required,
            });
        }

        let excluded = self
            .exclusion
            .compute(self.source.as_ref(), signing_subnet, &validator_set)
            .await?;

        debug!(
            %source_subnet,
            validators = validator_set.len(),
            total_weight,
            connected_weight = connected.connected_weight,
            excluded = excluded.len(),
            required,
            target,
            "Starting aggregation"
        );

        let mut tally = Tally::new(&validator_set, excluded);
        let message_bytes = request.message.bytes();
        let message_id = request.message.id();

        self.seed_from_cache(&mut tally, &message_id);

        if tally.signed_weight >= required {
            debug!(weight = tally.signed_weight, "Quorum served from cache");
        } else {
            let payload = SignatureRequest::new(request.message.clone(), request.justification.clone())
                .encode()?;
            self.collect(
                &mut tally,
                &connected.connected_nodes,
                &connected.validator_indices,
                RoundContext {
                    chain_id: request.message.source_chain_id,
                    subnet_id: signing_subnet,
                    message_id,
                    message_bytes: &message_bytes,
                    payload: &payload,
                    required,
                    target,
                    deadline: request.deadline,
                },
            )
            .await?;
        }

        self.finish(request.message, &validator_set, tally, quorum)
    }

    fn seed_from_cache(&self, tally: &mut Tally<'_>, message_id: &MessageId) {
        let Some(cached) = self.cache.get(message_id) else {
            return;
        };
        let validator_set = tally.validator_set;
        for (index, validator) in validator_set.validators().iter().enumerate() {
            if tally.excluded.contains(&index) {
                continue;
            }
            if let Some(signature) = cached.get(&validator.public_key_bytes()) {
                tally.add_share(index, *signature);
            }
        }
        debug!(
            shares = tally.shares.len(),
            weight = tally.signed_weight,
            "Seeded shares from cache"
        );
    }

    async fn collect(
        &self,
        tally: &mut Tally<'_>,
        connected_nodes: &HashSet<NodeId>,
        connected_indices: &BTreeSet<usize>,
        ctx: RoundContext<'_>,
    ) -> Result<()> {
        let mut rounds = 0u32;
        let mut buffer_rounds = 0u32;

        while rounds < self.config.max_rounds {
            let eligible: Vec<usize> = connected_indices
                .iter()
                .copied()
                .filter(|i| tally.is_eligible(*i))
                .collect();
            let reachable = tally
                .signed_weight
                .saturating_add(tally.validator_set.weight_of(&eligible));

            if tally.signed_weight >= ctx.required {
                if buffer_rounds >= self.config.buffer_extra_rounds || reachable < ctx.target {
                    break;
                }
                buffer_rounds += 1;
            } else if reachable < ctx.required {
                warn!(
                    signed = tally.signed_weight,
                    reachable,
                    required = ctx.required,
                    "Quorum unreachable with remaining validators"
                );
                break;
            }

            if eligible.is_empty() || ctx.expired() {
                break;
            }

            if rounds > 0 {
                let wake = Instant::now() + self.config.backoff(rounds);
                let wake = ctx.deadline.map_or(wake, |deadline| wake.min(deadline));
                tokio::time::sleep_until(wake).await;
                if ctx.expired() {
                    break;
                }
            }

            let targets: HashSet<NodeId> = eligible
                .iter()
                .filter_map(|i| tally.validator_set.get(*i))
                .flat_map(|v| v.node_ids.iter())
                .filter(|node_id| connected_nodes.contains(*node_id))
                .copied()
                .collect();

            self.run_round(tally, targets, rounds, &ctx).await;
            rounds += 1;

            if tally.signed_weight >= ctx.target {
                break;
            }
        }

        if tally.signed_weight < ctx.required {
            warn!(
                signed = tally.signed_weight,
                required = ctx.required,
                rounds,
                shares = tally.shares.len(),
                declined = tally.declined.len(),
                "Not enough signatures"
            );
            return Err(AggregationError::NotEnoughSignatures {
                signed: tally.signed_weight,
                required: ctx.required,
            });
        }
        Ok(())
    }

    async fn run_round(
        &self,
        tally: &mut Tally<'_>,
        targets: HashSet<NodeId>,
        round: u32,
        ctx: &RoundContext<'_>,
    ) {
        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let round_deadline = Instant::now() + self.config.round_timeout;
        let round_deadline = ctx
            .deadline
            .map_or(round_deadline, |deadline| round_deadline.min(deadline));

        let request = OutboundRequest {
            chain_id: ctx.chain_id,
            request_id,
            timeout: round_deadline.saturating_duration_since(Instant::now()),
            payload: ctx.payload.to_vec(),
        };

        let mut pending = self
            .dispatcher
            .dispatch(request, &targets, ctx.subnet_id, round_deadline);
        debug!(
            round,
            request_id,
            targets = targets.len(),
            dispatched = pending.dispatched(),
            signed = tally.signed_weight,
            "Requesting signatures"
        );

        let validator_set = tally.validator_set;
        while let Some((node_id, response)) = pending.next().await {
            let Some(index) = validator_set.index_of(&node_id) else {
                continue;
            };
            if tally.shares.contains_key(&index) {
                trace!(%node_id, index, "Validator already signed");
                continue;
            }
            let Some(validator) = validator_set.get(index) else {
                continue;
            };
            let public_key = validator.public_key_bytes();

            match classify_response(&response, &public_key, ctx.message_bytes, &self.scheme) {
                ShareOutcome::Signed(signature) => {
                    self.cache.add(ctx.message_id, public_key, signature);
                    tally.add_share(index, signature);
                    trace!(
                        %node_id,
                        index,
                        weight = validator.weight,
                        signed = tally.signed_weight,
                        "Accepted signature share"
                    );
                }
                ShareOutcome::Declined => {
                    tally.declined.insert(index);
                    debug!(%node_id, index, "Validator declined to sign");
                }
                ShareOutcome::Invalid(reason) => {
                    warn!(%node_id, index, reason = %reason, "Invalid signature response");
                }
            }

            if tally.signed_weight >= ctx.target {
                break;
            }
        }
    }

    fn finish(
        &self,
        message: UnsignedMessage,
        validator_set: &CanonicalValidatorSet,
        tally: Tally<'_>,
        quorum: QuorumRules,
    ) -> Result<SignedMessage> {
        let signers: SignerBitSet = tally.shares.keys().copied().collect();
        let shares: Vec<SignatureBytes> = tally.shares.values().copied().collect();
        let signature = self.scheme.aggregate_signatures(&shares)?;

        let signed = SignedMessage::new(message, signers, signature);
        signed
            .verify(validator_set, quorum.required_pct(), &self.scheme)
            .map_err(|e| AggregationError::AggregateVerificationFailed(e.to_string()))?;

        info!(
            signers = signed.signers.count(),
            weight = tally.signed_weight,
            total_weight = validator_set.total_weight(),
            "Created signed message"
        );
        Ok(signed)
    }
}

/// Inputs shared by every round of one aggregation.
struct RoundContext<'a> {
    chain_id: ChainId,
    subnet_id: SubnetId,
    message_id: MessageId,
    message_bytes: &'a [u8],
    payload: &'a [u8],
    required: u64,
    target: u64,
    deadline: Option<Instant>,
}

impl RoundContext<'_> {
    fn expired(&self) -> bool {
        self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
    }
}

/// Call-local accumulation state.
struct Tally<'a> {
    validator_set: &'a CanonicalValidatorSet,
    excluded: BTreeSet<usize>,
    shares: BTreeMap<usize, SignatureBytes>,
    declined: HashSet<usize>,
    signed_weight: u64,
}

impl<'a> Tally<'a> {
    fn new(validator_set: &'a CanonicalValidatorSet, excluded: BTreeSet<usize>) -> Self {
        Self {
            validator_set,
            excluded,
            shares: BTreeMap::new(),
            declined: HashSet::new(),
            signed_weight: 0,
        }
    }

    fn add_share(&mut self, index: usize, signature: SignatureBytes) {
        if self.shares.insert(index, signature).is_none() {
            let weight = self.validator_set.get(index).map_or(0, |v| v.weight);
            self.signed_weight = self.signed_weight.saturating_add(weight);
        }
    }

    fn is_eligible(&self, index: usize) -> bool {
        !self.excluded.contains(&index)
            && !self.declined.contains(&index)
            && !self.shares.contains_key(&index)
    }
}
