//! # QuorumSig Aggregator
//!
//! Collects signature shares from the validators of a weighted validator set
//! and combines them into one aggregate BLS signature proving that a quorum of
//! stake attested to a message.
//!
//! ## Features
//!
//! - **Quorum rules** with a best-effort safety buffer on top of the required
//!   percentage
//! - **Exclusion** of validators whose on-chain stake is insufficient
//! - **Signature cache** so repeated aggregations of a message reuse shares
//! - **Bounded retry rounds** with per-round timeouts, capped exponential
//!   backoff and request-id correlation of asynchronous responses
//!
//! ## Aggregation Flow
//!
//! ```text
//! caller
//!   │  create_signed_message(request)
//!   ▼
//! ┌────────────────────┐   ValidatorSetSource: subnet, validator set, stakers
//! │ SignatureAggregator│◄──────────────────────────────────────────────
//! │                    │   SignatureCache: previously verified shares
//! │                    │◄──────────────────────────────────────────────
//! │                    │   RequestDispatcher ──► PeerNetwork ──► validators
//! │                    │◄── ResponseHandler ◄── inbound responses ◄──┘
//! └─────────┬──────────┘
//!           ▼
//!     SignedMessage (aggregate signature + signer bitset)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use quorumsig_aggregator::{AggregatorConfig, SignatureAggregator};
//! use quorumsig_crypto::BlsScheme;
//! use std::sync::Arc;
//!
//! let aggregator = SignatureAggregator::new(
//!     Arc::new(source),
//!     Arc::clone(&network),
//!     BlsScheme,
//!     AggregatorConfig::default(),
//! );
//! network.set_response_handler(aggregator.response_handler());
//!
//! let request = aggregator.request(message).with_deadline(deadline);
//! let signed = aggregator.create_signed_message(request).await?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod exclusion;
pub mod network;
pub mod quorum;
pub mod source;

// Re-export main types at crate root for convenience
pub use aggregator::{AggregationRequest, SignatureAggregator};
pub use cache::{BoundedCache, SignatureCache};
pub use config::AggregatorConfig;
pub use dispatcher::{PendingRound, RequestDispatcher, ResponseHandler};
pub use error::{AggregationError, Result};
pub use exclusion::ExclusionFilter;
pub use network::{AllowPolicy, OutboundRequest, PeerNetwork};
pub use quorum::QuorumRules;
pub use source::{OnChainStaker, PChainHeight, ValidatorSetSource};
