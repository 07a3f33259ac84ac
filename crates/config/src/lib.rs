//! # QuorumSig Configuration
//!
//! Configuration parsing and logging setup for the signature aggregation
//! engine.
//!
//! All settings live in one TOML file. Every section is optional and falls
//! back to its defaults.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quorumsig_config::{init_tracing, Config};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("quorumsig.toml"))?;
//! init_tracing(&config.logging)?;
//!
//! println!("Rounds: {}", config.aggregator.max_rounds);
//! ```
//!
//! ## Configuration Sections
//!
//! - `[aggregator]` - Quorum defaults, retry rounds, backoff, cache size and
//!   minimum staking balance
//! - `[logging]` - Log level and output format

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

mod config;
mod error;
mod logging;

pub use config::*;
pub use error::*;
pub use logging::init_tracing;
