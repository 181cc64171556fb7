//! arb-core - Cross-exchange arbitrage detection and execution engine
//!
//! This crate builds and searches a multi-exchange currency graph for
//! profitable closed trading cycles, then dispatches the resulting order
//! sequences through a pluggable [`adapter::ExchangeAdapter`].
//!
//! ## Core Modules
//! - `ids`: lazily-generated order/sequence identifiers
//! - `errors`: domain error types
//! - `ladder`: sorted order-book price ladder
//! - `rules`: pluggable order-sizing rules (`SizeRule`, `ValueRule`)
//! - `order`: typed directed trade across a market
//! - `market`: a tradable pair on one exchange
//! - `graph`: currency-on-exchange vertices and adjacency
//! - `path`: cycle enumeration and per-scan order generation
//! - `scanner`: admission-controlled opportunity scanning
//! - `executor`: chain partitioning and sequence dispatch
//! - `adapter`: the boundary trait a concrete exchange integration fills in
//! - `journal`: append-only execution log
//! - `config`: runtime configuration
//! - `monitoring`: Prometheus metrics + HTTP exporter
//! - `resilience`: backoff, kill switch, panic handling
//! - `utils`: logging setup

pub mod adapter;
pub mod config;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod ids;
pub mod journal;
pub mod ladder;
pub mod market;
pub mod monitoring;
pub mod order;
pub mod path;
pub mod resilience;
pub mod rules;
pub mod scanner;
pub mod utils;

pub use errors::ArbError;
pub use ids::{OrderId, SequenceId};
pub use order::{Order, Side};

// Error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::adapter::{AdapterEvent, ExchangeAdapter, OrderUpdate};
    pub use crate::config::Config;
    pub use crate::errors::{ArbError, ImpossibleOrder};
    pub use crate::executor::Executor;
    pub use crate::graph::{ExchangeCurrency, ExchangeId};
    pub use crate::ids::{OrderId, SequenceId};
    pub use crate::journal::{AsyncJournal, Journal};
    pub use crate::ladder::Ladder;
    pub use crate::market::Market;
    pub use crate::order::{Order, Side};
    pub use crate::path::Path;
    pub use crate::scanner::Scanner;
    pub use crate::{Error, Result};
}
