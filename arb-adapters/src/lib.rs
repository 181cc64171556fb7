//! In-memory simulated `ExchangeAdapter` used by the orchestrator
//! binaries and by tests. Fills credit/debit the shared `MarketGraph`
//! vertex balances directly rather than going over the wire, and
//! terminal status arrives asynchronously through `AdapterEvent`s
//! exactly as a live exchange integration would deliver it.

pub mod simulated;

pub use simulated::{SimulatedAdapter, SimulatedAdapterConfig};
