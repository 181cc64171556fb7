//! The interface the core consumes to talk to a concrete exchange.
//!
//! No real exchange adapter ships in this repo; `arb-adapters` provides
//! the in-memory simulated implementation used by tests and the demo
//! binaries. A live adapter (Binance, Coinbase, etc.) would implement
//! this same trait.

use crate::errors::ArbError;
use crate::ids::OrderId;
use crate::order::Order;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Completed,
    Rejected,
}

/// A terminal or interim update for a previously-submitted order.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Everything an adapter can push back to the orchestrator asynchronously.
#[derive(Debug, Clone)]
pub enum AdapterEvent {
    OrderUpdate(OrderUpdate),
    BalanceUpdate {
        currency: String,
        new_balance: Decimal,
    },
    /// A ladder for one of the adapter's markets changed; the market key
    /// (`exchange:symbol`) identifies which one needs rescanning.
    MarketUpdate { market_key: String },
}

/// A language-neutral description of an HTTP request a Request
/// Dispatcher would transport; concrete adapters translate an `Order`
/// into one of these rather than performing I/O inline.
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected,
}

/// One connected exchange. Implementors own their market/currency
/// bookkeeping and push [`AdapterEvent`]s back asynchronously; the core
/// never polls an adapter for state.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Stable identifier, e.g. `"binance"`.
    fn id(&self) -> &str;

    /// Populate markets/currencies, seed fees, start streams, and signal
    /// ready once the adapter can accept `submit` calls.
    async fn initialize(&self) -> Result<(), ArbError>;

    /// Terminate all streams and worker tasks.
    async fn stop(&self);

    /// Submit an order. The terminal outcome (filled/rejected) arrives
    /// later via an [`AdapterEvent::OrderUpdate`], not this return value.
    async fn submit(&self, order: &Order) -> Result<SubmitOutcome, ArbError>;

    /// Produce a transport-agnostic request descriptor for `order`,
    /// for adapters that route through a shared Request Dispatcher.
    fn generate_request(&self, order: &Order) -> AdapterRequest;
}
