//! The market graph: currency-on-exchange vertices, adjacency, and the
//! registry that wires markets and synthetic deposit edges together.

use crate::market::Market;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// A currency code (e.g. `BTC`), interned as a cheaply-cloneable string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Currency(Arc<str>);

impl Currency {
    pub fn new(code: impl Into<Arc<str>>) -> Self {
        Self(code.into())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifies one exchange among the configured set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExchangeId(Arc<str>);

impl ExchangeId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExchangeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A directed edge out of an [`ExchangeCurrency`]: trade or deposit via
/// `market` lands you at `neighbor`.
#[derive(Clone)]
pub struct Edge {
    pub neighbor: Arc<ExchangeCurrency>,
    pub market: Arc<Market>,
}

/// A `(Currency, Exchange)` vertex in the market graph.
pub struct ExchangeCurrency {
    pub currency: Currency,
    pub exchange: ExchangeId,
    balance: Mutex<Decimal>,
    adjacency: Mutex<Vec<Edge>>,
}

impl ExchangeCurrency {
    fn new(currency: Currency, exchange: ExchangeId) -> Self {
        Self {
            currency,
            exchange,
            balance: Mutex::new(Decimal::ZERO),
            adjacency: Mutex::new(Vec::new()),
        }
    }

    pub fn balance(&self) -> Decimal {
        *self.balance.lock()
    }

    pub fn set_balance(&self, amount: Decimal) {
        *self.balance.lock() = amount;
    }

    pub fn credit(&self, amount: Decimal) {
        *self.balance.lock() += amount;
    }

    pub fn debit(&self, amount: Decimal) {
        *self.balance.lock() -= amount;
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.adjacency.lock().clone()
    }

    fn add_edge(&self, edge: Edge) {
        self.adjacency.lock().push(edge);
    }
}

impl PartialEq for ExchangeCurrency {
    fn eq(&self, other: &Self) -> bool {
        self.currency == other.currency && self.exchange == other.exchange
    }
}
impl Eq for ExchangeCurrency {}

impl fmt::Debug for ExchangeCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.currency, self.exchange)
    }
}

/// Owns every vertex and market in the system and wires adjacency between
/// them. Populated once at startup by the orchestrator; immutable
/// thereafter except for balances and ladders, which carry their own
/// interior mutability.
#[derive(Default)]
pub struct MarketGraph {
    vertices: DashMap<(Currency, ExchangeId), Arc<ExchangeCurrency>>,
    markets: DashMap<String, Arc<Market>>,
}

impl MarketGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex(&self, currency: &Currency, exchange: &ExchangeId) -> Option<Arc<ExchangeCurrency>> {
        self.vertices
            .get(&(currency.clone(), exchange.clone()))
            .map(|v| v.clone())
    }

    pub fn get_or_create_vertex(&self, currency: Currency, exchange: ExchangeId) -> Arc<ExchangeCurrency> {
        self.vertices
            .entry((currency.clone(), exchange.clone()))
            .or_insert_with(|| Arc::new(ExchangeCurrency::new(currency, exchange)))
            .clone()
    }

    /// Register a trading market, wiring adjacency in both directions
    /// (base -> quote via a SELL edge, quote -> base via a BUY edge).
    pub fn register_market(&self, market: Arc<Market>) {
        let base_vertex = self.get_or_create_vertex(market.base.clone(), market.exchange.clone());
        let quote_vertex = self.get_or_create_vertex(market.quote.clone(), market.exchange.clone());

        base_vertex.add_edge(Edge {
            neighbor: quote_vertex.clone(),
            market: market.clone(),
        });
        quote_vertex.add_edge(Edge {
            neighbor: base_vertex,
            market: market.clone(),
        });

        self.markets.insert(market.key(), market);
    }

    /// Register a synthetic, directional inter-exchange deposit edge for
    /// `currency` from `from_exchange` to `to_exchange`. Per the
    /// enumerator's rule, deposit edges are only ever excluded as the
    /// first move out of the scan's start vertex, never elsewhere.
    pub fn add_deposit_edge(&self, currency: Currency, from_exchange: ExchangeId, to_exchange: ExchangeId) {
        let market = Arc::new(Market::deposit(currency.clone(), from_exchange.clone(), to_exchange.clone()));

        let from_vertex = self.get_or_create_vertex(currency.clone(), from_exchange);
        let to_vertex = self.get_or_create_vertex(currency, to_exchange);

        from_vertex.add_edge(Edge {
            neighbor: to_vertex,
            market: market.clone(),
        });

        self.markets.insert(market.key(), market);
    }

    pub fn market(&self, key: &str) -> Option<Arc<Market>> {
        self.markets.get(key).map(|m| m.clone())
    }

    pub fn markets(&self) -> Vec<Arc<Market>> {
        self.markets.iter().map(|m| m.clone()).collect()
    }

    pub fn vertices(&self) -> Vec<Arc<ExchangeCurrency>> {
        self.vertices.iter().map(|v| v.clone()).collect()
    }
}
