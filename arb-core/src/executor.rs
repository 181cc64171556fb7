//! Turns a candidate order sequence into dispatched orders, partitioning
//! it into independently-advancing chains and tracking each leg through
//! to completion.

use crate::adapter::{ExchangeAdapter, OrderStatus, SubmitOutcome};
use crate::errors::ArbError;
use crate::graph::{ExchangeId, MarketGraph};
use crate::ids::{OrderId, SequenceId};
use crate::journal::Journal;
use crate::order::Order;
use crate::scanner::AdmissionControl;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Split `orders` into chains: a deposit order always starts a new
/// chain; a change of exchange starts a new chain; and within a chain,
/// any order whose source balance is independently sufficient — so it
/// doesn't have to wait on the previous leg to settle — closes the
/// current chain and opens a new one headed by that order.
fn partition_chains(orders: &[Order], graph: &MarketGraph) -> Vec<Vec<usize>> {
    let mut chains: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_exchange: Option<ExchangeId> = None;

    for (i, order) in orders.iter().enumerate() {
        let executable = graph
            .vertex(&order.source_currency(), &order.market.exchange)
            .map(|v| order.can_be_executed(&v))
            .unwrap_or(false);

        let starts_new_chain = order.market.is_deposit
            || current_exchange.as_ref() != Some(&order.market.exchange)
            || (!current.is_empty() && executable);

        if starts_new_chain && !current.is_empty() {
            chains.push(std::mem::take(&mut current));
        }

        current.push(i);
        current_exchange = Some(order.market.to_exchange.clone());
    }

    if !current.is_empty() {
        chains.push(current);
    }

    chains
}

struct SequenceState {
    remaining_leg_count: u32,
}

/// Owns the adapter registry and drives every in-flight sequence from
/// dispatch through completion.
pub struct Executor {
    adapters: DashMap<ExchangeId, Arc<dyn ExchangeAdapter>>,
    journal: Arc<dyn Journal>,
    admission: Arc<AdmissionControl>,
    graph: Arc<MarketGraph>,
    allow_sequential_within_exchange: bool,
    trading_enabled: Arc<AtomicBool>,
    sequences: Mutex<HashMap<SequenceId, SequenceState>>,
    next_order_of: DashMap<OrderId, Option<OrderId>>,
    order_to_sequence: DashMap<OrderId, SequenceId>,
    pending_orders: DashMap<OrderId, Order>,
}

impl Executor {
    pub fn new(
        graph: Arc<MarketGraph>,
        journal: Arc<dyn Journal>,
        admission: Arc<AdmissionControl>,
        allow_sequential_within_exchange: bool,
    ) -> Self {
        Self {
            adapters: DashMap::new(),
            journal,
            admission,
            graph,
            allow_sequential_within_exchange,
            trading_enabled: Arc::new(AtomicBool::new(false)),
            sequences: Mutex::new(HashMap::new()),
            next_order_of: DashMap::new(),
            order_to_sequence: DashMap::new(),
            pending_orders: DashMap::new(),
        }
    }

    pub fn register_adapter(&self, exchange: ExchangeId, adapter: Arc<dyn ExchangeAdapter>) {
        self.adapters.insert(exchange, adapter);
    }

    pub fn set_trading_enabled(&self, enabled: bool) {
        self.trading_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn trading_enabled(&self) -> bool {
        self.trading_enabled.load(Ordering::SeqCst)
    }

    fn adapter_for(&self, exchange: &ExchangeId) -> Option<Arc<dyn ExchangeAdapter>> {
        self.adapters.get(exchange).map(|a| a.clone())
    }

    fn is_executable(&self, order: &Order) -> bool {
        self.graph
            .vertex(&order.source_currency(), &order.market.exchange)
            .map(|v| order.can_be_executed(&v))
            .unwrap_or(false)
    }

    /// Partition, pre-flight check, register, journal, and dispatch the
    /// first order of every chain. Returns the assigned sequence id, or
    /// an error if the sequence fails pre-flight and is rejected whole.
    pub async fn dispatch_sequence(&self, orders: Vec<Order>) -> Result<SequenceId, ArbError> {
        if orders.is_empty() {
            return Err(ArbError::Config("cannot dispatch an empty order sequence".into()));
        }

        let chains = partition_chains(&orders, &self.graph);

        if !self.allow_sequential_within_exchange && chains.iter().any(|c| c.len() > 1) {
            warn!("rejecting sequence: sequential-within-exchange chains are disallowed");
            return Err(ArbError::AdapterReject {
                order_id: orders[0].id(),
                reason: "sequential chain disallowed by configuration".into(),
            });
        }

        for chain in &chains {
            let head = &orders[chain[0]];
            if !self.is_executable(head) {
                warn!("rejecting sequence: chain head not executable at dispatch time");
                return Err(ArbError::AdapterReject {
                    order_id: head.id(),
                    reason: "chain head not executable at dispatch time".into(),
                });
            }
        }

        let sequence_id = SequenceId::generate();
        let leg_count = orders.len() as u32;

        for chain in &chains {
            for pair in chain.windows(2) {
                let (current, next) = (orders[pair[0]].id(), orders[pair[1]].id());
                self.next_order_of.insert(current, Some(next));
            }
            if let Some(&last) = chain.last() {
                self.next_order_of.insert(orders[last].id(), None);
            }
        }

        for order in &orders {
            self.order_to_sequence.insert(order.id(), sequence_id);
            self.pending_orders.insert(order.id(), order.clone());
            if order.market.is_deposit {
                self.journal.record_transfer(order);
            }
        }
        self.journal.record_sequence(sequence_id, &orders);

        self.sequences.lock().insert(
            sequence_id,
            SequenceState {
                remaining_leg_count: leg_count,
            },
        );
        self.admission.mark_started(Instant::now());

        for chain in &chains {
            let head = &orders[chain[0]];
            self.submit(head).await;
        }

        Ok(sequence_id)
    }

    async fn submit(&self, order: &Order) {
        let Some(adapter) = self.adapter_for(&order.market.exchange) else {
            error!(exchange = %order.market.exchange, "no adapter registered for exchange");
            return;
        };

        match adapter.submit(order).await {
            Ok(SubmitOutcome::Accepted) => {
                info!(order_id = %order.id(), "order accepted");
            }
            Ok(SubmitOutcome::Rejected) => {
                warn!(order_id = %order.id(), "order rejected at submit time");
                self.on_order_update(order.id(), OrderStatus::Rejected).await;
            }
            Err(e) => {
                error!(order_id = %order.id(), error = %e, "submit failed");
                self.on_order_update(order.id(), OrderStatus::Rejected).await;
            }
        }
    }

    /// Drive sequence bookkeeping from an order's terminal (or interim)
    /// status. On completion, submits the next order in its chain, if
    /// any and trading is enabled; decrements the sequence's remaining
    /// leg count either way, closing the sequence out at zero.
    pub async fn on_order_update(&self, order_id: OrderId, status: OrderStatus) {
        if status == OrderStatus::Pending {
            return;
        }

        if status == OrderStatus::Completed {
            if let Some(next_id) = self.next_order_of.get(&order_id).and_then(|v| v.clone()) {
                if self.trading_enabled() {
                    if let Some(next_order) = self.pending_orders.get(&next_id).map(|o| o.clone()) {
                        self.submit(&next_order).await;
                    }
                }
            }
        }

        let Some(sequence_id) = self.order_to_sequence.get(&order_id).map(|s| *s) else {
            return;
        };

        let mut sequences = self.sequences.lock();
        if let Some(state) = sequences.get_mut(&sequence_id) {
            state.remaining_leg_count = state.remaining_leg_count.saturating_sub(1);
            if state.remaining_leg_count == 0 {
                sequences.remove(&sequence_id);
                drop(sequences);
                info!(%sequence_id, "sequence completed");
                self.admission.mark_completed();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterRequest;
    use crate::market::Market;
    use crate::order::Side;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct NullJournal;
    impl Journal for NullJournal {
        fn record_transfer(&self, _: &Order) {}
        fn record_sequence(&self, _: SequenceId, _: &[Order]) {}
    }

    struct CountingAdapter {
        id: String,
        submits: AtomicUsize,
    }

    #[async_trait]
    impl ExchangeAdapter for CountingAdapter {
        fn id(&self) -> &str {
            &self.id
        }
        async fn initialize(&self) -> Result<(), ArbError> {
            Ok(())
        }
        async fn stop(&self) {}
        async fn submit(&self, _order: &Order) -> Result<SubmitOutcome, ArbError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            Ok(SubmitOutcome::Accepted)
        }
        fn generate_request(&self, _order: &Order) -> AdapterRequest {
            AdapterRequest {
                method: "POST".into(),
                url: String::new(),
                headers: vec![],
                body: None,
            }
        }
    }

    fn test_executor() -> (Executor, Arc<MarketGraph>) {
        let graph = Arc::new(MarketGraph::new());
        let journal = Arc::new(NullJournal);
        let admission = Arc::new(AdmissionControl::new(true, 0, Duration::ZERO));
        let executor = Executor::new(graph.clone(), journal, admission, true);
        (executor, graph)
    }

    #[tokio::test]
    async fn test_dispatch_rejects_when_chain_head_not_executable() {
        let (executor, graph) = test_executor();
        let market = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTCUSD".into(),
            "alpha".into(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![],
        ));
        graph.register_market(market.clone());
        // No balance credited: the first leg cannot be executed.
        let order = Order::new(market, Side::Buy, dec!(100), dec!(1));

        let result = executor.dispatch_sequence(vec![order]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_submits_chain_heads_and_completes_sequence() {
        let (executor, graph) = test_executor();
        let market = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTCUSD".into(),
            "alpha".into(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![],
        ));
        graph.register_market(market.clone());
        let vertex = graph.get_or_create_vertex("USD".into(), "alpha".into());
        vertex.set_balance(dec!(1000));

        let adapter = Arc::new(CountingAdapter {
            id: "alpha".into(),
            submits: AtomicUsize::new(0),
        });
        executor.register_adapter("alpha".into(), adapter.clone());
        executor.set_trading_enabled(true);

        let order = Order::new(market, Side::Buy, dec!(100), dec!(1));
        let order_id = order.id();

        let sequence_id = executor.dispatch_sequence(vec![order]).await.unwrap();
        assert_eq!(adapter.submits.load(Ordering::SeqCst), 1);
        assert_eq!(executor.admission.current_sequences(), 1);

        executor.on_order_update(order_id, OrderStatus::Completed).await;
        assert_eq!(executor.admission.current_sequences(), 0);
        assert!(!executor.sequences.lock().contains_key(&sequence_id));
    }

    #[test]
    fn test_partition_chains_splits_on_deposit_and_exchange_change() {
        let graph = MarketGraph::new();
        let alpha_market = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTCUSD".into(),
            "alpha".into(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![],
        ));
        let deposit_market = Arc::new(Market::deposit("BTC".into(), "alpha".into(), "beta".into()));
        let beta_market = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTCUSD".into(),
            "beta".into(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![],
        ));

        let o1 = Order::new(alpha_market, Side::Buy, dec!(100), dec!(1));
        let o2 = Order::new(deposit_market, Side::Sell, Decimal::ONE, dec!(1));
        let o3 = Order::new(beta_market, Side::Sell, dec!(101), dec!(1));

        let chains = partition_chains(&[o1, o2, o3], &graph);
        // o1 stands alone on alpha. o2 is a deposit into beta, so it opens
        // chain 2; o3 trades on beta, the deposit's destination, and joins
        // the chain the deposit just started.
        assert_eq!(chains, vec![vec![0], vec![1, 2]]);
    }
}
