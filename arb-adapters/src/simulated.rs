//! A simulated exchange: every order fills at its quoted price after a
//! configurable delay, crediting/debiting the graph's vertex balances
//! directly instead of going over the wire.

use arb_core::adapter::{AdapterEvent, AdapterRequest, ExchangeAdapter, OrderStatus, OrderUpdate, SubmitOutcome};
use arb_core::errors::ArbError;
use arb_core::graph::MarketGraph;
use arb_core::order::Order;
use async_trait::async_trait;
use crossbeam::channel::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SimulatedAdapterConfig {
    /// Delay between accepting an order and reporting its fill.
    pub fill_delay: Duration,
    /// Orders whose source amount exceeds this are rejected outright.
    /// `None` disables the check.
    pub reject_above: Option<rust_decimal::Decimal>,
}

impl Default for SimulatedAdapterConfig {
    fn default() -> Self {
        Self {
            fill_delay: Duration::from_millis(50),
            reject_above: None,
        }
    }
}

/// Fills every accepted order in-process against the shared
/// [`MarketGraph`] balances, and pushes an [`AdapterEvent`] for each
/// terminal state change onto a bounded channel the orchestrator drains.
pub struct SimulatedAdapter {
    id: String,
    graph: Arc<MarketGraph>,
    config: SimulatedAdapterConfig,
    events_tx: Sender<AdapterEvent>,
}

impl SimulatedAdapter {
    pub fn new(id: impl Into<String>, graph: Arc<MarketGraph>, config: SimulatedAdapterConfig) -> (Self, Receiver<AdapterEvent>) {
        let (tx, rx) = crossbeam::channel::bounded(4096);
        (
            Self {
                id: id.into(),
                graph,
                config,
                events_tx: tx,
            },
            rx,
        )
    }

    fn settle(&self, order: &Order) {
        let Some(source_vertex) = self.graph.vertex(&order.source_currency(), &order.market.exchange) else {
            return;
        };
        let Some(target_vertex) = self.graph.vertex(&order.target_currency(), &order.market.to_exchange) else {
            return;
        };

        source_vertex.debit(order.source_amount());
        target_vertex.credit(order.target_amount(true));
    }
}

#[async_trait]
impl ExchangeAdapter for SimulatedAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn initialize(&self) -> Result<(), ArbError> {
        info!(exchange = %self.id, "simulated adapter initialized");
        Ok(())
    }

    async fn stop(&self) {
        debug!(exchange = %self.id, "simulated adapter stopped");
    }

    async fn submit(&self, order: &Order) -> Result<SubmitOutcome, ArbError> {
        if let Some(limit) = self.config.reject_above {
            if order.source_amount() > limit {
                return Ok(SubmitOutcome::Rejected);
            }
        }

        self.settle(order);

        let order_id = order.id();
        let tx = self.events_tx.clone();
        let delay = self.config.fill_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AdapterEvent::OrderUpdate(OrderUpdate {
                order_id,
                status: OrderStatus::Completed,
            }));
        });

        Ok(SubmitOutcome::Accepted)
    }

    fn generate_request(&self, order: &Order) -> AdapterRequest {
        AdapterRequest {
            method: "POST".into(),
            url: format!("simulated://{}/orders", self.id),
            headers: vec![("content-type".into(), "application/json".into())],
            body: Some(format!(
                "{{\"market\":\"{}\",\"side\":\"{}\",\"price\":\"{}\",\"quantity\":\"{}\"}}",
                order.market.symbol, order.side, order.price, order.quantity
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::market::Market;
    use arb_core::order::Side;
    use rust_decimal_macros::dec;

    fn graph_with_balance(market: &Arc<Market>, currency: &str, amount: rust_decimal::Decimal) -> Arc<MarketGraph> {
        let graph = Arc::new(MarketGraph::new());
        graph.register_market(market.clone());
        graph
            .get_or_create_vertex(currency.into(), market.exchange.clone())
            .set_balance(amount);
        graph
    }

    #[tokio::test]
    async fn test_submit_settles_balances_immediately() {
        let market = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTC-USD".into(),
            "alpha".into(),
            rust_decimal::Decimal::ZERO,
            rust_decimal::Decimal::ZERO,
            vec![],
        ));
        let graph = graph_with_balance(&market, "USD", dec!(1000));
        let (adapter, _rx) = SimulatedAdapter::new("alpha", graph.clone(), SimulatedAdapterConfig::default());

        let order = Order::new(market.clone(), Side::Buy, dec!(100), dec!(2));
        let outcome = adapter.submit(&order).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted);

        let usd = graph.vertex(&"USD".into(), &"alpha".into()).unwrap();
        let btc = graph.vertex(&"BTC".into(), &"alpha".into()).unwrap();
        assert_eq!(usd.balance(), dec!(800));
        assert_eq!(btc.balance(), dec!(2));
    }

    #[tokio::test]
    async fn test_submit_rejects_above_configured_limit() {
        let market = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTC-USD".into(),
            "alpha".into(),
            rust_decimal::Decimal::ZERO,
            rust_decimal::Decimal::ZERO,
            vec![],
        ));
        let graph = graph_with_balance(&market, "USD", dec!(1000));
        let config = SimulatedAdapterConfig {
            reject_above: Some(dec!(50)),
            ..Default::default()
        };
        let (adapter, _rx) = SimulatedAdapter::new("alpha", graph, config);

        let order = Order::new(market, Side::Buy, dec!(100), dec!(2));
        let outcome = adapter.submit(&order).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_submit_settles_deposit_to_destination_exchange() {
        let market = Arc::new(Market::deposit("BTC".into(), "alpha".into(), "beta".into()));
        let graph = Arc::new(MarketGraph::new());
        graph
            .get_or_create_vertex("BTC".into(), "alpha".into())
            .set_balance(dec!(5));
        graph.get_or_create_vertex("BTC".into(), "beta".into());
        let (adapter, _rx) = SimulatedAdapter::new("alpha", graph.clone(), SimulatedAdapterConfig::default());

        let order = Order::new(market, Side::Sell, rust_decimal::Decimal::ONE, dec!(2));
        let outcome = adapter.submit(&order).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted);

        let alpha_btc = graph.vertex(&"BTC".into(), &"alpha".into()).unwrap();
        let beta_btc = graph.vertex(&"BTC".into(), &"beta".into()).unwrap();
        assert_eq!(alpha_btc.balance(), dec!(3));
        assert_eq!(beta_btc.balance(), dec!(2));
    }

    #[tokio::test]
    async fn test_fill_event_arrives_after_delay() {
        let market = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTC-USD".into(),
            "alpha".into(),
            rust_decimal::Decimal::ZERO,
            rust_decimal::Decimal::ZERO,
            vec![],
        ));
        let graph = graph_with_balance(&market, "USD", dec!(1000));
        let config = SimulatedAdapterConfig {
            fill_delay: Duration::from_millis(5),
            ..Default::default()
        };
        let (adapter, rx) = SimulatedAdapter::new("alpha", graph, config);

        let order = Order::new(market, Side::Buy, dec!(100), dec!(1));
        let order_id = order.id();
        adapter.submit(&order).await.unwrap();

        let event = rx.recv_timeout(Duration::from_millis(200)).unwrap();
        match event {
            AdapterEvent::OrderUpdate(update) => {
                assert_eq!(update.order_id, order_id);
                assert_eq!(update.status, OrderStatus::Completed);
            }
            _ => panic!("expected an OrderUpdate event"),
        }
    }
}
