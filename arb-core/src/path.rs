//! Cycle enumeration and per-scan order generation.
//!
//! A [`Path`] is a closed walk through the market graph back to its
//! starting vertex, computed once at startup from the static topology.
//! `generate_orders` re-evaluates that walk against live book prices on
//! every scan, producing a concrete order sequence or `None` if the
//! path can't currently be filled.

use crate::graph::ExchangeCurrency;
use crate::market::Market;
use crate::order::{Order, Side};
use rust_decimal::Decimal;
use std::sync::Arc;

struct Leg {
    side: Side,
    market: Arc<Market>,
}

/// A closed walk `v0 -> v1 -> ... -> v0` through the market graph.
pub struct Path {
    vertices: Vec<Arc<ExchangeCurrency>>,
    legs: Vec<Leg>,
}

impl Path {
    /// Build a path from an ordered, already-closed list of vertices
    /// (`vertices[0] == vertices[last]`), deriving each leg's side and
    /// market from the graph's adjacency. Returns `None` if consecutive
    /// vertices in `vertices` aren't actually connected by an edge,
    /// which should never happen for paths produced by `enumerate_cycles`.
    fn from_vertices(vertices: Vec<Arc<ExchangeCurrency>>) -> Option<Arc<Path>> {
        let mut legs = Vec::with_capacity(vertices.len().saturating_sub(1));

        for pair in vertices.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let edge = from
                .edges()
                .into_iter()
                .find(|e| e.neighbor.currency == to.currency && e.neighbor.exchange == to.exchange)?;

            let side = if edge.market.base == from.currency {
                Side::Sell
            } else {
                Side::Buy
            };

            legs.push(Leg {
                side,
                market: edge.market,
            });
        }

        let path = Arc::new(Path { vertices, legs });
        for leg in &path.legs {
            leg.market.register_path(&path);
        }
        Some(path)
    }

    pub fn vertices(&self) -> &[Arc<ExchangeCurrency>] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Evaluate this path at the current top-of-book prices, starting
    /// with `initial_amount` of the path's origin currency.
    ///
    /// Each leg is sized against the live book, capped by the top
    /// level's available size. The first leg whose requested quantity
    /// exceeds that cap forces a *reduce*: every already-generated leg
    /// is re-sized backwards (by `set_target_amount`/`set_size`) so the
    /// whole path is consistent with the smaller fill, rather than
    /// discarding the scan entirely. Returns `None` if any leg has no
    /// available price, no rule-compliant size exists, or a
    /// back-propagated resize turns out to be impossible.
    pub fn generate_orders(&self, initial_amount: Decimal) -> Option<Vec<Order>> {
        let mut orders: Vec<Order> = Vec::with_capacity(self.legs.len());
        let mut current_amount = initial_amount;

        for leg in &self.legs {
            let top = leg.market.top_for_side(leg.side)?;
            let max_size = top.size;
            let price = top.price;

            let quantity = match leg.side {
                Side::Buy => {
                    if price.is_zero() {
                        return None;
                    }
                    current_amount / price
                }
                Side::Sell => current_amount,
            };

            let reduce = max_size < quantity;
            let bounded_quantity = if reduce { max_size } else { quantity };

            let mut order = Order::new(leg.market.clone(), leg.side, price, bounded_quantity);
            order.maximum_size = bounded_quantity;
            if order.make_valid().is_err() {
                return None;
            }

            if reduce {
                // Walk backward from the just-capped leg: each earlier
                // leg's target amount must match the source amount the
                // leg immediately after it now needs, chaining all the
                // way back to the start of the path.
                let mut revised = Vec::with_capacity(orders.len() + 1);
                let mut needed_amount = order.source_amount();

                for existing in orders.iter().rev() {
                    let mut copy = existing.clone();
                    let result = if copy.market.is_deposit {
                        copy.set_size(needed_amount)
                    } else {
                        copy.set_target_amount(needed_amount, true)
                    };
                    if result.is_err() {
                        return None;
                    }
                    needed_amount = copy.source_amount();
                    revised.insert(0, copy);
                }

                revised.push(order);
                orders = revised;
            } else {
                orders.push(order);
            }

            current_amount = orders.last().unwrap().target_amount(true);
        }

        Some(orders)
    }
}

/// Enumerate every closed walk starting and ending at `start`, up to
/// `max_depth` edges, excluding deposit edges as the very first move
/// (a scan that immediately transfers currency before trading anywhere
/// is never productive) and excluding revisits of any vertex other than
/// `start` itself (simple cycles only).
pub fn enumerate_cycles(start: Arc<ExchangeCurrency>, max_depth: usize) -> Vec<Arc<Path>> {
    let mut found = Vec::new();
    let mut current_path = vec![start.clone()];
    walk(&start, &start, &mut current_path, 1, max_depth, &mut found);
    found
}

fn walk(
    start: &Arc<ExchangeCurrency>,
    current: &Arc<ExchangeCurrency>,
    current_path: &mut Vec<Arc<ExchangeCurrency>>,
    depth: usize,
    max_depth: usize,
    found: &mut Vec<Arc<Path>>,
) {
    if depth > max_depth {
        return;
    }

    if current_path.len() > 1 && Arc::ptr_eq(start, current) {
        if let Some(path) = Path::from_vertices(current_path.clone()) {
            found.push(path);
        }
        return;
    }

    for edge in current.edges() {
        if current_path.len() == 1 && edge.market.is_deposit {
            continue;
        }

        let already_visited = current_path
            .iter()
            .any(|v| Arc::ptr_eq(v, &edge.neighbor));
        if already_visited && !Arc::ptr_eq(&current_path[0], &edge.neighbor) {
            continue;
        }

        current_path.push(edge.neighbor.clone());
        walk(start, &edge.neighbor, current_path, depth + 1, max_depth, found);
        current_path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Currency, ExchangeId, MarketGraph};
    use rust_decimal_macros::dec;

    fn triangle_graph() -> (MarketGraph, ExchangeId) {
        let graph = MarketGraph::new();
        let ex: ExchangeId = "alpha".into();

        let btc_usd = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTCUSD".into(),
            ex.clone(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![],
        ));
        btc_usd.update_bid(dec!(100), dec!(10));
        btc_usd.update_ask(dec!(101), dec!(10));
        graph.register_market(btc_usd);

        let btc_eth = Arc::new(Market::new(
            "BTC".into(),
            "ETH".into(),
            "BTCETH".into(),
            ex.clone(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![],
        ));
        btc_eth.update_bid(dec!(10), dec!(10));
        btc_eth.update_ask(dec!(10.1), dec!(10));
        graph.register_market(btc_eth);

        let eth_usd = Arc::new(Market::new(
            "ETH".into(),
            "USD".into(),
            "ETHUSD".into(),
            ex.clone(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![],
        ));
        eth_usd.update_bid(dec!(9.9), dec!(10));
        eth_usd.update_ask(dec!(10), dec!(10));
        graph.register_market(eth_usd);

        (graph, ex)
    }

    #[test]
    fn test_enumerate_finds_triangle_cycle() {
        let (graph, ex) = triangle_graph();
        let start = graph.vertex(&Currency::new("USD"), &ex).unwrap();

        let cycles = enumerate_cycles(start, 3);
        assert!(cycles.iter().any(|p| p.len() == 3));
    }

    #[test]
    fn test_enumerate_excludes_deposit_as_first_move() {
        let (graph, ex) = triangle_graph();
        graph.add_deposit_edge(Currency::new("USD"), ex.clone(), "beta".into());
        let start = graph.vertex(&Currency::new("USD"), &ex).unwrap();

        let cycles = enumerate_cycles(start, 2);
        for cycle in &cycles {
            let first_vertex = &cycle.vertices()[0];
            let second_vertex = &cycle.vertices()[1];
            assert!(!(first_vertex.exchange == second_vertex.exchange && second_vertex.currency.code() == "USD" && second_vertex.exchange.name() == "beta"));
        }
    }

    #[test]
    fn test_generate_orders_on_profitable_triangle() {
        let (graph, ex) = triangle_graph();
        let start = graph.vertex(&Currency::new("USD"), &ex).unwrap();
        let cycles = enumerate_cycles(start, 3);

        let triangle = cycles.into_iter().find(|p| p.len() == 3).unwrap();
        let orders = triangle.generate_orders(dec!(1000));
        assert!(orders.is_some());
        assert_eq!(orders.unwrap().len(), 3);
    }

    #[test]
    fn test_generate_orders_reduces_and_backpropagates() {
        let (graph, ex) = triangle_graph();
        let start = graph.vertex(&Currency::new("USD"), &ex).unwrap();
        let cycles = enumerate_cycles(start, 3);
        let triangle = cycles.into_iter().find(|p| p.len() == 3).unwrap();

        // An initial amount far larger than the top-of-book size on any
        // leg forces a reduce; the path must still produce a consistent,
        // smaller order sequence rather than None.
        let orders = triangle.generate_orders(dec!(1_000_000)).unwrap();
        let first_source = orders[0].source_amount();
        assert!(first_source <= dec!(1_000_000));
        for pair in orders.windows(2) {
            assert!(pair[0].target_amount(true) >= Decimal::ZERO);
            let _ = pair[1].source_amount();
        }
    }

    #[test]
    fn test_generate_orders_none_when_no_price_available() {
        let (graph, ex) = triangle_graph();
        let start = graph.vertex(&Currency::new("USD"), &ex).unwrap();
        let cycles = enumerate_cycles(start, 3);
        let triangle = cycles.into_iter().find(|p| p.len() == 3).unwrap();

        for v in triangle.vertices() {
            for edge in v.edges() {
                edge.market.reset_prices();
            }
        }

        assert!(triangle.generate_orders(dec!(1000)).is_none());
    }
}
