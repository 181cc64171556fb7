//! A tradable pair on one exchange: two ladders, a fee schedule, and the
//! rules an order placed on it must satisfy.

use crate::graph::{Currency, ExchangeId};
use crate::ladder::{BookSide, Ladder, Level};
use crate::order::{Order, Side};
use crate::rules::Rule;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::{Arc, Weak};

use crate::path::Path;

/// A base/quote pair on one exchange, or a synthetic 1:1 deposit edge
/// between the same currency on two exchanges.
pub struct Market {
    pub base: Currency,
    pub quote: Currency,
    pub symbol: String,
    pub exchange: ExchangeId,
    /// Where this market lands you. Equal to `exchange` for an ordinary
    /// trading pair (a trade never changes exchange); the deposit's
    /// destination exchange for a synthetic deposit edge.
    pub to_exchange: ExchangeId,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    pub is_deposit: bool,
    rules: Vec<Box<dyn Rule>>,
    bid: Mutex<Ladder>,
    ask: Mutex<Ladder>,
    paths: Mutex<Vec<Weak<Path>>>,
}

impl Market {
    pub fn new(
        base: Currency,
        quote: Currency,
        symbol: String,
        exchange: ExchangeId,
        maker_fee: Decimal,
        taker_fee: Decimal,
        rules: Vec<Box<dyn Rule>>,
    ) -> Self {
        Self {
            base,
            quote,
            symbol,
            to_exchange: exchange.clone(),
            exchange,
            maker_fee,
            taker_fee,
            is_deposit: false,
            rules,
            bid: Mutex::new(Ladder::new(BookSide::Bid)),
            ask: Mutex::new(Ladder::new(BookSide::Ask)),
            paths: Mutex::new(Vec::new()),
        }
    }

    /// A synthetic inter-exchange deposit edge: zero fees, no rules,
    /// seeded 1:1 at an effectively unbounded size.
    pub fn deposit(currency: Currency, from_exchange: ExchangeId, to_exchange: ExchangeId) -> Self {
        let symbol = format!("{currency}:{from_exchange}->{to_exchange}");
        let market = Self {
            base: currency.clone(),
            quote: currency,
            symbol,
            exchange: from_exchange,
            to_exchange,
            maker_fee: Decimal::ZERO,
            taker_fee: Decimal::ZERO,
            is_deposit: true,
            rules: Vec::new(),
            bid: Mutex::new(Ladder::new(BookSide::Bid)),
            ask: Mutex::new(Ladder::new(BookSide::Ask)),
            paths: Mutex::new(Vec::new()),
        };
        market.update_bid(Decimal::ONE, Decimal::MAX);
        market.update_ask(Decimal::ONE, Decimal::MAX);
        market
    }

    /// Test helper: a bare deposit-shaped market with no graph wiring.
    #[doc(hidden)]
    pub fn deposit_stub(currency: &str, from_exchange: &str, to_exchange: &str) -> Self {
        Self::deposit(currency.into(), from_exchange.into(), to_exchange.into())
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.exchange, self.symbol)
    }

    pub fn update_bid(&self, price: Decimal, size: Decimal) {
        self.bid.lock().update(price, size);
    }

    pub fn update_ask(&self, price: Decimal, size: Decimal) {
        self.ask.lock().update(price, size);
    }

    pub fn reset_prices(&self) {
        self.bid.lock().reset();
        self.ask.lock().reset();
    }

    pub fn best_bid(&self) -> Option<Level> {
        self.bid.lock().top()
    }

    pub fn best_ask(&self) -> Option<Level> {
        self.ask.lock().top()
    }

    pub fn top_for_side(&self, side: Side) -> Option<Level> {
        match side {
            // A BUY lifts the ask; a SELL hits the bid.
            Side::Buy => self.best_ask(),
            Side::Sell => self.best_bid(),
        }
    }

    /// Apply every rule to `order` until a full pass makes no further
    /// change, bounded to prevent non-convergent rule interactions from
    /// looping forever.
    pub fn make_valid(&self, order: &mut Order) -> Result<(), crate::errors::ImpossibleOrder> {
        const MAX_ITERATIONS: u32 = 100;

        for _ in 0..MAX_ITERATIONS {
            let mut changed = false;
            for rule in &self.rules {
                if rule.make_valid(order)? {
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }

        Err(crate::errors::ImpossibleOrder::NoFixedPoint {
            iterations: MAX_ITERATIONS,
        })
    }

    pub fn register_path(&self, path: &Arc<Path>) {
        self.paths.lock().push(Arc::downgrade(path));
    }

    /// Paths traversing this market, pruning any that have been dropped.
    pub fn paths(&self) -> Vec<Arc<Path>> {
        let mut guard = self.paths.lock();
        guard.retain(|w| w.strong_count() > 0);
        guard.iter().filter_map(|w| w.upgrade()).collect()
    }

    /// Evaluate every path through this market at `initial_amount`,
    /// returning every candidate whose profit meets `min_profit`.
    pub fn scan_paths(
        &self,
        initial_amount: Decimal,
        min_profit: Decimal,
    ) -> Vec<(Decimal, Vec<Order>)> {
        let mut candidates = Vec::new();
        for path in self.paths() {
            if let Some(orders) = path.generate_orders(initial_amount) {
                if let (Some(first), Some(last)) = (orders.first(), orders.last()) {
                    let source_amount = first.source_amount();
                    let final_amount = last.target_amount(true);
                    if source_amount.is_zero() {
                        continue;
                    }
                    let profit = final_amount / source_amount - Decimal::ONE;
                    if profit >= min_profit {
                        candidates.push((profit, orders));
                    }
                }
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deposit_market_is_seeded_one_to_one() {
        let market = Market::deposit_stub("BTC", "alpha", "beta");
        assert_eq!(market.best_bid().unwrap().price, Decimal::ONE);
        assert_eq!(market.best_ask().unwrap().price, Decimal::ONE);
        assert!(market.is_deposit);
    }

    #[test]
    fn test_update_and_reset_prices() {
        let market = Market::new(
            "BTC".into(),
            "USD".into(),
            "BTC-USD".into(),
            "alpha".into(),
            Decimal::ZERO,
            dec!(0.001),
            vec![],
        );
        market.update_bid(dec!(100), dec!(1));
        market.update_ask(dec!(101), dec!(1));
        assert_eq!(market.best_bid().unwrap().price, dec!(100));
        assert_eq!(market.best_ask().unwrap().price, dec!(101));

        market.reset_prices();
        assert!(market.best_bid().is_none());
        assert!(market.best_ask().is_none());
    }

    #[test]
    fn test_make_valid_converges_with_interacting_rules() {
        use crate::rules::{SizeRule, ValueRule};

        let market = Market::new(
            "BTC".into(),
            "USD".into(),
            "BTC-USD".into(),
            "alpha".into(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![
                Box::new(ValueRule::new(dec!(10))),
                Box::new(SizeRule::new(Decimal::ZERO, Decimal::ZERO, dec!(0.01))),
            ],
        );

        let mut order = Order::new(Arc::new(Market::deposit_stub("BTC", "a", "b")), Side::Buy, dec!(100), dec!(0.001));
        // Swap in the market with rules for this test.
        order.quantity = dec!(0.001);
        let result = market.make_valid(&mut order);
        assert!(result.is_ok());
        assert!(order.quantity * dec!(100) >= dec!(10));
    }
}
