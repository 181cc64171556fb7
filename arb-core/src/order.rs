//! A typed directed trade across one [`Market`], or a synthetic transfer
//! across a deposit edge.

use crate::errors::ImpossibleOrder;
use crate::graph::Currency;
use crate::ids::{OrderId, SequenceId};
use crate::market::Market;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A single leg of a candidate cycle: a buy or sell of `quantity` at
/// `price` on `market`, bounded by `[minimum_size, maximum_size]`.
///
/// Orders are constructed fresh on every scan pass and never mutated
/// once handed to the executor. `id` is generated lazily so paths
/// discarded before dispatch never pay for id generation.
#[derive(Clone)]
pub struct Order {
    id: OrderId,
    pub market: Arc<Market>,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub minimum_size: Decimal,
    pub maximum_size: Decimal,
    pub sequence_id: Option<SequenceId>,
}

impl Order {
    pub fn new(market: Arc<Market>, side: Side, price: Decimal, quantity: Decimal) -> Self {
        Self {
            id: OrderId::new(),
            market,
            side,
            price,
            quantity,
            minimum_size: Decimal::ZERO,
            maximum_size: quantity,
            sequence_id: None,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id.get();
        self.id.clone()
    }

    /// The currency being spent.
    pub fn source_currency(&self) -> Currency {
        match self.side {
            Side::Buy => self.market.quote.clone(),
            Side::Sell => self.market.base.clone(),
        }
    }

    /// The currency being received.
    pub fn target_currency(&self) -> Currency {
        match self.side {
            Side::Buy => self.market.base.clone(),
            Side::Sell => self.market.quote.clone(),
        }
    }

    pub fn source_amount(&self) -> Decimal {
        match self.side {
            Side::Buy => self.quantity * self.price,
            Side::Sell => self.quantity,
        }
    }

    /// Amount received in the target currency. `include_fees` applies
    /// the market's taker fee (orders here are always takers: they cross
    /// the spread against the resting top of book).
    pub fn target_amount(&self, include_fees: bool) -> Decimal {
        let gross = match self.side {
            Side::Buy => self.quantity,
            Side::Sell => self.quantity * self.price,
        };
        if include_fees {
            gross * (Decimal::ONE - self.market.taker_fee)
        } else {
            gross
        }
    }

    /// Run this order's market rules to a fixed point.
    pub fn make_valid(&mut self) -> Result<(), ImpossibleOrder> {
        let market = self.market.clone();
        market.make_valid(self)
    }

    /// Resize so the order's pre-fee (or post-fee) target amount equals
    /// `amount`, then re-run `make_valid`. Used both for ordinary legs
    /// and for back-propagated deposit legs (`set_size` is the deposit
    /// specialization, since a deposit's "price" is always 1).
    pub fn set_target_amount(&mut self, amount: Decimal, include_fees: bool) -> Result<(), ImpossibleOrder> {
        let multiplier = if include_fees {
            Decimal::ONE - self.market.taker_fee
        } else {
            Decimal::ONE
        };

        let new_size = match self.side {
            Side::Buy => {
                if multiplier.is_zero() {
                    return Err(ImpossibleOrder::ZeroPrice);
                }
                amount / multiplier
            }
            Side::Sell => {
                if self.price.is_zero() {
                    return Err(ImpossibleOrder::ZeroPrice);
                }
                amount / (self.price * multiplier)
            }
        };

        if new_size > self.maximum_size {
            return Err(ImpossibleOrder::SizeBounds {
                min_qty: self.minimum_size.to_string(),
                max_qty: self.maximum_size.to_string(),
                requested: new_size.to_string(),
            });
        }

        self.quantity = new_size;
        self.minimum_size = new_size;
        self.make_valid()
    }

    /// Resize a deposit leg to transfer exactly `amount`. Deposits trade
    /// 1:1 with no fees, so this is `set_target_amount` specialized to
    /// that fixed price.
    pub fn set_size(&mut self, amount: Decimal) -> Result<(), ImpossibleOrder> {
        debug_assert!(self.market.is_deposit, "set_size is only valid on deposit legs");
        self.set_target_amount(amount, false)
    }

    /// Whether the currently-held balance in the source currency covers
    /// this order's source amount.
    pub fn can_be_executed(&self, vertex: &crate::graph::ExchangeCurrency) -> bool {
        vertex.balance() >= self.source_amount()
    }
}

impl fmt::Debug for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Order")
            .field("market", &self.market.key())
            .field("side", &self.side)
            .field("price", &self.price)
            .field("quantity", &self.quantity)
            .finish()
    }
}
