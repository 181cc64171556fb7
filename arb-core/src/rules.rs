//! Pluggable order-sizing rules.
//!
//! A [`Rule`] inspects an in-progress [`crate::order::Order`] and either
//! leaves it unchanged, coerces its quantity into compliance, or reports
//! that no compliant quantity exists. `Market::make_valid` applies every
//! rule in a fixed-point loop since rules can interact: `ValueRule` may
//! raise a quantity past a `SizeRule` step boundary, requiring another
//! rounding pass.

use crate::errors::ImpossibleOrder;
use crate::order::Order;
use rust_decimal::Decimal;

/// A coercing validator over an order's quantity.
///
/// Returns `Ok(true)` if the order was changed, `Ok(false)` if it already
/// complied, or `Err` if no compliant quantity exists.
pub trait Rule: Send + Sync {
    fn make_valid(&self, order: &mut Order) -> Result<bool, ImpossibleOrder>;
}

/// Bounds and step-size constraints on an order's quantity.
#[derive(Debug, Clone)]
pub struct SizeRule {
    pub min_qty: Decimal,
    pub max_qty: Decimal,
    pub step: Decimal,
}

impl SizeRule {
    pub fn new(min_qty: Decimal, max_qty: Decimal, step: Decimal) -> Self {
        Self {
            min_qty,
            max_qty,
            step,
        }
    }
}

impl Rule for SizeRule {
    fn make_valid(&self, order: &mut Order) -> Result<bool, ImpossibleOrder> {
        if self.min_qty > Decimal::ZERO && self.min_qty > order.maximum_size {
            return Err(ImpossibleOrder::SizeBounds {
                min_qty: self.min_qty.to_string(),
                max_qty: order.maximum_size.to_string(),
                requested: order.quantity.to_string(),
            });
        }
        if self.max_qty > Decimal::ZERO
            && (self.max_qty < order.minimum_size || order.maximum_size < order.minimum_size)
        {
            return Err(ImpossibleOrder::SizeBounds {
                min_qty: order.minimum_size.to_string(),
                max_qty: self.max_qty.to_string(),
                requested: order.quantity.to_string(),
            });
        }

        let mut changed = false;

        if self.min_qty > Decimal::ZERO && order.quantity < self.min_qty {
            order.quantity = self.min_qty;
            changed = true;
        }
        if self.max_qty > Decimal::ZERO && order.quantity > self.max_qty {
            order.quantity = self.max_qty;
            changed = true;
        }

        if self.step != Decimal::ZERO {
            let remainder = order.quantity % self.step;
            if remainder != Decimal::ZERO {
                let rounded_down = order.quantity - remainder;

                if rounded_down >= order.minimum_size && rounded_down > Decimal::ZERO {
                    order.quantity = rounded_down;
                    changed = true;
                } else {
                    let rounded_up = rounded_down + self.step;
                    if rounded_up <= order.maximum_size
                        && (self.max_qty <= Decimal::ZERO || rounded_up <= self.max_qty)
                    {
                        order.quantity = rounded_up;
                        changed = true;
                    } else {
                        return Err(ImpossibleOrder::StepRounding {
                            step: self.step.to_string(),
                            requested: order.quantity.to_string(),
                        });
                    }
                }
            }
        }

        Ok(changed)
    }
}

/// Minimum notional value (price * quantity) a market will accept.
#[derive(Debug, Clone)]
pub struct ValueRule {
    pub min_notional: Decimal,
}

impl ValueRule {
    pub fn new(min_notional: Decimal) -> Self {
        Self { min_notional }
    }
}

impl Rule for ValueRule {
    fn make_valid(&self, order: &mut Order) -> Result<bool, ImpossibleOrder> {
        if order.price.is_zero() {
            return Err(ImpossibleOrder::ZeroPrice);
        }

        let notional = order.price * order.quantity;
        if notional >= self.min_notional {
            return Ok(false);
        }

        let required_qty = (self.min_notional / order.price).ceil();
        if required_qty > order.maximum_size {
            return Err(ImpossibleOrder::NotionalExceedsMax {
                min_notional: self.min_notional.to_string(),
                max_qty: order.maximum_size.to_string(),
            });
        }

        order.quantity = required_qty;
        Ok(false)
    }
}
