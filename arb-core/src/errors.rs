//! Domain-specific error types for the arbitrage pipeline
//!
//! These error types provide precise information about failures at each
//! stage of the pipeline, from order sizing to sequence dispatch.

use std::fmt;

/// Raised when no rule-compliant sizing exists for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpossibleOrder {
    /// A `SizeRule` bound made the order unsatisfiable.
    SizeBounds {
        min_qty: String,
        max_qty: String,
        requested: String,
    },
    /// Rounding to the rule's step left no valid quantity in range.
    StepRounding { step: String, requested: String },
    /// `ValueRule` coercion would exceed the order's maximum size.
    NotionalExceedsMax { min_notional: String, max_qty: String },
    /// `make_valid` did not reach a fixed point within the iteration bound.
    NoFixedPoint { iterations: u32 },
    /// The order's price is zero, so no quantity can satisfy a target amount.
    ZeroPrice,
}

impl fmt::Display for ImpossibleOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpossibleOrder::SizeBounds {
                min_qty,
                max_qty,
                requested,
            } => write!(
                f,
                "requested quantity {requested} cannot satisfy size bounds [{min_qty}, {max_qty}]"
            ),
            ImpossibleOrder::StepRounding { step, requested } => write!(
                f,
                "quantity {requested} cannot be rounded to step {step} within order limits"
            ),
            ImpossibleOrder::NotionalExceedsMax {
                min_notional,
                max_qty,
            } => write!(
                f,
                "raising size to satisfy minimum notional {min_notional} would exceed max quantity {max_qty}"
            ),
            ImpossibleOrder::NoFixedPoint { iterations } => {
                write!(f, "order sizing did not converge after {iterations} passes")
            }
            ImpossibleOrder::ZeroPrice => write!(f, "order price is zero"),
        }
    }
}

impl std::error::Error for ImpossibleOrder {}

/// Top-level arbitrage engine error.
#[derive(Debug)]
pub enum ArbError {
    /// A candidate path could not be sized into a valid order sequence.
    Impossible(ImpossibleOrder),
    /// The first order of a dispatch chain was not fundable at dispatch time.
    InsufficientBalance { currency: String, exchange: String },
    /// Configuration failed validation at startup.
    Config(String),
    /// An adapter-level transport failure (never fatal to the caller).
    AdapterTransport(String),
    /// The exchange rejected a submitted order.
    AdapterReject { order_id: crate::ids::OrderId, reason: String },
}

impl fmt::Display for ArbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbError::Impossible(e) => write!(f, "impossible order: {e}"),
            ArbError::InsufficientBalance { currency, exchange } => write!(
                f,
                "insufficient {currency} balance on {exchange} to fund dispatch"
            ),
            ArbError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            ArbError::AdapterTransport(msg) => write!(f, "adapter transport error: {msg}"),
            ArbError::AdapterReject { order_id, reason } => {
                write!(f, "order {order_id} rejected: {reason}")
            }
        }
    }
}

impl std::error::Error for ArbError {}

impl From<ImpossibleOrder> for ArbError {
    fn from(e: ImpossibleOrder) -> Self {
        ArbError::Impossible(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impossible_order_display() {
        let err = ImpossibleOrder::SizeBounds {
            min_qty: "1".into(),
            max_qty: "0.5".into(),
            requested: "0.3".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("size bounds"));
    }

    #[test]
    fn test_arb_error_from_impossible() {
        let impossible = ImpossibleOrder::ZeroPrice;
        let arb_err: ArbError = impossible.into();
        match arb_err {
            ArbError::Impossible(_) => {}
            _ => panic!("expected Impossible variant"),
        }
    }
}
