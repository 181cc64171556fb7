//! Sorted order-book price ladder.
//!
//! Unlike a fixed-depth snapshot array synced from a shared-memory feed,
//! markets here receive discrete price/size updates from an
//! [`crate::adapter::ExchangeAdapter`] at arbitrary prices, so the ladder
//! is backed by a `BTreeMap` rather than a fixed array. Top-of-book is an
//! O(1) lookup at either end of the map; inserts/removals are O(log n).

use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Which side of the book a ladder represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    /// Best entry is the highest price.
    Bid,
    /// Best entry is the lowest price.
    Ask,
}

/// A single price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub price: Decimal,
    pub size: Decimal,
}

/// A sorted set of price levels for one side of one market.
///
/// All mutation and reads go through `&mut self` / `&self`; the owning
/// [`crate::market::Market`] is responsible for serializing concurrent
/// access with a mutex per side, matching the locking granularity of a
/// conventional L2 book.
#[derive(Debug, Clone, Default)]
pub struct Ladder {
    side: Option<BookSide>,
    levels: BTreeMap<Decimal, Decimal>,
}

impl Ladder {
    pub fn new(side: BookSide) -> Self {
        Self {
            side: Some(side),
            levels: BTreeMap::new(),
        }
    }

    /// Apply an update at `price`. A `size` of zero removes the level;
    /// a non-zero size inserts or overwrites it.
    pub fn update(&mut self, price: Decimal, size: Decimal) {
        if size.is_zero() {
            self.levels.remove(&price);
        } else {
            self.levels.insert(price, size);
        }
    }

    /// Remove all levels.
    pub fn reset(&mut self) {
        self.levels.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Best level: highest price for a bid ladder, lowest for an ask ladder.
    pub fn top(&self) -> Option<Level> {
        match self.side {
            Some(BookSide::Bid) | None => self
                .levels
                .iter()
                .next_back()
                .map(|(&price, &size)| Level { price, size }),
            Some(BookSide::Ask) => self
                .levels
                .iter()
                .next()
                .map(|(&price, &size)| Level { price, size }),
        }
    }

    /// Size available at an exact price, if any.
    pub fn size_at(&self, price: Decimal) -> Option<Decimal> {
        self.levels.get(&price).copied()
    }

    /// Iterate levels in execution order (best first).
    pub fn iter_best_first(&self) -> Box<dyn Iterator<Item = Level> + '_> {
        match self.side {
            Some(BookSide::Bid) | None => Box::new(
                self.levels
                    .iter()
                    .rev()
                    .map(|(&price, &size)| Level { price, size }),
            ),
            Some(BookSide::Ask) => Box::new(
                self.levels
                    .iter()
                    .map(|(&price, &size)| Level { price, size }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bid_top_is_highest_price() {
        let mut ladder = Ladder::new(BookSide::Bid);
        ladder.update(dec!(100), dec!(1));
        ladder.update(dec!(101), dec!(2));
        ladder.update(dec!(99), dec!(3));

        let top = ladder.top().unwrap();
        assert_eq!(top.price, dec!(101));
        assert_eq!(top.size, dec!(2));
    }

    #[test]
    fn test_ask_top_is_lowest_price() {
        let mut ladder = Ladder::new(BookSide::Ask);
        ladder.update(dec!(100), dec!(1));
        ladder.update(dec!(101), dec!(2));
        ladder.update(dec!(99), dec!(3));

        let top = ladder.top().unwrap();
        assert_eq!(top.price, dec!(99));
        assert_eq!(top.size, dec!(3));
    }

    #[test]
    fn test_zero_size_removes_level() {
        let mut ladder = Ladder::new(BookSide::Bid);
        ladder.update(dec!(100), dec!(1));
        assert_eq!(ladder.len(), 1);

        ladder.update(dec!(100), Decimal::ZERO);
        assert!(ladder.is_empty());
        assert!(ladder.top().is_none());
    }

    #[test]
    fn test_nonzero_reupdate_replaces_size() {
        let mut ladder = Ladder::new(BookSide::Ask);
        ladder.update(dec!(50), dec!(5));
        ladder.update(dec!(50), dec!(2));

        assert_eq!(ladder.len(), 1);
        assert_eq!(ladder.size_at(dec!(50)), Some(dec!(2)));
    }

    #[test]
    fn test_reset_clears_all_levels() {
        let mut ladder = Ladder::new(BookSide::Bid);
        ladder.update(dec!(1), dec!(1));
        ladder.update(dec!(2), dec!(1));
        ladder.reset();
        assert!(ladder.is_empty());
    }

    #[test]
    fn test_empty_ladder_has_no_top() {
        let ladder = Ladder::new(BookSide::Bid);
        assert!(ladder.top().is_none());
    }
}
