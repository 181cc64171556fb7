//! Consumes market-changed notifications, applies admission control, and
//! hands the most profitable candidate sequence on each market to the
//! executor.

use crate::market::Market;
use crate::order::Order;
use dashmap::DashSet;
use crossbeam::channel::{unbounded, Receiver, Sender};
use rust_decimal::Decimal;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct AdmissionState {
    current_sequences: u32,
    last_sequence_started: Option<Instant>,
}

/// Gates how many sequences may be in flight at once, shared between the
/// scanner (which checks it before dispatch) and the executor (which
/// updates it as sequences start and complete).
pub struct AdmissionControl {
    state: Mutex<AdmissionState>,
    allow_multiple: bool,
    maximum_sequences: u32,
    min_interval: Duration,
}

impl AdmissionControl {
    pub fn new(allow_multiple: bool, maximum_sequences: u32, min_interval: Duration) -> Self {
        Self {
            state: Mutex::new(AdmissionState {
                current_sequences: 0,
                last_sequence_started: None,
            }),
            allow_multiple,
            maximum_sequences,
            min_interval,
        }
    }

    pub fn try_admit(&self, now: Instant) -> bool {
        let state = self.state.lock();
        if !self.allow_multiple {
            return state.current_sequences == 0;
        }

        let interval_ok = state
            .last_sequence_started
            .map_or(true, |t| now.duration_since(t) >= self.min_interval);
        let count_ok = self.maximum_sequences == 0 || state.current_sequences < self.maximum_sequences;
        interval_ok && count_ok
    }

    pub fn mark_started(&self, now: Instant) {
        let mut state = self.state.lock();
        state.current_sequences += 1;
        state.last_sequence_started = Some(now);
    }

    pub fn mark_completed(&self) {
        let mut state = self.state.lock();
        state.current_sequences = state.current_sequences.saturating_sub(1);
    }

    pub fn current_sequences(&self) -> u32 {
        self.state.lock().current_sequences
    }
}

pub struct ScannerConfig {
    pub order_max_amount: Decimal,
    pub min_profit: Decimal,
}

/// Deduplicated, market-keyed scan queue plus the poll/dispatch loop.
pub struct Scanner {
    config: ScannerConfig,
    admission: Arc<AdmissionControl>,
    pending: DashSet<String>,
    queue_tx: Sender<Arc<Market>>,
    queue_rx: Receiver<Arc<Market>>,
}

impl Scanner {
    pub fn new(config: ScannerConfig, admission: Arc<AdmissionControl>) -> Self {
        let (queue_tx, queue_rx) = unbounded();
        Self {
            config,
            admission,
            pending: DashSet::new(),
            queue_tx,
            queue_rx,
        }
    }

    /// Enqueue `market` for rescanning unless a request for it is already
    /// pending. Called by adapters whenever a ladder changes.
    pub fn schedule_market_scan(&self, market: Arc<Market>) {
        let key = market.key();
        if self.pending.insert(key) {
            if self.queue_tx.send(market).is_err() {
                debug!("scan queue receiver dropped, discarding scan request");
            }
        }
    }

    /// Pop and evaluate exactly one pending market. Returns the
    /// highest-profit candidate found, if admission allows scanning and
    /// any profitable path exists.
    pub fn poll_once(&self) -> Option<(Decimal, Vec<Order>)> {
        let market = self.queue_rx.try_recv().ok()?;
        self.pending.remove(&market.key());

        if !self.admission.try_admit(Instant::now()) {
            return None;
        }

        market
            .scan_paths(self.config.order_max_amount, self.config.min_profit)
            .into_iter()
            .max_by_key(|(profit, _)| *profit)
    }

    /// Blocking run loop: drains the queue until the sender side (and
    /// thus every `schedule_market_scan` caller) is dropped.
    pub fn run(&self, mut on_candidate: impl FnMut(Decimal, Vec<Order>)) {
        while let Ok(market) = self.queue_rx.recv() {
            self.pending.remove(&market.key());

            if !self.admission.try_admit(Instant::now()) {
                continue;
            }

            if let Some((profit, orders)) = market
                .scan_paths(self.config.order_max_amount, self.config.min_profit)
                .into_iter()
                .max_by_key(|(profit, _)| *profit)
            {
                on_candidate(profit, orders);
            }
        }
    }

    pub fn admission(&self) -> &Arc<AdmissionControl> {
        &self.admission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_admission_single_sequence_only() {
        let control = AdmissionControl::new(false, 0, Duration::ZERO);
        assert!(control.try_admit(Instant::now()));
        control.mark_started(Instant::now());
        assert!(!control.try_admit(Instant::now()));
        control.mark_completed();
        assert!(control.try_admit(Instant::now()));
    }

    #[test]
    fn test_admission_multiple_respects_max_and_interval() {
        let control = AdmissionControl::new(true, 2, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(control.try_admit(t0));
        control.mark_started(t0);
        assert!(!control.try_admit(t0), "interval not elapsed");

        let t1 = t0 + Duration::from_secs(61);
        assert!(control.try_admit(t1));
        control.mark_started(t1);
        assert_eq!(control.current_sequences(), 2);

        let t2 = t1 + Duration::from_secs(61);
        assert!(!control.try_admit(t2), "maximum_sequences reached");
    }

    #[test]
    fn test_schedule_market_scan_deduplicates() {
        let config = ScannerConfig {
            order_max_amount: dec!(1000),
            min_profit: dec!(0.01),
        };
        let admission = Arc::new(AdmissionControl::new(false, 0, Duration::ZERO));
        let scanner = Scanner::new(config, admission);

        let market = Arc::new(Market::new(
            "BTC".into(),
            "USD".into(),
            "BTCUSD".into(),
            "alpha".into(),
            Decimal::ZERO,
            Decimal::ZERO,
            vec![],
        ));

        scanner.schedule_market_scan(market.clone());
        scanner.schedule_market_scan(market.clone());
        assert_eq!(scanner.pending.len(), 1);
    }

    #[test]
    fn test_poll_once_returns_none_when_queue_empty() {
        let config = ScannerConfig {
            order_max_amount: dec!(1000),
            min_profit: dec!(0.01),
        };
        let admission = Arc::new(AdmissionControl::new(false, 0, Duration::ZERO));
        let scanner = Scanner::new(config, admission);
        assert!(scanner.poll_once().is_none());
    }
}
