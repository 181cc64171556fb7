//! Durable, non-blocking record of every transfer and completed sequence.
//!
//! Writes never block the scanner/executor hot path: events are pushed to
//! a bounded channel and persisted by a dedicated writer thread, exactly
//! as a conventional async journal decouples the trading loop from disk
//! I/O.

use crate::ids::SequenceId;
use crate::order::Order;
use crossbeam::channel::{bounded, Sender};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum JournalEvent {
    Transfer {
        amount: Decimal,
        currency: String,
        source_exchange: String,
        target_exchange: String,
        unix_seconds: u64,
    },
    Sequence {
        sequence_id: String,
        initial_amount: Decimal,
        final_amount: Decimal,
        profit: Decimal,
        unix_seconds: u64,
    },
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Interface the rest of the engine records through; `AsyncJournal` is the
/// only production implementation, but tests substitute a `Vec`-backed one.
pub trait Journal: Send + Sync {
    fn record_transfer(&self, deposit_order: &Order);
    fn record_sequence(&self, sequence_id: SequenceId, legs: &[Order]);
}

/// Channel-backed journal: `record_*` enqueues and returns immediately,
/// a single writer thread appends newline-delimited JSON to `path`.
pub struct AsyncJournal {
    sender: Option<Sender<JournalEvent>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl AsyncJournal {
    pub fn new(path: PathBuf) -> std::io::Result<Self> {
        let (sender, receiver) = bounded(4096);

        let handle = thread::spawn(move || {
            let mut file = match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(f) => f,
                Err(e) => {
                    error!(?path, error = %e, "failed to open journal file");
                    return;
                }
            };

            for event in receiver {
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if let Err(e) = writeln!(file, "{json}") {
                            error!(error = %e, "failed to write journal entry");
                        }
                    }
                    Err(e) => error!(error = %e, "failed to serialize journal entry"),
                }
            }

            let _ = file.flush();
        });

        Ok(Self {
            sender: Some(sender),
            thread_handle: Some(handle),
        })
    }

    fn send(&self, event: JournalEvent) {
        if let Some(sender) = &self.sender {
            if let Err(e) = sender.try_send(event) {
                error!(error = %e, "journal buffer full or disconnected, dropping event");
            }
        }
    }
}

impl Journal for AsyncJournal {
    fn record_transfer(&self, deposit_order: &Order) {
        self.send(JournalEvent::Transfer {
            amount: deposit_order.source_amount(),
            currency: deposit_order.source_currency().to_string(),
            source_exchange: deposit_order.market.exchange.to_string(),
            target_exchange: deposit_order.market.to_exchange.to_string(),
            unix_seconds: now_unix_seconds(),
        });
    }

    fn record_sequence(&self, sequence_id: SequenceId, legs: &[Order]) {
        let (Some(first), Some(last)) = (legs.first(), legs.last()) else {
            return;
        };
        let initial_amount = first.source_amount();
        let final_amount = last.target_amount(true);
        let profit = if initial_amount.is_zero() {
            Decimal::ZERO
        } else {
            final_amount / initial_amount - Decimal::ONE
        };

        self.send(JournalEvent::Sequence {
            sequence_id: sequence_id.to_string(),
            initial_amount,
            final_amount,
            profit,
            unix_seconds: now_unix_seconds(),
        });
    }
}

impl Drop for AsyncJournal {
    fn drop(&mut self) {
        let _ = self.sender.take();
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Market;
    use crate::order::Side;
    use rust_decimal_macros::dec;
    use std::fs::File;
    use std::io::{BufRead, BufReader};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    #[test]
    fn test_record_transfer_writes_one_line() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        {
            let journal = AsyncJournal::new(path.clone()).unwrap();
            let market = Arc::new(Market::deposit_stub("BTC", "alpha", "beta"));
            let order = Order::new(market, Side::Sell, Decimal::ONE, dec!(2));
            journal.record_transfer(&order);
        }

        let lines: Vec<String> = BufReader::new(File::open(&path).unwrap())
            .lines()
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(lines.len(), 1);
        let event: JournalEvent = serde_json::from_str(&lines[0]).unwrap();
        match event {
            JournalEvent::Transfer {
                amount,
                source_exchange,
                target_exchange,
                ..
            } => {
                assert_eq!(amount, dec!(2));
                assert_eq!(source_exchange, "alpha");
                assert_eq!(target_exchange, "beta");
            }
            _ => panic!("wrong event type"),
        }
    }

    #[test]
    fn test_record_sequence_computes_profit() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        {
            let journal = AsyncJournal::new(path.clone()).unwrap();
            let market = Arc::new(Market::new(
                "BTC".into(),
                "USD".into(),
                "BTCUSD".into(),
                "alpha".into(),
                Decimal::ZERO,
                Decimal::ZERO,
                vec![],
            ));
            let first = Order::new(market.clone(), Side::Buy, dec!(100), dec!(1));
            let last = Order::new(market, Side::Sell, dec!(110), dec!(1));
            journal.record_sequence(SequenceId::generate(), &[first, last]);
        }

        let lines: Vec<String> = BufReader::new(File::open(&path).unwrap())
            .lines()
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(lines.len(), 1);
        let event: JournalEvent = serde_json::from_str(&lines[0]).unwrap();
        match event {
            JournalEvent::Sequence { profit, .. } => assert_eq!(profit, dec!(0.1)),
            _ => panic!("wrong event type"),
        }
    }
}
