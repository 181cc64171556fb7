//! Prometheus metrics for the arbitrage engine: scan throughput,
//! candidate discovery, sequence admission/completion, and per-adapter
//! submit outcomes.

use prometheus::{Counter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tracing::info;

/// Central registry for every metric family the engine exposes.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    scanning: Arc<ScanningMetrics>,
    sequences: Arc<SequenceMetrics>,
    adapters: Arc<AdapterMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let scanning = Arc::new(ScanningMetrics::new(&registry)?);
        let sequences = Arc::new(SequenceMetrics::new(&registry)?);
        let adapters = Arc::new(AdapterMetrics::new(&registry)?);

        info!("prometheus metrics registry initialized");

        Ok(Self {
            registry,
            scanning,
            sequences,
            adapters,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn scanning(&self) -> &ScanningMetrics {
        &self.scanning
    }

    pub fn sequences(&self) -> &SequenceMetrics {
        &self.sequences
    }

    pub fn adapters(&self) -> &AdapterMetrics {
        &self.adapters
    }
}

impl Default for MetricsRegistry {
    #[allow(clippy::panic)]
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::error!("fatal: failed to create metrics registry: {}", e);
            panic!("cannot create metrics registry")
        })
    }
}

/// Scan-loop throughput and candidate discovery.
pub struct ScanningMetrics {
    pub scans_total: Counter,
    pub candidates_found_total: Counter,
    pub pending_scan_queue_depth: IntGauge,
}

impl ScanningMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let scans_total = Counter::new("arb_scanning_scans_total", "Total markets scanned")?;
        registry.register(Box::new(scans_total.clone()))?;

        let candidates_found_total = Counter::new(
            "arb_scanning_candidates_found_total",
            "Total profitable candidate sequences found",
        )?;
        registry.register(Box::new(candidates_found_total.clone()))?;

        let pending_scan_queue_depth = IntGauge::new(
            "arb_scanning_pending_queue_depth",
            "Number of markets currently queued for scanning",
        )?;
        registry.register(Box::new(pending_scan_queue_depth.clone()))?;

        Ok(Self {
            scans_total,
            candidates_found_total,
            pending_scan_queue_depth,
        })
    }
}

/// Sequence admission and completion.
pub struct SequenceMetrics {
    pub admitted_total: Counter,
    pub rejected_total: IntCounterVec,
    pub completed_total: Counter,
    pub in_flight: IntGauge,
}

impl SequenceMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let admitted_total =
            Counter::new("arb_sequences_admitted_total", "Total sequences admitted for dispatch")?;
        registry.register(Box::new(admitted_total.clone()))?;

        let rejected_total = IntCounterVec::new(
            Opts::new("arb_sequences_rejected_total", "Total sequences rejected before dispatch"),
            &["reason"],
        )?;
        registry.register(Box::new(rejected_total.clone()))?;

        let completed_total =
            Counter::new("arb_sequences_completed_total", "Total sequences that reached completion")?;
        registry.register(Box::new(completed_total.clone()))?;

        let in_flight = IntGauge::new("arb_sequences_in_flight", "Sequences currently in flight")?;
        registry.register(Box::new(in_flight.clone()))?;

        Ok(Self {
            admitted_total,
            rejected_total,
            completed_total,
            in_flight,
        })
    }
}

/// Per-adapter submit outcomes.
pub struct AdapterMetrics {
    pub submitted_total: IntCounterVec,
    pub accepted_total: IntCounterVec,
    pub rejected_total: IntCounterVec,
}

impl AdapterMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let submitted_total = IntCounterVec::new(
            Opts::new("arb_adapter_submitted_total", "Total orders submitted per exchange"),
            &["exchange"],
        )?;
        registry.register(Box::new(submitted_total.clone()))?;

        let accepted_total = IntCounterVec::new(
            Opts::new("arb_adapter_accepted_total", "Total orders accepted per exchange"),
            &["exchange"],
        )?;
        registry.register(Box::new(accepted_total.clone()))?;

        let rejected_total = IntCounterVec::new(
            Opts::new("arb_adapter_rejected_total", "Total orders rejected per exchange"),
            &["exchange"],
        )?;
        registry.register(Box::new(rejected_total.clone()))?;

        Ok(Self {
            submitted_total,
            accepted_total,
            rejected_total,
        })
    }
}
