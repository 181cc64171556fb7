//! Thin binary wiring adapters, scanner, and executor into one running
//! engine, with an interactive stdin command loop.
//!
//! Real per-exchange market discovery is outside this repo's scope (see
//! the simulated-adapter note in the crate docs), so this binary builds
//! a small demo topology from the configured exchanges/currencies: one
//! market per adjacent currency pair on each exchange, plus deposit
//! edges between every exchange pair for every enabled currency.

use anyhow::{Context, Result};
use arb_adapters::{SimulatedAdapter, SimulatedAdapterConfig};
use arb_bins::common::{init_logging, CommonArgs};
use arb_core::adapter::{AdapterEvent, ExchangeAdapter};
use arb_core::config::Config;
use arb_core::executor::Executor;
use arb_core::graph::MarketGraph;
use arb_core::journal::AsyncJournal;
use arb_core::market::Market;
use arb_core::monitoring::{MetricsRegistry, MetricsServer, MetricsServerConfig};
use arb_core::path::enumerate_cycles;
use arb_core::resilience::install_panic_handler;
use arb_core::scanner::{AdmissionControl, Scanner, ScannerConfig};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

fn build_demo_graph(graph: &Arc<MarketGraph>, config: &Config) {
    for exchange in &config.exchanges {
        for pair in config.enabled_currencies.windows(2) {
            let (base, quote) = (pair[0].clone(), pair[1].clone());
            let market = Arc::new(Market::new(
                base.as_str().into(),
                quote.as_str().into(),
                format!("{base}-{quote}"),
                exchange.as_str().into(),
                Decimal::ZERO,
                dec!(0.001),
                vec![],
            ));
            market.update_bid(dec!(1), dec!(1000));
            market.update_ask(dec!(1.001), dec!(1000));
            graph.register_market(market);
        }
    }

    for currency in &config.enabled_currencies {
        for source in &config.exchanges {
            for target in &config.exchanges {
                if source != target {
                    graph.add_deposit_edge(currency.as_str().into(), source.as_str().into(), target.as_str().into());
                }
            }
        }
    }
}

fn print_balances(graph: &MarketGraph) {
    for vertex in graph.vertices() {
        println!("{}@{}: {}", vertex.currency, vertex.exchange, vertex.balance());
    }
}

fn print_markets(graph: &MarketGraph) {
    for market in graph.markets() {
        let bid = market.best_bid().map(|l| l.price.to_string()).unwrap_or_else(|| "-".into());
        let ask = market.best_ask().map(|l| l.price.to_string()).unwrap_or_else(|| "-".into());
        println!("{} bid={bid} ask={ask} deposit={}", market.key(), market.is_deposit);
    }
}

fn run_command_loop(
    graph: Arc<MarketGraph>,
    executor: Arc<Executor>,
    stop: Arc<AtomicBool>,
) {
    let stdin = io::stdin();
    print!("> ");
    let _ = io::stdout().flush();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            "exit" => {
                info!("shutdown requested via CLI");
                stop.store(true, Ordering::SeqCst);
                break;
            }
            "show" => print_markets(&graph),
            "balances" => print_balances(&graph),
            "activate" => {
                executor.set_trading_enabled(true);
                println!("trading enabled");
            }
            "deactivate" => {
                executor.set_trading_enabled(false);
                println!("trading disabled");
            }
            "order" => println!("trading_enabled={}", executor.trading_enabled()),
            "" => {}
            other => println!("unknown command: {other} (try exit/show/order/activate/balances)"),
        }
        print!("> ");
        let _ = io::stdout().flush();
    }
}

fn main() -> Result<()> {
    let args = CommonArgs::parse();
    let config = Config::load(&args.config).context("failed to load configuration")?;

    init_logging(&config.logging.level, config.logging.json, args.log_level.as_deref())?;
    install_panic_handler();

    info!("=== Arbitrage Orchestrator ===");
    info!(exchanges = ?config.exchanges, currencies = ?config.enabled_currencies, "starting");

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;

    let graph = Arc::new(MarketGraph::new());
    build_demo_graph(&graph, &config);

    for vertex in graph.vertices() {
        vertex.set_balance(dec!(1000));
    }

    for vertex in graph.vertices() {
        let paths = enumerate_cycles(vertex.clone(), config.max_depth);
        info!(vertex = %vertex.currency, exchange = %vertex.exchange, count = paths.len(), "enumerated cycles");
    }

    let journal_path = std::path::PathBuf::from(&config.journal.path);
    if let Some(parent) = journal_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let journal = Arc::new(AsyncJournal::new(journal_path)?);

    let admission = Arc::new(AdmissionControl::new(
        config.multiple_sequences,
        config.maximum_sequences,
        Duration::from_secs(config.time_between_sequences),
    ));

    let executor = Arc::new(Executor::new(
        graph.clone(),
        journal.clone(),
        admission.clone(),
        config.allow_sequential_sequences,
    ));

    let mut event_receivers = Vec::new();
    for exchange in &config.exchanges {
        let (adapter, rx) = SimulatedAdapter::new(exchange.clone(), graph.clone(), SimulatedAdapterConfig::default());
        let adapter: Arc<dyn ExchangeAdapter> = Arc::new(adapter);
        runtime.block_on(adapter.initialize())?;
        executor.register_adapter(exchange.as_str().into(), adapter);
        event_receivers.push((exchange.clone(), rx));
    }

    let metrics = Arc::new(MetricsRegistry::new().context("failed to create metrics registry")?);
    if config.metrics.enabled {
        let listen_addr = config.metrics.listen_addr.parse().context("invalid metrics.listen_addr")?;
        let server = MetricsServer::new(
            MetricsServerConfig {
                listen_addr,
                metrics_path: config.metrics.path.clone(),
            },
            metrics.clone(),
        );
        runtime.spawn(async move {
            if let Err(e) = server.serve().await {
                error!(error = %e, "metrics server stopped");
            }
        });
    }

    for (exchange, rx) in event_receivers {
        let executor = executor.clone();
        let handle = runtime.handle().clone();
        std::thread::spawn(move || {
            while let Ok(event) = rx.recv() {
                if let AdapterEvent::OrderUpdate(update) = event {
                    handle.block_on(executor.on_order_update(update.order_id, update.status));
                }
            }
            warn!(%exchange, "adapter event channel closed");
        });
    }

    let scanner_config = ScannerConfig {
        order_max_amount: config.order_max_amount,
        min_profit: config.min_profit,
    };
    let scanner = Arc::new(Scanner::new(scanner_config, admission));
    for market in graph.markets() {
        scanner.schedule_market_scan(market);
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("failed to install Ctrl-C handler")?;
    }

    {
        let scanner = scanner.clone();
        let executor = executor.clone();
        let handle = runtime.handle().clone();
        let metrics = metrics.clone();
        std::thread::spawn(move || {
            scanner.run(|profit, orders| {
                metrics.scanning().candidates_found_total.inc();
                info!(%profit, legs = orders.len(), "candidate sequence found");
                match handle.block_on(executor.dispatch_sequence(orders)) {
                    Ok(sequence_id) => {
                        metrics.sequences().admitted_total.inc();
                        info!(%sequence_id, "sequence admitted");
                    }
                    Err(e) => {
                        metrics.sequences().rejected_total.with_label_values(&["dispatch"]).inc();
                        warn!(error = %e, "sequence rejected at dispatch");
                    }
                }
            });
        });
    }

    if std::env::var("TRADING").as_deref() == Ok("1") {
        executor.set_trading_enabled(true);
        info!("TRADING=1: trading auto-enabled at startup");
    }

    run_command_loop(graph, executor, stop);

    info!("shutting down");
    Ok(())
}
