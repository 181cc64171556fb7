//! A small inspector binary: builds the same demo topology as the
//! orchestrator, enumerates paths, and prints current top-of-book per
//! market plus every path that would be profitable at a given amount.
//! Does not submit orders or participate in trading.

use anyhow::{Context, Result};
use arb_core::config::Config;
use arb_core::graph::MarketGraph;
use arb_core::market::Market;
use arb_core::path::enumerate_cycles;
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect the arbitrage market graph without trading")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Starting amount used when evaluating candidate cycles.
    #[arg(short, long, default_value = "1000")]
    amount: Decimal,
}

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

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config).context("failed to load configuration")?;

    arb_core::utils::init_logger(&config.logging.level, config.logging.json);

    let graph = Arc::new(MarketGraph::new());
    build_demo_graph(&graph, &config);

    for vertex in graph.vertices() {
        vertex.set_balance(args.amount);
    }

    println!("== markets ==");
    for market in graph.markets() {
        let bid = market.best_bid().map(|l| l.price.to_string()).unwrap_or_else(|| "-".into());
        let ask = market.best_ask().map(|l| l.price.to_string()).unwrap_or_else(|| "-".into());
        println!("{} bid={bid} ask={ask} deposit={}", market.key(), market.is_deposit);
    }

    println!("== paths ==");
    let mut total_paths = 0usize;
    let mut profitable = 0usize;
    for vertex in graph.vertices() {
        let paths = enumerate_cycles(vertex.clone(), config.max_depth);
        total_paths += paths.len();
        for path in &paths {
            if let Some(orders) = path.generate_orders(args.amount) {
                if let (Some(first), Some(last)) = (orders.first(), orders.last()) {
                    let initial = first.source_amount();
                    let final_amount = last.target_amount(true);
                    if initial.is_zero() {
                        continue;
                    }
                    let profit = final_amount / initial - Decimal::ONE;
                    if profit > Decimal::ZERO {
                        profitable += 1;
                        let legs: Vec<String> = path
                            .vertices()
                            .iter()
                            .map(|v| format!("{}@{}", v.currency, v.exchange))
                            .collect();
                        println!("profit={profit} legs={} path={}", orders.len(), legs.join(" -> "));
                    }
                }
            }
        }
    }

    println!("enumerated {total_paths} cycles, {profitable} currently profitable at amount={}", args.amount);

    Ok(())
}
