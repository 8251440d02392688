//! Standalone event log summary tool
//!
//! Parses an event log and prints how many events each chain and executor
//! produced, then analyzes the log against a chain catalog if one is given.
//!
//! Usage:
//!   summarize_log <trace.log> [--chains <chains.json>]
//!
//! Example:
//!   summarize_log ros_trace.log --chains chains.json

use chain_analysis::{catalog, format_path, log_parser, AnalysisConfig, Analyzer};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <trace.log> [--chains <chains.json>]", args[0]);
        std::process::exit(1);
    }

    let log_path = PathBuf::from(&args[1]);
    let mut chains_path: Option<PathBuf> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--chains" if i + 1 < args.len() => {
                chains_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    let config = AnalysisConfig::new();
    let events = match log_parser::parse_file(&log_path, &config) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut per_chain: BTreeMap<u32, usize> = BTreeMap::new();
    let mut per_executor: BTreeMap<u32, usize> = BTreeMap::new();
    for event in &events {
        *per_chain.entry(event.chain).or_default() += 1;
        *per_executor.entry(event.executor).or_default() += 1;
    }

    println!("=== LOG SUMMARY ===");
    println!("Total events: {}", events.len());
    println!("\nEvents per chain:");
    for (chain, count) in &per_chain {
        println!("  chain {:>4}: {}", chain, count);
    }
    println!("\nEvents per executor:");
    for (executor, count) in &per_executor {
        println!("  executor {:>4}: {}", executor, count);
    }

    let Some(chains_path) = chains_path else {
        return;
    };

    let chains = match catalog::load(&chains_path) {
        Ok(chains) => chains,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n=== ANALYSIS ===");
    match Analyzer::new(config).analyze(&chains, &events) {
        Ok(results) => {
            for chain in &chains {
                let line = match results.iter().find(|r| r.id == chain.id) {
                    Some(r) => format!("{} / {} / {} us", r.bcrt_us, r.acrt_us, r.wcrt_us),
                    None => "no completed cycles".to_string(),
                };
                println!("  chain {:>4} {:<16} {}", chain.id, format_path(&chain.path), line);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
