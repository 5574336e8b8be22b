// logtrawl - main.rs
//
// CLI driver for the ingestion engine. Handles:
// 1. Argument parsing (file list, time window, initial filters)
// 2. Logging initialisation (debug mode support)
// 3. Driving the engine: start the load, poll progress to completion,
//    apply filters, print the visible rows (table or JSON) and any
//    requested series.

use chrono::NaiveDateTime;
use clap::Parser;
use logtrawl::app::engine::LogEngine;
use logtrawl::app::loader::LoadStart;
use logtrawl::core::filter::CriteriaUpdate;
use logtrawl::core::model::TimeWindow;
use logtrawl::core::series;
use logtrawl::util::constants::{LOAD_POLL_INTERVAL_MS, WINDOW_BOUND_FORMAT};
use logtrawl::util::logging;
use std::path::PathBuf;
use std::time::Duration;

/// logtrawl - ingestion and filtering engine for rotated plain-text logs.
///
/// Parses the given log files (in the order supplied; pass rotated files
/// oldest first if combined temporal order matters), applies the optional
/// time window and filters, and prints the visible entries.
#[derive(Parser, Debug)]
#[command(name = "logtrawl", version, about)]
struct Cli {
    /// Log files to load, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Lower time bound, "YYYY-MM-DD HH:MM:SS" (inclusive).
    #[arg(long)]
    since: Option<String>,

    /// Upper time bound, "YYYY-MM-DD HH:MM:SS" (inclusive).
    #[arg(long)]
    until: Option<String>,

    /// Keep only entries of this type (exact match on the trimmed field).
    #[arg(short = 't', long = "type")]
    log_type: Option<String>,

    /// Keep only entries whose message matches this regex.
    #[arg(short = 's', long)]
    search: Option<String>,

    /// Extract numeric time series with this capture-group pattern and
    /// print them instead of the entry table.
    #[arg(long)]
    series: Option<String>,

    /// Emit the visible entries as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long)]
    debug: bool,
}

fn parse_bound(flag: &str, value: &str) -> NaiveDateTime {
    match NaiveDateTime::parse_from_str(value, WINDOW_BOUND_FORMAT) {
        Ok(ts) => ts,
        Err(e) => {
            eprintln!("Error: invalid --{flag} '{value}' (expected YYYY-MM-DD HH:MM:SS): {e}");
            std::process::exit(2);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    logging::init(cli.debug);

    let window = TimeWindow {
        start: cli.since.as_deref().map(|v| parse_bound("since", v)),
        end: cli.until.as_deref().map(|v| parse_bound("until", v)),
    };

    let mut engine = LogEngine::new();

    if engine.start_load(cli.files, window) != LoadStart::Started {
        eprintln!("Error: engine rejected the load request");
        std::process::exit(1);
    }

    // Poll the loader to completion. The load runs on its own thread; this
    // loop is the CLI stand-in for a UI frame callback.
    let mut last_reported = 0u8;
    loop {
        if engine.pump() {
            break;
        }
        if engine.progress() != last_reported {
            last_reported = engine.progress();
            tracing::info!(percent = last_reported, "Loading");
        }
        std::thread::sleep(Duration::from_millis(LOAD_POLL_INTERVAL_MS));
    }

    tracing::info!(
        entries = engine.entries().len(),
        types = engine.types().len(),
        "Load finished"
    );

    // Apply initial filters from the CLI. An invalid search regex is a
    // startup error here, unlike the retain-previous-state behaviour an
    // interactive caller gets.
    let update = CriteriaUpdate {
        selected_type: cli.log_type.clone(),
        type_filter_enabled: Some(cli.log_type.is_some()),
        search_pattern: cli.search.clone(),
        search_enabled: Some(cli.search.is_some()),
    };
    if let Err(e) = engine.apply_criteria(update) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    if let Some(pattern) = cli.series.as_deref() {
        match series::extract_series(engine.entries(), pattern) {
            Ok(all) => {
                for (idx, s) in all.iter().enumerate() {
                    println!("# series {idx} ({} points)", s.len());
                    for (ts, value) in s.timestamps.iter().zip(&s.values) {
                        println!("{ts}\t{value}");
                    }
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(2);
            }
        }
        return;
    }

    if cli.json {
        let visible: Vec<_> = engine.visible_entries().collect();
        match serde_json::to_string_pretty(&visible) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: cannot serialise entries: {e}");
                std::process::exit(1);
            }
        }
    } else {
        for entry in engine.visible_entries() {
            let [line, log_type, timestamp, message] = entry.display_fields();
            println!("{line}\t{log_type}\t{timestamp}\t{message}");
        }
    }
}
