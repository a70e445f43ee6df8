//! `workbench`: import an event log, replay operation requests through a pipeline and
//! print the resulting summary, operation history and graph layout as JSON.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log_workbench::{
    analysis::case_centric::log_summary::{duration_statistics, top_k_activities, DurationStatistics},
    build_layout,
    core::event_data::case_centric::{ImportReport, RecordImportOptions},
    LayoutGraph, LayoutOptions, LogSummary, Operation, OperationPipeline, PipelineOptions,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod csv_input;

use csv_input::{read_log, ColumnMapping};

#[derive(Parser, Debug)]
#[command(name = "workbench")]
#[command(version, about = "Replay event log operations and lay out the directly-follows graph", long_about = None)]
struct Cli {
    /// Event log (`.json` for a serialized log, CSV otherwise)
    #[arg(long)]
    log: PathBuf,

    /// JSON file with an array of operation requests (`{"kind": ..., "parameters": {...}}`)
    #[arg(long)]
    ops: Option<PathBuf>,

    /// CSV column holding the case id
    #[arg(long, default_value = "case:concept:name")]
    case_column: String,

    /// CSV column holding the activity
    #[arg(long, default_value = "concept:name")]
    activity_column: String,

    /// CSV column holding the timestamp
    #[arg(long, default_value = "time:timestamp")]
    timestamp_column: String,

    /// Custom `chrono` format for CSV timestamps
    #[arg(long)]
    date_format: Option<String>,

    /// Percentage of activities kept in the graph
    #[arg(long, default_value_t = 100.0)]
    act_percent: f64,

    /// Percentage of edges kept in the graph
    #[arg(long, default_value_t = 100.0)]
    edge_percent: f64,

    /// Number of undo steps after applying the requests
    #[arg(long, default_value_t = 0)]
    undo: usize,

    /// Number of most frequent activities listed in the output
    #[arg(long, default_value_t = 10)]
    top_k: usize,

    /// Only keep the operation lists in the undo history
    #[arg(long)]
    compact_history: bool,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RejectedRequest {
    index: usize,
    error: String,
}

#[derive(Debug, Serialize)]
struct WorkbenchReport {
    import: Option<ImportReport>,
    summary: LogSummary,
    top_activities: Vec<(String, u64)>,
    durations: Option<DurationStatistics>,
    operations: Vec<String>,
    rejected: Vec<RejectedRequest>,
    layout: LayoutGraph,
}

fn read_requests(path: &Path) -> anyhow::Result<Vec<serde_json::Value>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("{} is not a JSON array of operation requests", path.display()))
}

fn run(cli: &Cli) -> anyhow::Result<WorkbenchReport> {
    let mapping = ColumnMapping {
        case_column: cli.case_column.clone(),
        activity_column: cli.activity_column.clone(),
        timestamp_column: cli.timestamp_column.clone(),
    };
    let import_options = RecordImportOptions {
        date_format: cli.date_format.clone(),
    };
    let (log, import) = read_log(&cli.log, &mapping, &import_options)?;
    tracing::info!(
        cases = log.cases.len(),
        events = log.event_count(),
        "Imported event log from {}",
        cli.log.display()
    );
    let mut pipeline = OperationPipeline::with_options(
        log,
        PipelineOptions {
            snapshot_policy: if cli.compact_history {
                log_workbench::SnapshotPolicy::OperationsOnly
            } else {
                log_workbench::SnapshotPolicy::FullLog
            },
            max_history: None,
        },
    )?;

    let mut rejected = Vec::new();
    if let Some(ops) = &cli.ops {
        for (index, request) in read_requests(ops)?.into_iter().enumerate() {
            let result = Operation::from_request_value(request)
                .and_then(|op| pipeline.append(op).map(|_| ()));
            if let Err(e) = result {
                eprintln!("Skipping request #{index}: {e}");
                rejected.push(RejectedRequest {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }
    for _ in 0..cli.undo {
        if let Err(e) = pipeline.undo() {
            if e.is_informational() {
                eprintln!("{e}");
                break;
            }
            return Err(e.into());
        }
    }

    let current = pipeline.current_log();
    Ok(WorkbenchReport {
        import,
        summary: pipeline.summary(),
        top_activities: top_k_activities(current, cli.top_k),
        durations: duration_statistics(current),
        operations: pipeline.descriptions(),
        rejected,
        layout: build_layout(
            current,
            cli.act_percent,
            cli.edge_percent,
            &LayoutOptions::default(),
        ),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let report = run(&cli)?;
    match &cli.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), &report)?;
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
