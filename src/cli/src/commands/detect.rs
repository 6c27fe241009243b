//! Replay a recorded trace through the monitor and report verdicts.

use anyhow::{bail, Context, Result};
use clap::Args;
use cutline_core::config::{Config, PredicateBinding};
use cutline_core::monitor::{DetectionReport, Monitor, OutcomeStatus};
use cutline_core::predicate::PredicateTable;
use cutline_core::trace::Trace;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;
use tracing::{debug, info};

use crate::output::{self, OutputFormat};
use crate::predicates::PredicateArg;

#[derive(Args)]
pub struct DetectArgs {
    /// Path to a JSON trace file
    #[arg(short, long)]
    trace: PathBuf,

    /// Predicate to check, as <id>=<kind>[:<args>] (repeatable)
    #[arg(short, long = "predicate", value_name = "ID=KIND[:ARGS]")]
    predicates: Vec<PredicateArg>,
}

#[derive(Tabled)]
struct VerdictRow {
    #[tabled(rename = "Predicate")]
    predicate: String,
    #[tabled(rename = "Processes")]
    pair: String,
    #[tabled(rename = "Condition")]
    condition: String,
    #[tabled(rename = "Possibly")]
    possibly: String,
    #[tabled(rename = "Definitely")]
    definitely: String,
    #[tabled(rename = "Witness")]
    witness: String,
}

pub async fn execute(args: DetectArgs, config: &Config, format: OutputFormat) -> Result<()> {
    if args.predicates.is_empty() {
        bail!("No predicates given; pass at least one --predicate <id>=<kind>");
    }

    let trace: Trace<Value> = Trace::from_path(&args.trace)
        .with_context(|| format!("Failed to load trace {}", args.trace.display()))?;

    let mut monitor_config = config.monitor.clone();
    monitor_config.process_count = trace.process_count;
    if monitor_config.predicates.is_none() {
        // Only check the default bindings of predicates given on the command line.
        let bindings: Vec<_> = monitor_config
            .bindings()
            .into_iter()
            .filter(|b| args.predicates.iter().any(|p| p.id == b.predicate))
            .collect();
        for arg in unbound(&bindings, &args.predicates) {
            output::print_warning(&format!(
                "{} reads processes {} which the trace does not have; skipped",
                arg.id,
                arg.id.default_pair()
            ));
        }
        monitor_config = monitor_config.with_bindings(bindings);
    } else {
        for arg in unbound(&monitor_config.bindings(), &args.predicates) {
            output::print_warning(&format!(
                "{} is not bound in monitor.predicates; skipped",
                arg.id
            ));
        }
    }
    if monitor_config.bindings().is_empty() {
        bail!("Nothing to check for a trace of {} processes", trace.process_count);
    }

    let mut table: PredicateTable<Value> = PredicateTable::new();
    for arg in &args.predicates {
        table.register(arg.id, arg.condition.clone());
    }

    let monitor = Arc::new(Monitor::new(monitor_config, table).context("Invalid monitor setup")?);
    info!(
        processes = trace.process_count,
        events = trace.event_count(),
        "Replaying trace"
    );

    let detection = tokio::spawn(Arc::clone(&monitor).run_async());

    // One producer task per process, as if each were still running.
    let mut producers = Vec::new();
    for (pid, events) in trace.into_events()? {
        let monitor = Arc::clone(&monitor);
        producers.push(tokio::spawn(async move {
            let count = events.len();
            for event in events {
                monitor.receive_message(pid, event);
            }
            monitor.process_terminated(pid);
            debug!(process = %pid, events = count, "Producer finished");
        }));
    }
    for producer in producers {
        producer.await.context("Producer task failed")?;
    }

    let report = detection.await.context("Detection task failed")??;
    print_report(&report, &args.predicates, format)?;

    if report.failures().next().is_some() {
        bail!("{} predicate(s) failed to evaluate", report.failures().count());
    }
    Ok(())
}

/// Predicates given on the command line that no binding will evaluate.
fn unbound<'a>(bindings: &[PredicateBinding], args: &'a [PredicateArg]) -> Vec<&'a PredicateArg> {
    args.iter()
        .filter(|arg| !bindings.iter().any(|b| b.predicate == arg.id))
        .collect()
}

fn print_report(report: &DetectionReport, args: &[PredicateArg], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<VerdictRow> = report
                .outcomes()
                .iter()
                .map(|outcome| {
                    let condition = args
                        .iter()
                        .find(|a| a.id == outcome.predicate)
                        .map(|a| a.condition.to_string())
                        .unwrap_or_default();
                    let (possibly, definitely, witness) = match &outcome.status {
                        OutcomeStatus::Evaluated(verdict) => (
                            output::flag(verdict.possibly),
                            output::flag(verdict.definitely),
                            verdict
                                .witness
                                .as_ref()
                                .map(ToString::to_string)
                                .unwrap_or_else(|| "-".to_string()),
                        ),
                        OutcomeStatus::Failed { error } => {
                            ("failed".to_string(), "failed".to_string(), error.clone())
                        }
                    };
                    VerdictRow {
                        predicate: outcome.predicate.to_string(),
                        pair: outcome.pair.to_string(),
                        condition,
                        possibly,
                        definitely,
                        witness,
                    }
                })
                .collect();

            output::print_header("Detection");
            output::print_table(&rows);
        }
        _ => output::print_item(report, format)?,
    }
    Ok(())
}
