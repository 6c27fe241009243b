//! Inspect the lattice of consistent states for one pair of processes.

use anyhow::{bail, Context, Result};
use clap::Args;
use cutline_core::clock::ProcessId;
use cutline_core::events::EventLog;
use cutline_core::lattice::{build_lattice, GlobalState, ProcessPair};
use cutline_core::predicate::Predicate;
use cutline_core::trace::Trace;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use crate::predicates::Condition;

#[derive(Args)]
pub struct LatticeArgs {
    /// Path to a JSON trace file
    #[arg(short, long)]
    trace: PathBuf,

    /// The two processes to vary, e.g. 0,2
    #[arg(short, long, value_parser = parse_pair, default_value = "0,1")]
    pair: (usize, usize),

    /// Mark the states where this condition holds, e.g. sum:10
    #[arg(long, value_name = "KIND[:ARGS]")]
    holds: Option<Condition>,
}

fn parse_pair(s: &str) -> Result<(usize, usize)> {
    let (i, j) = s
        .split_once(',')
        .with_context(|| format!("expected two process ids like 0,1, got '{}'", s))?;
    let i = i.trim().parse().with_context(|| format!("'{}' is not a process id", i))?;
    let j = j.trim().parse().with_context(|| format!("'{}' is not a process id", j))?;
    Ok((i, j))
}

#[derive(Serialize)]
struct LatticeView {
    pair: ProcessPair,
    edges: usize,
    states: Vec<StateView>,
}

#[derive(Serialize)]
struct StateView {
    state: GlobalState,
    consistent: bool,
    local_i: Option<Value>,
    local_j: Option<Value>,
    successors: Vec<GlobalState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    holds: Option<bool>,
}

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Consistent")]
    consistent: String,
    #[tabled(rename = "Local i")]
    local_i: String,
    #[tabled(rename = "Local j")]
    local_j: String,
    #[tabled(rename = "Successors")]
    successors: String,
    #[tabled(rename = "Holds")]
    holds: String,
}

fn local_state(log: &EventLog<Value>, state: &GlobalState) -> Option<Value> {
    log.get(state.index_of(log.process_id()))
        .map(|event| event.state.clone())
}

pub async fn execute(args: LatticeArgs, format: OutputFormat) -> Result<()> {
    let trace: Trace<Value> = Trace::from_path(&args.trace)
        .with_context(|| format!("Failed to load trace {}", args.trace.display()))?;

    let (i, j) = args.pair;
    if i == j || i >= trace.process_count || j >= trace.process_count {
        bail!(
            "Invalid pair {},{} for a trace of {} processes",
            i,
            j,
            trace.process_count
        );
    }
    let pair = ProcessPair::new(ProcessId(i), ProcessId(j));

    let logs = trace.into_logs()?;
    let lattice = build_lattice(&logs, pair);

    let states: Vec<StateView> = lattice
        .states()
        .into_iter()
        .map(|state| {
            let local_i = local_state(&logs[i], state);
            let local_j = local_state(&logs[j], state);
            // The root is listed even when its first events never coexisted.
            let consistent = lattice.is_consistent(state);
            let holds = args.holds.as_ref().map(|condition| match (&local_i, &local_j) {
                (Some(a), Some(b)) if consistent => condition.holds(a, b),
                _ => false,
            });
            StateView {
                successors: lattice.find_reachable_states(state),
                state: state.clone(),
                consistent,
                local_i,
                local_j,
                holds,
            }
        })
        .collect();

    match format {
        OutputFormat::Table => {
            let rows: Vec<StateRow> = states
                .iter()
                .map(|view| StateRow {
                    state: view.state.to_string(),
                    consistent: output::flag(view.consistent),
                    local_i: show(&view.local_i),
                    local_j: show(&view.local_j),
                    successors: view
                        .successors
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" "),
                    holds: view.holds.map(output::flag).unwrap_or_else(|| "-".to_string()),
                })
                .collect();

            output::print_header(&format!("Lattice of {}", pair));
            output::print_table(&rows);
            output::print_info(&format!(
                "{} states, {} edges",
                lattice.len(),
                lattice.edge_count()
            ));
            if !lattice.is_root_consistent() {
                output::print_warning(&format!(
                    "{} is not a consistent cut; listed as the traversal root only",
                    GlobalState::initial(2)
                ));
            }
        }
        _ => output::print_item(
            &LatticeView {
                pair,
                edges: lattice.edge_count(),
                states,
            },
            format,
        )?,
    }

    Ok(())
}

fn show(value: &Option<Value>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}
