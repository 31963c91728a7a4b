//! Simulate command implementation.

use super::script::{FaceKey, Outcome, Script, ScriptError, Step, Target};
use quantstore_core::{
    preconditions, simulate_extract, simulate_insert, QuantityStorage, StorageError, Transaction,
    TransactionManager,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Result of running a script.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    /// Storage kind.
    pub storage: String,
    /// Per-transaction results.
    pub transactions: Vec<TransactionReport>,
    /// Amount after the last transaction.
    pub final_amount: u64,
    /// Capacity after the last transaction.
    pub final_capacity: u64,
    /// Transaction counters.
    pub stats: StatsReport,
}

/// Result of one root transaction.
#[derive(Debug, Serialize)]
pub struct TransactionReport {
    /// Transaction identifier.
    pub id: String,
    /// Requested outcome.
    pub outcome: Outcome,
    /// Step results in execution order, nested steps included.
    pub steps: Vec<StepReport>,
    /// Amount once the transaction closed.
    pub amount_after: u64,
}

/// Result of one step.
#[derive(Debug, Serialize)]
pub struct StepReport {
    /// Nesting depth the step ran at.
    pub depth: usize,
    /// Operation name.
    pub op: String,
    /// Access face.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceKey>,
    /// Requested amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<u64>,
    /// Amount moved, or that would move for simulations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved: Option<u64>,
    /// Amount visible after the step.
    pub amount: u64,
}

/// Copy of the manager counters.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    /// Root transactions committed.
    pub roots_committed: u64,
    /// Root transactions aborted.
    pub roots_aborted: u64,
    /// Nested transactions opened.
    pub nested_opened: u64,
    /// Participant snapshots taken.
    pub snapshots_taken: u64,
    /// Snapshots restored by aborts.
    pub snapshots_restored: u64,
    /// Final-commit hooks fired.
    pub final_commits: u64,
}

/// Runs the simulate command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path).map_err(ScriptError::from)?;
    let script = Script::from_json(&text)?;
    info!(path = %path.display(), storage = script.storage.kind(), "running script");

    let report = execute(&script)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_text_output(&report);
        }
    }

    Ok(())
}

/// Runs a parsed script and collects the report.
pub fn execute(script: &Script) -> Result<SimulationReport, ScriptError> {
    let target = script.storage.build()?;
    let tm = TransactionManager::new();
    let mut transactions = Vec::with_capacity(script.transactions.len());

    for declared in &script.transactions {
        let mut txn = tm.begin().map_err(StorageError::from)?;
        let id = txn.id().to_string();
        let mut steps = Vec::new();

        run_steps(&target, &declared.steps, &mut txn, &mut steps)?;
        close(txn, declared.outcome);

        let amount_after = target.storage(FaceKey::Any).amount();
        debug!(%id, outcome = %declared.outcome, amount_after, "transaction closed");
        transactions.push(TransactionReport {
            id,
            outcome: declared.outcome,
            steps,
            amount_after,
        });
    }

    let storage = target.storage(FaceKey::Any);
    let stats = tm.stats().snapshot();
    Ok(SimulationReport {
        storage: script.storage.kind().to_string(),
        transactions,
        final_amount: storage.amount(),
        final_capacity: storage.capacity(),
        stats: StatsReport {
            roots_committed: stats.roots_committed,
            roots_aborted: stats.roots_aborted,
            nested_opened: stats.nested_opened,
            snapshots_taken: stats.snapshots_taken,
            snapshots_restored: stats.snapshots_restored,
            final_commits: stats.final_commits,
        },
    })
}

fn close(txn: Transaction<'_>, outcome: Outcome) {
    match outcome {
        Outcome::Commit => txn.commit(),
        Outcome::Abort => txn.abort(),
    }
}

fn run_steps(
    target: &Target,
    steps: &[Step],
    txn: &mut Transaction<'_>,
    out: &mut Vec<StepReport>,
) -> Result<(), ScriptError> {
    for step in steps {
        let (op, face, requested, moved) = match step {
            Step::Insert { amount, face } => {
                let requested = preconditions::not_negative(*amount)?;
                let moved = target.storage(*face).insert(requested, txn);
                ("insert", *face, requested, moved)
            }
            Step::Extract { amount, face } => {
                let requested = preconditions::not_negative(*amount)?;
                let moved = target.storage(*face).extract(requested, txn);
                ("extract", *face, requested, moved)
            }
            Step::SimulateInsert { amount, face } => {
                let requested = preconditions::not_negative(*amount)?;
                let moved = simulate_insert(&*target.storage(*face), requested, txn);
                ("simulate_insert", *face, requested, moved)
            }
            Step::SimulateExtract { amount, face } => {
                let requested = preconditions::not_negative(*amount)?;
                let moved = simulate_extract(&*target.storage(*face), requested, txn);
                ("simulate_extract", *face, requested, moved)
            }
            Step::Nested { steps, outcome } => {
                let mut nested = txn.open_nested();
                run_steps(target, steps, &mut nested, out)?;
                close(nested, *outcome);
                out.push(StepReport {
                    depth: txn.depth(),
                    op: format!("nested:{outcome}"),
                    face: None,
                    requested: None,
                    moved: None,
                    amount: target.storage(FaceKey::Any).amount(),
                });
                continue;
            }
        };

        out.push(StepReport {
            depth: txn.depth(),
            op: op.to_string(),
            face: Some(face),
            requested: Some(requested),
            moved: Some(moved),
            amount: target.storage(FaceKey::Any).amount(),
        });
    }
    Ok(())
}

fn print_text_output(report: &SimulationReport) {
    println!("Storage: {}", report.storage);
    println!();

    for txn in &report.transactions {
        println!("{} ({})", txn.id, txn.outcome);
        for step in &txn.steps {
            let indent = "  ".repeat(step.depth + 1);
            match (step.requested, step.moved) {
                (Some(requested), Some(moved)) => println!(
                    "{indent}{:<17} {:<5} requested {:>8} moved {:>8} amount {}",
                    step.op,
                    step.face.unwrap_or_default().as_str(),
                    requested,
                    moved,
                    step.amount
                ),
                _ => println!("{indent}{} amount {}", step.op, step.amount),
            }
        }
        println!("  amount after: {}", txn.amount_after);
    }

    println!();
    println!("Final amount: {}/{}", report.final_amount, report.final_capacity);
    println!();
    println!("Transactions:");
    println!("  Committed:          {}", report.stats.roots_committed);
    println!("  Aborted:            {}", report.stats.roots_aborted);
    println!("  Nested opened:      {}", report.stats.nested_opened);
    println!("  Snapshots taken:    {}", report.stats.snapshots_taken);
    println!("  Snapshots restored: {}", report.stats.snapshots_restored);
    println!("  Final commits:      {}", report.stats.final_commits);
}
