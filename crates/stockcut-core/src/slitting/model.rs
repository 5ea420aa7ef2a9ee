//! 0/1 assignment model: at most one candidate pattern per coil, every demand
//! width covered, total waste minimised.

use crate::types::SlitPattern;
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Outcome class reported by the solver for one thickness group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimedOut,
    Undefined,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::TimedOut => "timed out",
            SolveStatus::Undefined => "undefined",
        };
        f.write_str(label)
    }
}

/// Chosen candidate index per coil, in the order coils were added.
pub type Selection = Vec<Option<usize>>;

#[derive(Debug, Clone)]
struct Column {
    waste: f64,
    /// Strip count per demand width, aligned with `SelectionModel::demand`
    counts: Vec<f64>,
}

/// Plain-data model so it can be moved onto a solver thread.
#[derive(Debug, Clone)]
pub(super) struct SelectionModel {
    demand: Vec<(u32, f64)>,
    units: Vec<Vec<Column>>,
}

impl SelectionModel {
    pub fn new(demand: &BTreeMap<u32, u32>, candidates: &[&[SlitPattern]]) -> Self {
        let demand: Vec<(u32, f64)> = demand
            .iter()
            .map(|(&width, &quantity)| (width, f64::from(quantity)))
            .collect();

        let units = candidates
            .iter()
            .map(|patterns| {
                patterns
                    .iter()
                    .map(|pattern| Column {
                        waste: f64::from(pattern.waste),
                        counts: demand
                            .iter()
                            .map(|(width, _)| f64::from(pattern.count_of(*width)))
                            .collect(),
                    })
                    .collect()
            })
            .collect();

        Self { demand, units }
    }

    pub fn variable_count(&self) -> usize {
        self.units.iter().map(Vec::len).sum()
    }

    /// Widths that no combination of coils can ever cover.
    pub(super) fn uncoverable_width(&self) -> Option<u32> {
        self.demand
            .iter()
            .enumerate()
            .find(|(row, (_, required))| {
                let best: f64 = self
                    .units
                    .iter()
                    .map(|columns| columns.iter().map(|c| c.counts[*row]).fold(0.0, f64::max))
                    .sum();
                best < *required
            })
            .map(|(_, (width, _))| *width)
    }

    /// Builds and solves the model on the calling thread.
    pub fn solve(&self) -> Result<Selection, SolveStatus> {
        if let Some(width) = self.uncoverable_width() {
            tracing::debug!(width, "demand width cannot be covered by any candidate");
            return Err(SolveStatus::Infeasible);
        }

        let mut vars = ProblemVariables::new();
        let choices: Vec<Vec<Variable>> = self
            .units
            .iter()
            .map(|columns| columns.iter().map(|_| vars.add(variable().binary())).collect())
            .collect();

        let mut objective = Expression::from(0.0);
        for (columns, unit_vars) in self.units.iter().zip(&choices) {
            for (column, var) in columns.iter().zip(unit_vars) {
                objective += column.waste * *var;
            }
        }

        let mut problem = vars.minimise(objective).using(default_solver);

        // At most one pattern per coil
        for unit_vars in &choices {
            let mut used = Expression::from(0.0);
            for var in unit_vars {
                used += *var;
            }
            problem = problem.with(constraint!(used <= 1.0));
        }

        // Demand coverage
        for (row, (_, required)) in self.demand.iter().enumerate() {
            let mut covered = Expression::from(0.0);
            for (columns, unit_vars) in self.units.iter().zip(&choices) {
                for (column, var) in columns.iter().zip(unit_vars) {
                    if column.counts[row] > 0.0 {
                        covered += column.counts[row] * *var;
                    }
                }
            }
            let bound = *required;
            problem = problem.with(constraint!(covered >= bound));
        }

        match problem.solve() {
            Ok(solution) => Ok(choices
                .iter()
                .map(|unit_vars| unit_vars.iter().position(|var| solution.value(*var) > 0.5))
                .collect()),
            Err(ResolutionError::Infeasible) => Err(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => Err(SolveStatus::Unbounded),
            Err(err) => {
                tracing::error!("solver error: {}", err);
                Err(SolveStatus::Undefined)
            }
        }
    }

    /// Solves on a worker thread and gives up after `timeout`.
    ///
    /// The solver cannot be interrupted; on timeout the worker is left to
    /// finish on its own and its answer is dropped. Each timed-out call
    /// therefore leaves one detached `stockcut-solver` thread alive until its
    /// solve ends, so callers serving many requests should bound how many
    /// runs they start at once.
    pub fn solve_within(self, timeout: Duration) -> Result<Selection, SolveStatus> {
        run_bounded(timeout, move || self.solve())
    }
}

/// Runs `job` on a named worker thread and waits at most `timeout` for it.
pub(super) fn run_bounded<F>(timeout: Duration, job: F) -> Result<Selection, SolveStatus>
where
    F: FnOnce() -> Result<Selection, SolveStatus> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("stockcut-solver".to_string())
        .spawn(move || {
            let _ = tx.send(job());
        });

    if let Err(err) = spawned {
        tracing::error!("failed to start solver thread: {}", err);
        return Err(SolveStatus::Undefined);
    }

    match rx.recv_timeout(timeout) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "solver timed out, abandoning worker");
            Err(SolveStatus::TimedOut)
        }
        // Worker panicked before answering
        Err(RecvTimeoutError::Disconnected) => Err(SolveStatus::Undefined),
    }
}
