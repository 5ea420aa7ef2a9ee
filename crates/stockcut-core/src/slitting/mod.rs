use crate::config::{PatternLimits, SolverSettings};
use crate::pattern::{DemandSlot, PatternGenerator};
use crate::types::*;
use std::collections::BTreeMap;

mod model;
mod summary;

pub use model::{Selection, SolveStatus};
use model::SelectionModel;

/// Coils of one thickness bucket with the demand and fillers they can serve.
#[derive(Debug)]
struct ThicknessGroup<'a> {
    bucket: ThicknessBucket,
    units: Vec<&'a StockUnit>,
    /// Width -> aggregated quantity over compatible demand buckets
    demand: BTreeMap<u32, u32>,
    fillers: Vec<u32>,
}

/// A coil and the candidate patterns generated for it.
#[derive(Debug)]
struct UnitCandidates<'a> {
    unit: &'a StockUnit,
    patterns: Vec<SlitPattern>,
}

/// How one thickness group ended.
#[derive(Debug)]
enum GroupOutcome<'a> {
    Solved(Vec<(&'a StockUnit, SlitPattern)>),
    Skipped,
}

/// Picks at most one slitting pattern per coil so demand is met with least waste.
///
/// Optimality only holds over the candidates produced by [`PatternGenerator`];
/// patterns outside that bounded set are never considered.
///
/// A group whose solve exceeds the configured timeout is skipped, but its
/// solver thread keeps running detached until it finishes.
pub struct SlittingOptimizer {
    generator: PatternGenerator,
    solver: SolverSettings,
}

impl SlittingOptimizer {
    pub fn new(limits: PatternLimits, solver: SolverSettings) -> Result<Self> {
        limits.validate()?;
        solver.validate()?;
        Ok(Self {
            generator: PatternGenerator::new(limits),
            solver,
        })
    }

    /// Solves every thickness group in ascending bucket order.
    ///
    /// Coils of buckets 750 and 800 form separate groups that each cover the
    /// whole pooled 750/800 demand, so stock in both buckets produces it twice.
    pub fn optimize(&self, input: &SlittingInput) -> SlittingResult {
        let mut diagnostics = Vec::new();
        let demands = Self::valid_demands(&input.demands, &mut diagnostics);
        let fillers = Self::valid_fillers(&input.fillers, &mut diagnostics);
        let units = Self::valid_units(&input.units, &mut diagnostics);

        if demands.is_empty() || units.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::EmptyInput,
                "slitting input",
                "Orders or coil stock are missing",
            ));
            return self.finish(Vec::new(), units.len(), 0, 0, diagnostics);
        }

        Self::report_unmatched_demand(&demands, &units, &mut diagnostics);

        let groups = Self::build_groups(&demands, &fillers, &units);
        let mut assignments = Vec::new();
        let mut solved = 0;
        let mut skipped = 0;

        for group in &groups {
            if group.demand.is_empty() {
                tracing::debug!(bucket = %group.bucket, "no compatible demand, skipping group");
                continue;
            }

            match self.solve_group(group, &mut diagnostics) {
                GroupOutcome::Solved(chosen) => {
                    solved += 1;
                    assignments.extend(Self::assignment_rows(group.bucket, chosen));
                }
                GroupOutcome::Skipped => skipped += 1,
            }
        }

        self.finish(assignments, units.len(), solved, skipped, diagnostics)
    }

    fn valid_demands(demands: &[WidthDemand], diagnostics: &mut Vec<Diagnostic>) -> Vec<WidthDemand> {
        let mut valid = Vec::with_capacity(demands.len());
        for (idx, demand) in demands.iter().enumerate() {
            if demand.width == 0 || demand.quantity == 0 {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidRecord,
                    format!("order {}", idx + 1),
                    format!(
                        "Width {} x quantity {} is not a positive demand",
                        demand.width, demand.quantity
                    ),
                ));
            } else {
                valid.push(*demand);
            }
        }
        valid
    }

    fn valid_fillers(fillers: &[FillerWidth], diagnostics: &mut Vec<Diagnostic>) -> Vec<FillerWidth> {
        let mut valid = Vec::with_capacity(fillers.len());
        for (idx, filler) in fillers.iter().enumerate() {
            if filler.width == 0 {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidRecord,
                    format!("filler {}", idx + 1),
                    "Filler width must be positive",
                ));
            } else {
                valid.push(*filler);
            }
        }
        valid
    }

    fn valid_units<'a>(units: &'a [StockUnit], diagnostics: &mut Vec<Diagnostic>) -> Vec<&'a StockUnit> {
        let mut valid = Vec::with_capacity(units.len());
        for unit in units {
            if unit.width == 0 {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidRecord,
                    format!("coil {}", unit.id),
                    "Coil width must be positive",
                ));
            } else {
                valid.push(unit);
            }
        }
        valid
    }

    /// Warns once per demand bucket that no coil can serve.
    fn report_unmatched_demand(
        demands: &[WidthDemand],
        units: &[&StockUnit],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let mut unmatched: BTreeMap<ThicknessBucket, u32> = BTreeMap::new();
        for demand in demands {
            let served = units
                .iter()
                .any(|unit| unit.thickness_bucket.is_compatible(demand.thickness_bucket));
            if !served {
                *unmatched.entry(demand.thickness_bucket).or_insert(0) += demand.quantity;
            }
        }

        for (bucket, quantity) in unmatched {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnmatchedDemand,
                bucket.to_string(),
                format!("{} ordered strips have no coil of a compatible thickness", quantity),
            ));
        }
    }

    /// Groups coils by their own bucket and attaches compatible demand and fillers.
    fn build_groups<'a>(
        demands: &[WidthDemand],
        fillers: &[FillerWidth],
        units: &[&'a StockUnit],
    ) -> Vec<ThicknessGroup<'a>> {
        let mut by_bucket: BTreeMap<ThicknessBucket, Vec<&'a StockUnit>> = BTreeMap::new();
        for &unit in units {
            by_bucket.entry(unit.thickness_bucket).or_default().push(unit);
        }

        by_bucket
            .into_iter()
            .map(|(bucket, units)| {
                let mut demand = BTreeMap::new();
                for d in demands.iter().filter(|d| bucket.is_compatible(d.thickness_bucket)) {
                    *demand.entry(d.width).or_insert(0) += d.quantity;
                }
                let fillers = fillers
                    .iter()
                    .filter(|f| bucket.is_compatible(f.thickness_bucket))
                    .map(|f| f.width)
                    .collect();

                ThicknessGroup {
                    bucket,
                    units,
                    demand,
                    fillers,
                }
            })
            .collect()
    }

    fn candidates_for<'a>(&self, group: &ThicknessGroup<'a>) -> Vec<UnitCandidates<'a>> {
        group
            .units
            .iter()
            .filter_map(|&unit| {
                let slots: Vec<DemandSlot> = group
                    .demand
                    .iter()
                    .filter(|(width, _)| **width <= unit.width)
                    .map(|(&width, &quantity)| DemandSlot::new(width, quantity))
                    .collect();
                let patterns = self.generator.generate(unit.width, &slots, &group.fillers);
                if patterns.is_empty() {
                    tracing::debug!(unit = %unit.id, width = unit.width, "no candidate fits coil");
                    return None;
                }
                Some(UnitCandidates { unit, patterns })
            })
            .collect()
    }

    fn solve_group<'a>(
        &self,
        group: &ThicknessGroup<'a>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> GroupOutcome<'a> {
        let candidates = self.candidates_for(group);
        if candidates.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::NoCandidates,
                group.bucket.to_string(),
                "No valid slitting pattern for any coil in this thickness",
            ));
            return GroupOutcome::Skipped;
        }

        let columns: Vec<&[SlitPattern]> = candidates.iter().map(|c| c.patterns.as_slice()).collect();
        let model = SelectionModel::new(&group.demand, &columns);
        tracing::debug!(
            bucket = %group.bucket,
            coils = candidates.len(),
            variables = model.variable_count(),
            widths = group.demand.len(),
            "solving thickness group"
        );

        let status = match model.solve_within(self.solver.timeout()) {
            Ok(selection) => {
                let chosen: Vec<(&'a StockUnit, SlitPattern)> = candidates
                    .into_iter()
                    .zip(selection)
                    .filter_map(|(unit_candidates, choice)| {
                        let idx = choice?;
                        let UnitCandidates { unit, mut patterns } = unit_candidates;
                        Some((unit, patterns.swap_remove(idx)))
                    })
                    .collect();
                tracing::info!(
                    bucket = %group.bucket,
                    status = %SolveStatus::Optimal,
                    coils_used = chosen.len(),
                    "thickness group solved"
                );
                return GroupOutcome::Solved(chosen);
            }
            Err(status) => status,
        };

        Self::skip_group(group.bucket, status, diagnostics)
    }

    fn skip_group<'a>(
        bucket: ThicknessBucket,
        status: SolveStatus,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> GroupOutcome<'a> {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::GroupSkipped,
            bucket.to_string(),
            format!("Optimization for thickness {} failed: {}", bucket, status),
        ));
        GroupOutcome::Skipped
    }
}
