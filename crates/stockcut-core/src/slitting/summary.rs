use super::*;

impl SlittingOptimizer {
    /// Flattens chosen patterns into report rows, coils in input order.
    pub(super) fn assignment_rows(
        bucket: ThicknessBucket,
        chosen: Vec<(&StockUnit, SlitPattern)>,
    ) -> Vec<SlitAssignment> {
        chosen
            .into_iter()
            .map(|(unit, pattern)| SlitAssignment {
                thickness_bucket: bucket,
                unit_id: unit.id.clone(),
                vendor: unit.vendor.clone(),
                weight: unit.weight,
                unit_width: unit.width,
                pattern: pattern.label(),
                filler_total: pattern.filler_total,
                waste: pattern.waste,
                composition: pattern.composition,
            })
            .collect()
    }

    pub(super) fn finish(
        &self,
        assignments: Vec<SlitAssignment>,
        total_units: usize,
        groups_solved: u32,
        groups_skipped: u32,
        diagnostics: Vec<Diagnostic>,
    ) -> SlittingResult {
        let summary = Self::calculate_summary(&assignments, total_units, groups_solved, groups_skipped);

        tracing::info!(
            coils_used = summary.units_used,
            groups_solved,
            groups_skipped,
            total_waste = summary.total_waste,
            "slitting optimization complete"
        );

        SlittingResult {
            assignments,
            summary,
            diagnostics,
        }
    }

    /// Waste and utilization across the coils that were actually slit.
    pub(super) fn calculate_summary(
        assignments: &[SlitAssignment],
        total_units: usize,
        groups_solved: u32,
        groups_skipped: u32,
    ) -> SlittingSummary {
        let units_used = assignments.len() as u32;
        let total_waste: u64 = assignments.iter().map(|a| u64::from(a.waste)).sum();
        let total_width: u64 = assignments.iter().map(|a| u64::from(a.unit_width)).sum();
        let utilization_percentage = if total_width > 0 {
            ((total_width - total_waste) as f64 / total_width as f64) * 100.0
        } else {
            0.0
        };

        SlittingSummary {
            units_used,
            units_unused: (total_units as u32).saturating_sub(units_used),
            groups_solved,
            groups_skipped,
            total_waste,
            utilization_percentage,
        }
    }
}
