use super::*;
use std::collections::HashMap;

impl BarPacker {
    /// Groups bars with identical cut multisets, in order of first appearance.
    pub(super) fn group_patterns(&self, bars: &[Bar]) -> Vec<PatternGroup> {
        let effective_length = self.stock.effective_length();
        let mut positions: HashMap<Vec<u32>, usize> = HashMap::new();
        let mut groups: Vec<PatternGroup> = Vec::new();

        for bar in bars {
            let cuts = bar.canonical_cuts();
            if let Some(&pos) = positions.get(&cuts) {
                groups[pos].occurrence_count += 1;
                continue;
            }

            let used_length = bar.used_length();
            let remaining_length = effective_length - used_length;
            positions.insert(cuts.clone(), groups.len());
            groups.push(PatternGroup {
                index: groups.len() + 1,
                occurrence_count: 1,
                cuts,
                used_length,
                remaining_length,
                waste: remaining_length + self.stock.reserved_length,
            });
        }

        groups
    }

    /// Computes bar count, waste and utilization over the whole run.
    pub(super) fn calculate_summary(&self, bars: &[Bar]) -> PackingSummary {
        let total_bars = bars.len() as u32;
        let total_waste: u64 = bars
            .iter()
            .map(|bar| u64::from(bar.waste(self.stock.reserved_length)))
            .sum();
        let total_cut_length: u64 = bars.iter().map(|bar| u64::from(bar.used_length())).sum();
        let total_stock = u64::from(self.stock.stock_length) * u64::from(total_bars);
        let utilization_percentage = if total_stock > 0 {
            (total_cut_length as f64 / total_stock as f64) * 100.0
        } else {
            0.0
        };

        PackingSummary {
            total_bars,
            total_waste,
            effective_length: self.stock.effective_length(),
            total_cut_length,
            utilization_percentage,
        }
    }
}
