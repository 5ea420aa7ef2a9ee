//! Candidate slitting patterns for a single coil.
//!
//! Candidates are built in two passes. First every single demand width is
//! paired with the best filler fill for the rest of the coil. Then every
//! multi-strip demand combination that fits is enumerated, again topped up
//! with fillers, keeping the least wasteful few per combination size. The
//! merged list is deduplicated and trimmed to the overall cap.

use crate::config::PatternLimits;
use crate::types::SlitPattern;
use std::collections::{BTreeMap, HashSet};

mod filler;

use filler::FillerTable;

/// Demand width eligible for a coil together with its outstanding quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemandSlot {
    pub width: u32,
    pub quantity: u32,
}

impl DemandSlot {
    pub fn new(width: u32, quantity: u32) -> Self {
        Self { width, quantity }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    /// Demand strips, widest first
    demand: Vec<u32>,
    /// Filler strips, widest first
    fillers: Vec<u32>,
    waste: u32,
}

impl Candidate {
    fn key(&self) -> (Vec<u32>, Vec<u32>) {
        (self.demand.clone(), self.fillers.clone())
    }

    fn into_pattern(self) -> SlitPattern {
        let mut composition = BTreeMap::new();
        for width in &self.demand {
            *composition.entry(*width).or_insert(0) += 1;
        }
        SlitPattern {
            composition,
            filler_total: self.fillers.iter().sum(),
            waste: self.waste,
        }
    }
}

/// Demand combinations gathered by size during enumeration.
struct Enumeration {
    by_size: Vec<Vec<Candidate>>,
    visited: usize,
    truncated: bool,
}

/// Enumerates bounded candidate patterns for one coil width.
pub struct PatternGenerator {
    limits: PatternLimits,
}

impl PatternGenerator {
    pub fn new(limits: PatternLimits) -> Self {
        Self { limits }
    }

    /// Returns candidates sorted ascending by waste; empty when no demand width fits.
    pub fn generate(&self, capacity: u32, demands: &[DemandSlot], fillers: &[u32]) -> Vec<SlitPattern> {
        let slots = Self::eligible_slots(capacity, demands);
        if slots.is_empty() {
            return Vec::new();
        }

        let table = FillerTable::new(capacity, fillers);
        let mut candidates = self.single_width_candidates(capacity, &slots, &table);
        candidates.extend(self.combination_candidates(capacity, &slots, &table));

        let mut seen = HashSet::new();
        let mut unique: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.key()))
            .collect();
        unique.sort_by_key(|candidate| candidate.waste);
        unique.truncate(self.limits.overall());

        tracing::trace!(
            capacity,
            candidates = unique.len(),
            "generated slitting candidates"
        );

        unique.into_iter().map(Candidate::into_pattern).collect()
    }

    /// Distinct fitting widths, widest first, with copies capped by what fits.
    fn eligible_slots(capacity: u32, demands: &[DemandSlot]) -> Vec<DemandSlot> {
        let mut merged: BTreeMap<u32, u32> = BTreeMap::new();
        for slot in demands {
            if slot.width == 0 || slot.width > capacity || slot.quantity == 0 {
                continue;
            }
            *merged.entry(slot.width).or_insert(0) += slot.quantity;
        }

        merged
            .into_iter()
            .rev()
            .map(|(width, quantity)| DemandSlot::new(width, quantity.min(capacity / width)))
            .collect()
    }

    fn single_width_candidates(
        &self,
        capacity: u32,
        slots: &[DemandSlot],
        table: &FillerTable,
    ) -> Vec<Candidate> {
        slots
            .iter()
            .rev()
            .map(|slot| {
                let fit = table.best_fill(capacity - slot.width);
                Candidate {
                    demand: vec![slot.width],
                    fillers: fit.pieces,
                    waste: fit.leftover,
                }
            })
            .collect()
    }

    /// Combinations of two or more demand strips, densest sizes first.
    fn combination_candidates(
        &self,
        capacity: u32,
        slots: &[DemandSlot],
        table: &FillerTable,
    ) -> Vec<Candidate> {
        let max_size: usize = slots.iter().map(|slot| slot.quantity as usize).sum();
        if max_size < 2 {
            return Vec::new();
        }

        let mut enumeration = Enumeration {
            by_size: vec![Vec::new(); max_size + 1],
            visited: 0,
            truncated: false,
        };
        let mut current = Vec::with_capacity(max_size);
        self.enumerate(slots, 0, capacity, &mut current, table, &mut enumeration);

        if enumeration.truncated {
            tracing::warn!(
                capacity,
                visited = enumeration.visited,
                "pattern enumeration stopped at the configured bound"
            );
        }

        let mut kept = Vec::new();
        for mut group in enumeration.by_size.into_iter().skip(2).rev() {
            group.sort_by_key(|candidate| candidate.waste);
            group.truncate(self.limits.per_size);
            kept.extend(group);
        }
        kept
    }

    fn enumerate(
        &self,
        slots: &[DemandSlot],
        index: usize,
        space: u32,
        current: &mut Vec<u32>,
        table: &FillerTable,
        out: &mut Enumeration,
    ) {
        if out.visited >= self.limits.max_enumerated {
            out.truncated = true;
            return;
        }

        let Some(slot) = slots.get(index) else {
            if current.len() >= 2 {
                out.visited += 1;
                let fit = table.best_fill(space);
                out.by_size[current.len()].push(Candidate {
                    demand: current.clone(),
                    fillers: fit.pieces,
                    waste: fit.leftover,
                });
            }
            return;
        };

        let most = slot.quantity.min(space / slot.width);
        for count in (0..=most).rev() {
            let base = current.len();
            current.extend(std::iter::repeat(slot.width).take(count as usize));
            self.enumerate(
                slots,
                index + 1,
                space - count * slot.width,
                current,
                table,
                out,
            );
            current.truncate(base);
        }
    }
}
