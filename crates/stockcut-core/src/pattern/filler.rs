/// Best filler fill for every space up to a coil width.
///
/// Fillers are an unlimited supply, so the best fill for a space is the largest
/// reachable filler sum not exceeding it. Among fills with the same sum the one
/// with fewer strips wins, and wider fillers are preferred on equal counts.
pub(super) struct FillerTable {
    /// Fewest strips reaching exactly `s`
    strips: Vec<Option<u32>>,
    /// Filler width added last on the fewest-strips path to `s`
    last: Vec<u32>,
    /// Largest reachable sum `<= s`
    floor: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FillerFit {
    /// Filler strips, widest first
    pub pieces: Vec<u32>,
    pub leftover: u32,
}

impl FillerTable {
    pub fn new(capacity: u32, fillers: &[u32]) -> Self {
        let mut widths: Vec<u32> = fillers
            .iter()
            .copied()
            .filter(|&w| w > 0 && w <= capacity)
            .collect();
        widths.sort_unstable_by(|a, b| b.cmp(a));
        widths.dedup();

        let size = capacity as usize + 1;
        let mut strips = vec![None; size];
        let mut last = vec![0; size];
        let mut floor = vec![0; size];
        strips[0] = Some(0);

        for s in 1..size {
            for &width in &widths {
                let w = width as usize;
                if w > s {
                    continue;
                }
                if let Some(prev) = strips[s - w] {
                    if strips[s].map_or(true, |best| prev + 1 < best) {
                        strips[s] = Some(prev + 1);
                        last[s] = width;
                    }
                }
            }
            floor[s] = if strips[s].is_some() { s as u32 } else { floor[s - 1] };
        }

        Self {
            strips,
            last,
            floor,
        }
    }

    /// Fill for `space`; spaces beyond the table are clamped to its capacity.
    pub fn best_fill(&self, space: u32) -> FillerFit {
        let space_idx = (space as usize).min(self.floor.len() - 1);
        let reached = self.floor[space_idx];

        let mut pieces = Vec::new();
        let mut cursor = reached as usize;
        while cursor > 0 {
            let width = self.last[cursor];
            pieces.push(width);
            cursor -= width as usize;
        }
        pieces.sort_unstable_by(|a, b| b.cmp(a));
        debug_assert_eq!(
            self.strips[reached as usize],
            Some(pieces.len() as u32),
            "reconstructed fill must match the recorded strip count"
        );

        FillerFit {
            pieces,
            leftover: space - reached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fillers_leaves_space() {
        let table = FillerTable::new(1000, &[]);
        let fit = table.best_fill(600);
        assert!(fit.pieces.is_empty());
        assert_eq!(fit.leftover, 600);
    }

    #[test]
    fn test_repeats_filler_until_space_is_used() {
        let table = FillerTable::new(1000, &[100]);
        let fit = table.best_fill(250);
        assert_eq!(fit.pieces, vec![100, 100]);
        assert_eq!(fit.leftover, 50);
    }

    #[test]
    fn test_prefers_exact_fill_with_fewest_strips() {
        let table = FillerTable::new(1000, &[30, 50, 70]);
        let fit = table.best_fill(150);
        assert_eq!(fit.leftover, 0);
        // 70+50+30 and 50+50+50 both use three strips; 70+70 leaves 10
        assert_eq!(fit.pieces.len(), 3);
        assert_eq!(fit.pieces.iter().sum::<u32>(), 150);
    }

    #[test]
    fn test_fillers_wider_than_capacity_are_ignored() {
        let table = FillerTable::new(500, &[600, 200]);
        let fit = table.best_fill(500);
        assert_eq!(fit.pieces, vec![200, 200]);
        assert_eq!(fit.leftover, 100);
    }
}
