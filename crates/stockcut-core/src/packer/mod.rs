use crate::types::*;

mod summary;
#[cfg(test)]
mod tests;

/// Packs cut pieces onto stock bars using first-fit decreasing.
///
/// The heuristic is not guaranteed to use the fewest bars. Downstream reports
/// rely on its exact placement order, so pieces are always sorted with a
/// stable descending sort and bars are always scanned in creation order.
pub struct BarPacker {
    stock: StockSpec,
}

impl BarPacker {
    /// Validates the stock dimensions and builds a new packer.
    pub fn new(stock: StockSpec) -> Result<Self> {
        stock.validate()?;
        Ok(Self { stock })
    }

    pub fn stock(&self) -> StockSpec {
        self.stock
    }

    /// Runs the full packing flow. Invalid requests are reported, not fatal.
    pub fn pack(&self, requests: &[CutRequest]) -> PackingResult {
        let (valid, mut diagnostics) = self.filter_requests(requests);

        if valid.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::EmptyInput,
                "cut list",
                "No valid lengths and quantities to pack",
            ));
            return self.finish(Vec::new(), diagnostics);
        }

        let mut pieces = Self::expand_pieces(&valid);
        // Stable: equal lengths keep their input order
        pieces.sort_by(|a, b| b.cmp(a));

        let bars = self.first_fit_decreasing(&pieces);

        tracing::info!(
            pieces = pieces.len(),
            bars = bars.len(),
            effective_length = self.stock.effective_length(),
            "bar packing complete"
        );

        self.finish(bars, diagnostics)
    }

    /// Drops requests that cannot produce a piece on this stock.
    fn filter_requests(&self, requests: &[CutRequest]) -> (Vec<CutRequest>, Vec<Diagnostic>) {
        let effective_length = self.stock.effective_length();
        let mut valid = Vec::with_capacity(requests.len());
        let mut diagnostics = Vec::new();

        for (idx, request) in requests.iter().enumerate() {
            let scope = format!("request {}", idx + 1);
            if request.length == 0 || request.quantity == 0 {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidRecord,
                    scope,
                    format!(
                        "Length {} x quantity {} is not a positive cut",
                        request.length, request.quantity
                    ),
                ));
            } else if request.length > effective_length {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::OversizedPiece,
                    scope,
                    format!(
                        "Length {} exceeds the effective bar length {}",
                        request.length, effective_length
                    ),
                ));
            } else {
                valid.push(*request);
            }
        }

        (valid, diagnostics)
    }

    /// One entry per requested piece, in request order.
    fn expand_pieces(requests: &[CutRequest]) -> Vec<u32> {
        requests
            .iter()
            .flat_map(|request| std::iter::repeat(request.length).take(request.quantity as usize))
            .collect()
    }

    /// Places each piece on the first bar that still has room, opening a bar otherwise.
    fn first_fit_decreasing(&self, pieces: &[u32]) -> Vec<Bar> {
        let effective_length = self.stock.effective_length();
        let mut bars: Vec<Bar> = Vec::new();

        for &piece in pieces {
            match bars.iter_mut().find(|bar| bar.remaining >= piece) {
                Some(bar) => bar.push(piece),
                None => bars.push(Bar::open(effective_length, piece)),
            }
        }

        bars
    }

    fn finish(&self, bars: Vec<Bar>, diagnostics: Vec<Diagnostic>) -> PackingResult {
        let patterns = self.group_patterns(&bars);
        let summary = self.calculate_summary(&bars);

        PackingResult {
            stock: self.stock,
            bars,
            patterns,
            summary,
            diagnostics,
        }
    }
}
