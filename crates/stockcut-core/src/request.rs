use crate::config::{OptimizerConfig, PatternLimits, SolverSettings};
use crate::normalize::*;
use crate::packer::BarPacker;
use crate::slitting::SlittingOptimizer;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Bar packing job as submitted from a file or over HTTP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackingRequest {
    /// Falls back to the configured stock when absent
    #[serde(default)]
    pub stock: Option<StockSpec>,
    #[serde(default)]
    pub cuts: Vec<RawCutRow>,
}

impl PackingRequest {
    pub fn run(&self, config: &OptimizerConfig) -> Result<PackingResult> {
        let stock = self.stock.unwrap_or(config.stock);
        let packer = BarPacker::new(stock)?;

        let Normalized {
            records,
            diagnostics,
        } = normalize_cut_rows(&self.cuts);
        let mut result = packer.pack(&records);
        prepend(&mut result.diagnostics, diagnostics);
        Ok(result)
    }
}

/// Coil slitting job with its three tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlittingRequest {
    #[serde(default)]
    pub orders: Vec<RawOrderRow>,
    #[serde(default)]
    pub fillers: Vec<RawFillerRow>,
    #[serde(default)]
    pub coils: Vec<RawCoilRow>,
    #[serde(default)]
    pub patterns: Option<PatternLimits>,
    #[serde(default)]
    pub solver: Option<SolverSettings>,
}

impl SlittingRequest {
    pub fn run(&self, config: &OptimizerConfig) -> Result<SlittingResult> {
        let optimizer = SlittingOptimizer::new(
            self.patterns.unwrap_or(config.patterns),
            self.solver.unwrap_or(config.solver),
        )?;

        let orders = normalize_order_rows(&self.orders);
        let fillers = normalize_filler_rows(&self.fillers);
        let coils = normalize_coil_rows(&self.coils);

        let mut diagnostics = orders.diagnostics;
        diagnostics.extend(fillers.diagnostics);
        diagnostics.extend(coils.diagnostics);

        let input = SlittingInput {
            demands: orders.records,
            fillers: fillers.records,
            units: coils.records,
        };
        let mut result = optimizer.optimize(&input);
        prepend(&mut result.diagnostics, diagnostics);
        Ok(result)
    }
}

fn prepend(target: &mut Vec<Diagnostic>, mut earlier: Vec<Diagnostic>) {
    earlier.append(target);
    *target = earlier;
}
