use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Requested cut length and how many pieces of it are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutRequest {
    pub length: u32,
    pub quantity: u32,
}

impl CutRequest {
    pub fn new(length: u32, quantity: u32) -> Self {
        Self { length, quantity }
    }
}

/// Raw stock bar dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSpec {
    pub stock_length: u32,
    /// Non-cutting allowance (clamp/chuck) lost on every bar
    #[serde(default)]
    pub reserved_length: u32,
}

impl StockSpec {
    pub fn new(stock_length: u32, reserved_length: u32) -> Self {
        Self {
            stock_length,
            reserved_length,
        }
    }

    /// Length that can actually be cut. Callers validate first.
    pub fn effective_length(&self) -> u32 {
        self.stock_length.saturating_sub(self.reserved_length)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stock_length == 0 {
            return Err(OptimizerError::Configuration(
                "Stock length must be greater than zero".to_string(),
            ));
        }
        if self.reserved_length >= self.stock_length {
            return Err(OptimizerError::Configuration(format!(
                "Reserved length {} must be smaller than stock length {}",
                self.reserved_length, self.stock_length
            )));
        }
        Ok(())
    }
}

impl Default for StockSpec {
    fn default() -> Self {
        Self::new(6000, 300)
    }
}

/// A single consumed stock bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Cut lengths in placement order
    pub cuts: Vec<u32>,
    /// Effective length still available on this bar
    pub remaining: u32,
}

impl Bar {
    pub(crate) fn open(effective_length: u32, first_cut: u32) -> Self {
        Self {
            cuts: vec![first_cut],
            remaining: effective_length - first_cut,
        }
    }

    pub(crate) fn push(&mut self, length: u32) {
        self.cuts.push(length);
        self.remaining -= length;
    }

    pub fn used_length(&self) -> u32 {
        self.cuts.iter().sum()
    }

    /// Unused effective length plus the reserved allowance.
    pub fn waste(&self, reserved_length: u32) -> u32 {
        self.remaining + reserved_length
    }

    /// Cut lengths sorted descending; identical keys mean identical patterns.
    pub fn canonical_cuts(&self) -> Vec<u32> {
        let mut cuts = self.cuts.clone();
        cuts.sort_unstable_by(|a, b| b.cmp(a));
        cuts
    }
}

/// One row of the bar pattern table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternGroup {
    pub index: usize,
    pub occurrence_count: u32,
    pub cuts: Vec<u32>,
    pub used_length: u32,
    pub remaining_length: u32,
    pub waste: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingSummary {
    pub total_bars: u32,
    pub total_waste: u64,
    pub effective_length: u32,
    pub total_cut_length: u64,
    pub utilization_percentage: f64,
}

/// Output of a bar packing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingResult {
    pub stock: StockSpec,
    pub bars: Vec<Bar>,
    pub patterns: Vec<PatternGroup>,
    pub summary: PackingSummary,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Thickness grouping key (thickness in micrometres, e.g. 0.75 mm -> 750).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThicknessBucket(pub u32);

impl ThicknessBucket {
    /// Buckets 750 and 800 are stocked interchangeably.
    const INTERCHANGEABLE: [u32; 2] = [750, 800];

    pub fn from_millimetres(thickness: f64) -> Self {
        Self((thickness * 1000.0).round() as u32)
    }

    pub fn millimetres(&self) -> f64 {
        f64::from(self.0) / 1000.0
    }

    pub fn is_compatible(&self, other: ThicknessBucket) -> bool {
        self.0 == other.0
            || (Self::INTERCHANGEABLE.contains(&self.0) && Self::INTERCHANGEABLE.contains(&other.0))
    }
}

impl fmt::Display for ThicknessBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}t", self.millimetres())
    }
}

/// Ordered width demand for one thickness bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthDemand {
    pub thickness_bucket: ThicknessBucket,
    pub width: u32,
    pub quantity: u32,
}

/// Width that may be slit to reduce scrap; never counted as demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillerWidth {
    pub thickness_bucket: ThicknessBucket,
    pub width: u32,
}

/// A physical coil available for slitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUnit {
    pub id: String,
    pub thickness_bucket: ThicknessBucket,
    pub width: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub vendor: String,
}

/// One way to slit a coil.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlitPattern {
    /// Demand width -> strip count
    pub composition: BTreeMap<u32, u32>,
    /// Combined width of filler strips
    pub filler_total: u32,
    pub waste: u32,
}

impl SlitPattern {
    pub fn demand_width(&self) -> u32 {
        self.composition.iter().map(|(width, count)| width * count).sum()
    }

    pub fn used_width(&self) -> u32 {
        self.demand_width() + self.filler_total
    }

    pub fn count_of(&self, width: u32) -> u32 {
        self.composition.get(&width).copied().unwrap_or(0)
    }

    /// `width×count` tokens in ascending width order joined by `+`.
    pub fn label(&self) -> String {
        self.composition
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(width, count)| format!("{}×{}", width, count))
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// All inputs of a slitting run, already normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlittingInput {
    pub demands: Vec<WidthDemand>,
    #[serde(default)]
    pub fillers: Vec<FillerWidth>,
    pub units: Vec<StockUnit>,
}

/// A coil with the pattern chosen for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlitAssignment {
    pub thickness_bucket: ThicknessBucket,
    pub unit_id: String,
    pub vendor: String,
    pub weight: f64,
    pub unit_width: u32,
    pub pattern: String,
    pub composition: BTreeMap<u32, u32>,
    pub filler_total: u32,
    pub waste: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlittingSummary {
    pub units_used: u32,
    pub units_unused: u32,
    pub groups_solved: u32,
    pub groups_skipped: u32,
    pub total_waste: u64,
    pub utilization_percentage: f64,
}

/// Output of a slitting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlittingResult {
    pub assignments: Vec<SlitAssignment>,
    pub summary: SlittingSummary,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Category of a non-fatal problem found during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    EmptyInput,
    InvalidRecord,
    OversizedPiece,
    UnmatchedDemand,
    NoCandidates,
    GroupSkipped,
}

/// Non-fatal warning returned alongside partial results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// What the warning is about, e.g. `row 3` or `0.75t`
    pub scope: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, scope: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            kind,
            scope: scope.into(),
            message: message.into(),
        };
        tracing::warn!(
            kind = ?diagnostic.kind,
            scope = %diagnostic.scope,
            "{}",
            diagnostic.message
        );
        diagnostic
    }
}

/// Error type for optimization
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
