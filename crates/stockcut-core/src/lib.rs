//! Stock cutting engine: first-fit-decreasing bar packing and 0/1 coil
//! slitting selection over generated candidate patterns.

pub mod config;
pub mod export;
pub mod normalize;
pub mod packer;
pub mod pattern;
pub mod request;
pub mod slitting;
pub mod types;

pub use config::{OptimizerConfig, PatternLimits, SolverSettings};
pub use packer::BarPacker;
pub use pattern::{DemandSlot, PatternGenerator};
pub use request::{PackingRequest, SlittingRequest};
pub use slitting::{SlittingOptimizer, SolveStatus};
pub use types::*;
