use crate::types::{OptimizerError, Result, StockSpec};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds on candidate pattern enumeration for a single coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternLimits {
    /// Candidates kept per demand subset size; the overall cap is twice this
    #[serde(default = "default_per_size")]
    pub per_size: usize,
    /// Demand combinations visited per coil before enumeration stops
    #[serde(default = "default_max_enumerated")]
    pub max_enumerated: usize,
}

impl PatternLimits {
    pub const MAX_PER_SIZE: usize = 1_000;
    pub const MAX_ENUMERATED: usize = 10_000_000;

    pub fn overall(&self) -> usize {
        self.per_size.saturating_mul(2)
    }

    pub fn validate(&self) -> Result<()> {
        if self.per_size == 0 || self.per_size > Self::MAX_PER_SIZE {
            return Err(OptimizerError::Configuration(format!(
                "Pattern limit per subset size must be between 1 and {}, got {}",
                Self::MAX_PER_SIZE,
                self.per_size
            )));
        }
        if self.max_enumerated > Self::MAX_ENUMERATED {
            return Err(OptimizerError::Configuration(format!(
                "Enumeration bound must be at most {}, got {}",
                Self::MAX_ENUMERATED,
                self.max_enumerated
            )));
        }
        Ok(())
    }
}

impl Default for PatternLimits {
    fn default() -> Self {
        Self {
            per_size: default_per_size(),
            max_enumerated: default_max_enumerated(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Wall-clock bound for one thickness group
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SolverSettings {
    /// One hour
    pub const MAX_TIMEOUT_MS: u64 = 3_600_000;

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 || self.timeout_ms > Self::MAX_TIMEOUT_MS {
            return Err(OptimizerError::Configuration(format!(
                "Solver timeout must be between 1 and {} ms, got {}",
                Self::MAX_TIMEOUT_MS,
                self.timeout_ms
            )));
        }
        Ok(())
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Everything a run reads from the outside. Passed into each run explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub stock: StockSpec,
    #[serde(default)]
    pub patterns: PatternLimits,
    #[serde(default)]
    pub solver: SolverSettings,
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        self.stock.validate()?;
        self.patterns.validate()?;
        self.solver.validate()
    }
}

fn default_per_size() -> usize {
    5
}

fn default_max_enumerated() -> usize {
    100_000
}

fn default_timeout_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: OptimizerConfig =
            serde_json::from_str(r#"{"stock": {"stock_length": 5000}}"#).unwrap();
        assert_eq!(config.stock, StockSpec::new(5000, 0));
        assert_eq!(config.patterns.per_size, 5);
        assert_eq!(config.patterns.overall(), 10);
        assert_eq!(config.solver.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let mut config = OptimizerConfig::default();
        assert!(config.validate().is_ok());

        config.patterns.per_size = 0;
        assert!(config.validate().is_err());

        config.patterns.per_size = 3;
        config.solver.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_limits_are_rejected() {
        let limits = PatternLimits {
            per_size: usize::MAX,
            max_enumerated: 10,
        };
        assert!(matches!(limits.validate(), Err(OptimizerError::Configuration(_))));
        assert_eq!(limits.overall(), usize::MAX);

        let limits = PatternLimits {
            per_size: 5,
            max_enumerated: usize::MAX,
        };
        assert!(limits.validate().is_err());

        let limits = PatternLimits {
            per_size: PatternLimits::MAX_PER_SIZE,
            max_enumerated: PatternLimits::MAX_ENUMERATED,
        };
        assert!(limits.validate().is_ok());

        let solver = SolverSettings {
            timeout_ms: u64::MAX,
        };
        assert!(solver.validate().is_err());
    }
}
