//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::types::ReconResult;
use crate::utils::validation::validate_tolerance;

/// Absolute difference above which two amounts are considered different
pub const DEFAULT_AMOUNT_TOLERANCE: f64 = 0.01;

/// Settings for a reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Amounts whose absolute difference is strictly greater than this mismatch
    pub amount_tolerance: f64,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: DEFAULT_AMOUNT_TOLERANCE,
        }
    }
}

impl ReconConfig {
    pub fn with_tolerance(mut self, amount_tolerance: f64) -> Self {
        self.amount_tolerance = amount_tolerance;
        self
    }

    /// Check that the tolerance is a finite, non-negative number
    pub fn validate(&self) -> ReconResult<()> {
        validate_tolerance(self.amount_tolerance)
    }
}
