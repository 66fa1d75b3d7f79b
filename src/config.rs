use crate::error::{ModelError, Result};
use std::time::Duration;

/// Sample sizes and pacing for model analysis.
///
/// The defaults give stable value-of-information estimates for small and medium models
/// and take minutes, not seconds. Tests and demos usually shrink the iteration counts.
///
/// # Example
/// ```rust
/// use infoecon_rs::AnalysisConfig;
///
/// let quick = AnalysisConfig {
///     outer_iterations: 50,
///     ..AnalysisConfig::default()
/// };
/// assert!(quick.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Draws of the value variables under the full model
    pub value_samples: usize,
    /// Draws of every other variable for the overview
    pub overview_samples: usize,
    /// Outer iterations of the value-of-information loop
    pub outer_iterations: usize,
    /// Reduced instances per variable in each outer iteration
    pub repeats_per_iteration: usize,
    /// Draws of the value variables under each reduced instance
    pub reduced_samples: usize,
    /// Minimum wall time between intermediate reports
    pub report_interval: Duration,
    /// Draws per sampling task
    pub batch_size: usize,
    /// Worker threads of the sampling pool, 0 picks rayon's default
    pub threads: usize,
    /// Rows written by the distribution export
    pub export_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            value_samples: 10_000,
            overview_samples: 10_000,
            outer_iterations: 10_000,
            repeats_per_iteration: 10,
            reduced_samples: 2_000,
            report_interval: Duration::from_secs(15),
            batch_size: 100,
            threads: 0,
            export_rows: 10_000,
        }
    }
}

impl AnalysisConfig {
    /// # Errors
    /// Returns [`ModelError::InvalidSampleCount`] for any zero count or batch size.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            (self.value_samples, "value_samples must be positive"),
            (self.overview_samples, "overview_samples must be positive"),
            (self.outer_iterations, "outer_iterations must be positive"),
            (
                self.repeats_per_iteration,
                "repeats_per_iteration must be positive",
            ),
            (self.reduced_samples, "reduced_samples must be positive"),
            (self.batch_size, "batch_size must be positive"),
            (self.export_rows, "export_rows must be positive"),
        ];
        for (count, reason) in counts {
            if count == 0 {
                return Err(ModelError::invalid_sample_count(count, reason));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.value_samples, 10_000);
        assert_eq!(config.reduced_samples, 2_000);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.report_interval, Duration::from_secs(15));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = AnalysisConfig {
            batch_size: 0,
            ..AnalysisConfig::default()
        };
        match config.validate() {
            Err(ModelError::InvalidSampleCount { count, reason }) => {
                assert_eq!(count, 0);
                assert!(reason.contains("batch_size"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
