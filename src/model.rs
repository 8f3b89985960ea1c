use crate::design::DesignMatrix;
use crate::error::{LinearModelError, Result};
use crate::factor::LevelOrdering;
use crate::linalg::DEFAULT_RANK_TOLERANCE;
use crate::ols::{FittedModel, fit_ols_named};
use crate::types::ModelFrame;
use serde::{Deserialize, Serialize};

/// Configuration for building and fitting a linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference-level policy for categorical predictors.
    pub level_ordering: LevelOrdering,
    /// A design column is treated as linearly dependent when `|R_jj|` falls
    /// below this fraction of the column's own norm.
    pub rank_tolerance: f64,
    /// Coverage of the per-coefficient confidence intervals.
    pub confidence_level: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            level_ordering: LevelOrdering::Alphabetical,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
            confidence_level: 0.95,
        }
    }
}

impl ModelConfig {
    pub fn with_level_ordering(mut self, ordering: LevelOrdering) -> Self {
        self.level_ordering = ordering;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_rank_tolerance(mut self, tolerance: f64) -> Self {
        self.rank_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(LinearModelError::InvalidParameter(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if !(self.rank_tolerance > 0.0 && self.rank_tolerance < 1.0) {
            return Err(LinearModelError::InvalidParameter(format!(
                "rank_tolerance must be in (0, 1), got {}",
                self.rank_tolerance
            )));
        }
        Ok(())
    }
}

/// Fits `response ~ predictors` for any mix of categorical and continuous
/// predictors.
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    config: ModelConfig,
}

impl LinearModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Design matrix this model would fit for `frame`.
    pub fn design_matrix(&self, frame: &ModelFrame) -> Result<DesignMatrix> {
        self.config.validate()?;
        DesignMatrix::from_frame(frame, &self.config.level_ordering)
    }

    /// Build the design matrix and fit it by ordinary least squares.
    pub fn fit(&self, frame: &ModelFrame) -> Result<FittedModel> {
        let design = self.design_matrix(frame)?;
        log::debug!(
            "fitting {} ~ {} ({} observations)",
            frame.response_name(),
            design.column_names()[1..].join(" + "),
            frame.n_obs()
        );

        let fitted = fit_ols_named(
            &design,
            &frame.response(),
            frame.response_name(),
            &self.config,
        )?;

        log::info!(
            "fitted {}: R^2 = {:.4}, sigma = {:.4} on {} df",
            frame.response_name(),
            fitted.r_squared(),
            fitted.sigma(),
            fitted.df_residual()
        );
        Ok(fitted)
    }
}

/// Fit `frame` with the default configuration.
pub fn lm(frame: &ModelFrame) -> Result<FittedModel> {
    LinearModel::default().fit(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn genotype_frame() -> ModelFrame {
        ModelFrame::builder("y", vec![1.0, 1.2, 0.8, 3.1, 2.9, 3.0])
            .categorical("g", &["wt", "wt", "wt", "ko", "ko", "ko"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.level_ordering, LevelOrdering::Alphabetical);
        assert_eq!(config.confidence_level, 0.95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = ModelConfig::default().with_rank_tolerance(0.0);
        assert!(matches!(
            config.validate(),
            Err(LinearModelError::InvalidParameter(_))
        ));
        let model = LinearModel::new(ModelConfig::default().with_confidence_level(f64::NAN));
        assert!(model.fit(&genotype_frame()).is_err());
    }

    #[test]
    fn test_reference_level_changes_sign() {
        let frame = genotype_frame();

        // Alphabetical: "ko" is the reference, the column is "gwt".
        let alpha = lm(&frame).unwrap();
        assert_eq!(alpha.coefficient_names(), &["(Intercept)", "gwt"]);
        assert_relative_eq!(alpha.estimates()[1], -2.0, epsilon = 1e-10);

        // First-seen: "wt" is the reference, the column is "gko".
        let first_seen = LinearModel::new(
            ModelConfig::default().with_level_ordering(LevelOrdering::FirstSeen),
        )
        .fit(&frame)
        .unwrap();
        assert_eq!(first_seen.coefficient_names(), &["(Intercept)", "gko"]);
        assert_relative_eq!(first_seen.estimates()[1], 2.0, epsilon = 1e-10);
        assert_relative_eq!(first_seen.estimates()[0], 1.0, epsilon = 1e-10);

        // Same test statistic magnitude either way.
        assert_relative_eq!(
            alpha.t_values()[1].abs(),
            first_seen.t_values()[1].abs(),
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_response_name_carried() {
        let model = lm(&genotype_frame()).unwrap();
        assert_eq!(model.response_name(), "y");
        assert_eq!(model.n_obs(), 6);
    }
}
