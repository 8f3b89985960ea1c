//! Ordinary least squares fitting.
//!
//! The fit goes through a QR decomposition of the design matrix:
//!
//! - `beta = R^-1 Q'y` (back substitution)
//! - `sigma^2 = e'e / (n - p)`
//! - `Cov(beta) = sigma^2 R^-1 R^-T`
//! - `t_j = beta_j / SE_j`, two-sided p-value from Student's t with `n - p`
//!   degrees of freedom.

use crate::design::{DesignLayout, DesignMatrix};
use crate::error::{LinearModelError, Result};
use crate::linalg::QrDecomposition;
use crate::model::ModelConfig;
use crate::types::{Observation, PredictorValue};
use crate::utils::nan_as_null;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Residual norms at or below this fraction of the centred response norm
/// `sqrt(sum (y - mean)^2)` count as a perfect fit.
pub const PERFECT_FIT_TOLERANCE: f64 = 1e-12;

/// Estimate and test statistics for one design column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Design column label.
    pub name: String,
    /// Least-squares estimate.
    pub estimate: f64,
    /// Standard error.
    pub std_error: f64,
    /// t-statistic (NaN when the standard error is zero).
    #[serde(with = "nan_as_null")]
    pub t_value: f64,
    /// Two-sided p-value (NaN when the standard error is zero).
    #[serde(with = "nan_as_null")]
    pub p_value: f64,
    /// Lower bound of the confidence interval.
    pub ci_lower: f64,
    /// Upper bound of the confidence interval.
    pub ci_upper: f64,
}

/// A fitted linear model. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    response_name: String,
    layout: DesignLayout,
    coefficients: Vec<Coefficient>,
    fitted_values: Array1<f64>,
    residuals: Array1<f64>,
    covariance: Array2<f64>,
    n_obs: usize,
    df_residual: usize,
    residual_variance: f64,
    #[serde(with = "nan_as_null")]
    r_squared: f64,
    #[serde(with = "nan_as_null")]
    adj_r_squared: f64,
    #[serde(with = "nan_as_null")]
    f_statistic: f64,
    #[serde(with = "nan_as_null")]
    f_p_value: f64,
    confidence_level: f64,
}

/// Fit `y ~ X` by ordinary least squares.
///
/// # Errors
///
/// - [`LinearModelError::DimensionMismatch`] if `y` and `X` disagree on the
///   number of observations.
/// - [`LinearModelError::UnderdeterminedModel`] unless `n > p`.
/// - [`LinearModelError::CollinearPredictors`] if `X` is rank deficient.
pub fn fit_ols(
    design: &DesignMatrix,
    y: &ArrayView1<f64>,
    config: &ModelConfig,
) -> Result<FittedModel> {
    fit_ols_named(design, y, "y", config)
}

pub(crate) fn fit_ols_named(
    design: &DesignMatrix,
    y: &ArrayView1<f64>,
    response_name: &str,
    config: &ModelConfig,
) -> Result<FittedModel> {
    config.validate()?;

    let x = design.matrix();
    let (n, p) = x.dim();
    if y.len() != n {
        return Err(LinearModelError::dimension_mismatch(
            "response vector",
            n,
            y.len(),
        ));
    }
    if let Some(bad) = y.iter().find(|v| !v.is_finite()) {
        return Err(LinearModelError::InvalidInput(format!(
            "response contains non-finite value {}",
            bad
        )));
    }
    if n <= p {
        return Err(LinearModelError::UnderdeterminedModel {
            observations: n,
            parameters: p,
        });
    }

    let qr = QrDecomposition::new(&x)?;
    if let Some(j) = qr.first_deficient_column(config.rank_tolerance) {
        return Err(LinearModelError::CollinearPredictors {
            column: design.column_names()[j].clone(),
        });
    }

    let beta = qr.solve_least_squares(y)?;
    let fitted_values = x.dot(&beta);
    let residuals = y - &fitted_values;

    let df_residual = n - p;
    let rss = residuals.dot(&residuals);
    let residual_variance = if is_perfect_fit(y, rss) {
        log::warn!("essentially perfect fit: t-statistics and p-values are undefined");
        0.0
    } else {
        rss / df_residual as f64
    };

    let covariance = qr.unscaled_covariance()? * residual_variance;
    let coefficients = coefficient_table(
        design.column_names(),
        &beta.view(),
        &covariance.view(),
        df_residual,
        config.confidence_level,
    )?;

    let (r_squared, adj_r_squared) = r_squared(y, rss, n, df_residual);
    let (f_statistic, f_p_value) = f_test(y, rss, p, df_residual, residual_variance)?;

    log::debug!(
        "OLS fit: n={}, p={}, df={}, sigma={:.6}",
        n,
        p,
        df_residual,
        residual_variance.sqrt()
    );

    Ok(FittedModel {
        response_name: response_name.to_string(),
        layout: design.layout().clone(),
        coefficients,
        fitted_values,
        residuals,
        covariance,
        n_obs: n,
        df_residual,
        residual_variance,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value,
        confidence_level: config.confidence_level,
    })
}

fn coefficient_table(
    names: &[String],
    beta: &ArrayView1<f64>,
    covariance: &ArrayView2<f64>,
    df_residual: usize,
    confidence_level: f64,
) -> Result<Vec<Coefficient>> {
    let t_dist = StudentsT::new(0.0, 1.0, df_residual as f64)
        .map_err(|e| LinearModelError::InvalidParameter(e.to_string()))?;
    let t_crit = t_dist.inverse_cdf(1.0 - (1.0 - confidence_level) / 2.0);

    let table = names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let estimate = beta[j];
            let std_error = covariance[[j, j]].max(0.0).sqrt();
            let (t_value, p_value) = if std_error == 0.0 {
                (f64::NAN, f64::NAN)
            } else {
                let t = estimate / std_error;
                (t, 2.0 * t_dist.sf(t.abs()))
            };
            Coefficient {
                name: name.clone(),
                estimate,
                std_error,
                t_value,
                p_value,
                ci_lower: estimate - t_crit * std_error,
                ci_upper: estimate + t_crit * std_error,
            }
        })
        .collect();
    Ok(table)
}

/// Residuals indistinguishable from round-off in `y`.
///
/// The threshold follows the spread of `y`, not its magnitude, so a large
/// offset does not hide real residuals. It never drops below the rounding
/// error of `y` itself (`n * eps * ||y||`).
fn is_perfect_fit(y: &ArrayView1<f64>, rss: f64) -> bool {
    let centred = total_sum_of_squares(y).sqrt();
    let rounding = y.len() as f64 * f64::EPSILON * y.dot(y).sqrt();
    rss.sqrt() <= (PERFECT_FIT_TOLERANCE * centred).max(rounding)
}

fn total_sum_of_squares(y: &ArrayView1<f64>) -> f64 {
    let mean = y.mean().unwrap_or(0.0);
    y.iter().map(|v| (v - mean) * (v - mean)).sum()
}

fn r_squared(y: &ArrayView1<f64>, rss: f64, n: usize, df_residual: usize) -> (f64, f64) {
    let tss = total_sum_of_squares(y);
    if tss == 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let r2 = 1.0 - rss / tss;
    let adj = 1.0 - (1.0 - r2) * (n - 1) as f64 / df_residual as f64;
    (r2, adj)
}

fn f_test(
    y: &ArrayView1<f64>,
    rss: f64,
    p: usize,
    df_residual: usize,
    residual_variance: f64,
) -> Result<(f64, f64)> {
    if p < 2 || residual_variance == 0.0 {
        return Ok((f64::NAN, f64::NAN));
    }
    let df_model = (p - 1) as f64;
    let tss = total_sum_of_squares(y);
    let f = ((tss - rss) / df_model) / residual_variance;
    let f_dist = FisherSnedecor::new(df_model, df_residual as f64)
        .map_err(|e| LinearModelError::InvalidParameter(e.to_string()))?;
    Ok((f, f_dist.sf(f.max(0.0))))
}

impl FittedModel {
    pub fn response_name(&self) -> &str {
        &self.response_name
    }

    pub fn layout(&self) -> &DesignLayout {
        &self.layout
    }

    pub fn coefficient_names(&self) -> &[String] {
        self.layout.column_names()
    }

    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Coefficient by design column label.
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Coefficient estimates, in design column order.
    pub fn estimates(&self) -> Array1<f64> {
        self.coefficients.iter().map(|c| c.estimate).collect()
    }

    pub fn std_errors(&self) -> Array1<f64> {
        self.coefficients.iter().map(|c| c.std_error).collect()
    }

    pub fn t_values(&self) -> Array1<f64> {
        self.coefficients.iter().map(|c| c.t_value).collect()
    }

    pub fn p_values(&self) -> Array1<f64> {
        self.coefficients.iter().map(|c| c.p_value).collect()
    }

    pub fn fitted_values(&self) -> ArrayView1<'_, f64> {
        self.fitted_values.view()
    }

    pub fn residuals(&self) -> ArrayView1<'_, f64> {
        self.residuals.view()
    }

    /// Coefficient covariance matrix `sigma^2 (X'X)^-1`.
    pub fn covariance(&self) -> ArrayView2<'_, f64> {
        self.covariance.view()
    }

    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn n_params(&self) -> usize {
        self.coefficients.len()
    }

    /// Residual degrees of freedom, `n - p`.
    pub fn df_residual(&self) -> usize {
        self.df_residual
    }

    pub fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    /// Residual standard error.
    pub fn sigma(&self) -> f64 {
        self.residual_variance.sqrt()
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    pub fn adj_r_squared(&self) -> f64 {
        self.adj_r_squared
    }

    /// Overall F statistic against the intercept-only model.
    pub fn f_statistic(&self) -> f64 {
        self.f_statistic
    }

    pub fn f_p_value(&self) -> f64 {
        self.f_p_value
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Predict from design rows laid out like the training design matrix.
    pub fn predict(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_params() {
            return Err(LinearModelError::dimension_mismatch(
                "design columns",
                self.n_params(),
                x.ncols(),
            ));
        }
        Ok(x.dot(&self.estimates()))
    }

    /// Predict from raw predictor values, one `Vec` per row in declaration
    /// order.
    pub fn predict_values(&self, rows: &[Vec<PredictorValue>]) -> Result<Array1<f64>> {
        let x = self.layout.encode(rows)?;
        self.predict(&x.view())
    }

    /// Predict from observations. Their responses are ignored.
    pub fn predict_observations(&self, observations: &[Observation]) -> Result<Array1<f64>> {
        let x = self.layout.encode_observations(observations)?;
        self.predict(&x.view())
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_file(&self, path: &str) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| LinearModelError::Io(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        let json =
            std::fs::read_to_string(path).map_err(|e| LinearModelError::Io(e.to_string()))?;
        Self::from_json(&json)
    }
}
