//! Text summary of a fitted model.
//!
//! ```text
//! Call: Size ~ Type + Weight
//!
//! Residuals:
//!      Min       1Q   Median       3Q      Max
//! ...
//! Coefficients:
//!                Estimate  Std. Error   t value  Pr(>|t|)
//! (Intercept)    0.201299    1.318592     0.153   0.88463
//! ...
//! ```

use crate::design::TermKind;
use crate::ols::FittedModel;
use crate::utils::{five_number_summary, format_p_value, significance_code};
use std::fmt::{Display, Formatter, Result};

impl FittedModel {
    /// Model formula reconstructed from the terms, e.g. `Size ~ Type + Weight`.
    pub fn formula(&self) -> String {
        let terms: Vec<&str> = self
            .layout()
            .terms()
            .iter()
            .filter(|t| t.kind != TermKind::Intercept)
            .map(|t| t.name.as_str())
            .collect();
        if terms.is_empty() {
            format!("{} ~ 1", self.response_name())
        } else {
            format!("{} ~ {}", self.response_name(), terms.join(" + "))
        }
    }
}

impl Display for FittedModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Call: {}", self.formula())?;
        writeln!(f)?;

        let quantiles = five_number_summary(&self.residuals());
        writeln!(f, "Residuals:")?;
        writeln!(
            f,
            "{:>10} {:>10} {:>10} {:>10} {:>10}",
            "Min", "1Q", "Median", "3Q", "Max"
        )?;
        writeln!(
            f,
            "{:>10.5} {:>10.5} {:>10.5} {:>10.5} {:>10.5}",
            quantiles[0], quantiles[1], quantiles[2], quantiles[3], quantiles[4]
        )?;
        writeln!(f)?;

        let width = self
            .coefficient_names()
            .iter()
            .map(|n| n.len())
            .max()
            .unwrap_or(0)
            .max(11);
        writeln!(f, "Coefficients:")?;
        writeln!(
            f,
            "{:<width$} {:>12} {:>12} {:>9} {:>10}",
            "",
            "Estimate",
            "Std. Error",
            "t value",
            "Pr(>|t|)",
            width = width
        )?;
        for coef in self.coefficients() {
            writeln!(
                f,
                "{:<width$} {:>12.6} {:>12.6} {:>9.3} {:>10} {}",
                coef.name,
                coef.estimate,
                coef.std_error,
                coef.t_value,
                format_p_value(coef.p_value),
                significance_code(coef.p_value),
                width = width
            )?;
        }
        writeln!(f, "---")?;
        writeln!(
            f,
            "Signif. codes:  0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1"
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "Residual standard error: {:.4} on {} degrees of freedom",
            self.sigma(),
            self.df_residual()
        )?;
        writeln!(
            f,
            "Multiple R-squared: {:.4},\tAdjusted R-squared: {:.4}",
            self.r_squared(),
            self.adj_r_squared()
        )?;
        if self.f_statistic().is_finite() {
            writeln!(
                f,
                "F-statistic: {:.3} on {} and {} DF,  p-value: {}",
                self.f_statistic(),
                self.n_params() - 1,
                self.df_residual(),
                format_p_value(self.f_p_value())
            )?;
        }

        Ok(())
    }
}
