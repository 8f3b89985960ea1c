//! # lmdesign
//!
//! Design matrices, ordinary least squares and coefficient t-tests for small
//! linear models with categorical and continuous predictors.
//!
//! The pipeline has three stages:
//!
//! 1. A [`ModelFrame`](types::ModelFrame) holds the response and the predictor columns.
//! 2. [`DesignMatrix`](design::DesignMatrix) expands categorical predictors into
//!    indicator columns under an explicit [`LevelOrdering`](factor::LevelOrdering)
//!    and prepends an intercept.
//! 3. [`fit_ols`](ols::fit_ols) solves the least-squares problem through a QR
//!    decomposition and derives standard errors, t-statistics and p-values.
//!
//! [`LinearModel`](model::LinearModel) runs stages 2 and 3 in one call.
//!
//! ## Features
//!
//! - `plotting` - Enable PNG plots of fitted lines and group means
//! - `full` - Enable all optional features
//!
//! ## Example
//!
//! ```
//! use lmdesign::prelude::*;
//!
//! let frame = ModelFrame::builder("Size", vec![4.75, 7.50, 7.25, 9.25, 7.00, 8.25, 9.75, 12.00])
//!     .categorical("Type", &["Control", "Control", "Control", "Control",
//!                            "Mutant", "Mutant", "Mutant", "Mutant"])
//!     .continuous("Weight", vec![67.2, 98.0, 123.2, 137.2, 47.6, 78.4, 89.6, 109.2])
//!     .build()?;
//!
//! let model = LinearModel::new(ModelConfig::default()).fit(&frame)?;
//! assert_eq!(model.coefficient_names(), &["(Intercept)", "TypeMutant", "Weight"]);
//! assert_eq!(model.df_residual(), 5);
//! println!("{}", model);
//! # Ok::<(), LinearModelError>(())
//! ```

pub mod datasets;
pub mod design;
pub mod error;
pub mod factor;
pub mod linalg;
pub mod model;
pub mod ols;
#[cfg(feature = "plotting")]
pub mod plotting;
pub mod summary;
pub mod types;
pub mod utils;

pub mod prelude {
    //! Convenient re-exports of commonly used types.
    pub use crate::design::{DesignLayout, DesignMatrix, INTERCEPT, Term, TermKind, build_design_matrix};
    pub use crate::error::{LinearModelError, Result};
    pub use crate::factor::{Factor, LevelOrdering};
    pub use crate::model::{LinearModel, ModelConfig, lm};
    pub use crate::ols::{Coefficient, FittedModel, fit_ols};
    pub use crate::types::{ModelFrame, Observation, Predictor, PredictorValue};

    #[cfg(feature = "plotting")]
    pub use crate::plotting::{
        ColorPalette, Marker, PlotConfig, plot_fitted_lines, plot_group_means,
        render_fitted_line, render_group_means, render_scatter,
    };
}
