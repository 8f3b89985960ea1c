//! Design matrix construction.
//!
//! Column order is fixed: `(Intercept)`, then every predictor in declaration
//! order. A categorical predictor with levels `{L0, L1, .., Lk}` expands into
//! `k` indicator columns named `<predictor><level>`, skipping the reference
//! level `L0`. A continuous predictor is copied verbatim.

use crate::error::{LinearModelError, Result};
use crate::factor::{Factor, LevelOrdering};
use crate::types::{ModelFrame, Observation, Predictor, PredictorValue};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Label of the intercept column.
pub const INTERCEPT: &str = "(Intercept)";

/// What kind of model term produced a group of design columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TermKind {
    Intercept,
    Continuous,
    /// Levels in model order, reference first.
    Categorical { levels: Vec<String> },
}

/// One model term and the design columns it occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub name: String,
    pub kind: TermKind,
    pub columns: Vec<usize>,
}

/// Column names and term bookkeeping of a design matrix, without the data.
///
/// Kept by fitted models so new observations can be encoded exactly the way
/// the training data was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignLayout {
    column_names: Vec<String>,
    terms: Vec<Term>,
}

impl DesignLayout {
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn ncols(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn term(&self, name: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.name == name)
    }

    /// Encode predictor values (one `Vec` per row, declaration order) into
    /// design rows.
    pub fn encode(&self, rows: &[Vec<PredictorValue>]) -> Result<Array2<f64>> {
        let predictor_terms: Vec<&Term> = self
            .terms
            .iter()
            .filter(|t| t.kind != TermKind::Intercept)
            .collect();
        let mut out = Array2::zeros((rows.len(), self.ncols()));

        for (i, values) in rows.iter().enumerate() {
            if values.len() != predictor_terms.len() {
                return Err(LinearModelError::dimension_mismatch(
                    format!("predictor values of row {}", i),
                    predictor_terms.len(),
                    values.len(),
                ));
            }
            for term in &self.terms {
                if term.kind == TermKind::Intercept {
                    out[[i, term.columns[0]]] = 1.0;
                }
            }
            for (term, value) in predictor_terms.iter().zip(values.iter()) {
                match (&term.kind, value) {
                    (TermKind::Continuous, PredictorValue::Continuous(v)) => {
                        if !v.is_finite() {
                            return Err(LinearModelError::InvalidInput(format!(
                                "predictor '{}' has non-finite value {} in row {}",
                                term.name, v, i
                            )));
                        }
                        out[[i, term.columns[0]]] = *v;
                    }
                    (TermKind::Categorical { levels }, PredictorValue::Categorical(label)) => {
                        let code = levels.iter().position(|l| l == label).ok_or_else(|| {
                            LinearModelError::invalid_factor(
                                &term.name,
                                format!("value '{}' is not one of the declared levels", label),
                            )
                        })?;
                        if code > 0 {
                            out[[i, term.columns[code - 1]]] = 1.0;
                        }
                    }
                    _ => {
                        return Err(LinearModelError::InvalidInput(format!(
                            "predictor '{}' in row {} has the wrong kind of value",
                            term.name, i
                        )));
                    }
                }
            }
        }

        Ok(out)
    }

    /// Encode full observations (the response is ignored).
    pub fn encode_observations(&self, observations: &[Observation]) -> Result<Array2<f64>> {
        let rows: Vec<Vec<PredictorValue>> =
            observations.iter().map(|o| o.values.clone()).collect();
        self.encode(&rows)
    }
}

/// A numeric design matrix with one row per observation and one column per
/// model coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    matrix: Array2<f64>,
    layout: DesignLayout,
}

impl DesignMatrix {
    /// Build the design matrix of a model frame.
    pub fn from_frame(frame: &ModelFrame, ordering: &LevelOrdering) -> Result<Self> {
        build(frame.n_obs(), frame.predictors(), ordering)
    }

    /// Build a design matrix straight from predictor columns. All columns
    /// must have the same length.
    pub fn from_predictors(predictors: &[Predictor], ordering: &LevelOrdering) -> Result<Self> {
        let n = predictors.first().map(Predictor::len).ok_or_else(|| {
            LinearModelError::InvalidInput(
                "at least one predictor is needed to infer the number of observations"
                    .to_string(),
            )
        })?;
        build(n, predictors, ordering)
    }

    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    pub fn layout(&self) -> &DesignLayout {
        &self.layout
    }

    pub fn column_names(&self) -> &[String] {
        self.layout.column_names()
    }

    pub fn terms(&self) -> &[Term] {
        self.layout.terms()
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Column by label, e.g. `"TypeMutant"`.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.layout
            .column_index(name)
            .map(|j| self.matrix.column(j))
    }

    /// Indices of the columns produced by one predictor.
    pub fn term_columns(&self, predictor: &str) -> Option<&[usize]> {
        self.layout.term(predictor).map(|t| t.columns.as_slice())
    }

    /// Encode new observations with this matrix's factor levels.
    pub fn design_rows(&self, rows: &[Vec<PredictorValue>]) -> Result<Array2<f64>> {
        self.layout.encode(rows)
    }
}

/// Build the design matrix for `frame` under `ordering`.
pub fn build_design_matrix(frame: &ModelFrame, ordering: &LevelOrdering) -> Result<DesignMatrix> {
    DesignMatrix::from_frame(frame, ordering)
}

fn build(n: usize, predictors: &[Predictor], ordering: &LevelOrdering) -> Result<DesignMatrix> {
    if n == 0 {
        return Err(LinearModelError::InvalidInput(
            "design matrix needs at least one observation".to_string(),
        ));
    }

    let mut column_names = vec![INTERCEPT.to_string()];
    let mut terms = vec![Term {
        name: INTERCEPT.to_string(),
        kind: TermKind::Intercept,
        columns: vec![0],
    }];
    let mut columns: Vec<Vec<f64>> = vec![vec![1.0; n]];

    for predictor in predictors {
        if predictor.len() != n {
            return Err(LinearModelError::dimension_mismatch(
                format!("predictor '{}'", predictor.name()),
                n,
                predictor.len(),
            ));
        }
        if terms.iter().any(|t| t.name == predictor.name()) {
            return Err(LinearModelError::InvalidInput(format!(
                "duplicate predictor name '{}'",
                predictor.name()
            )));
        }

        match predictor {
            Predictor::Continuous { name, values } => {
                if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                    return Err(LinearModelError::InvalidInput(format!(
                        "predictor '{}' contains non-finite value {}",
                        name, bad
                    )));
                }
                terms.push(Term {
                    name: name.clone(),
                    kind: TermKind::Continuous,
                    columns: vec![columns.len()],
                });
                column_names.push(name.clone());
                columns.push(values.clone());
            }
            Predictor::Categorical { name, values } => {
                let factor = Factor::new(name.clone(), values, ordering)?;
                let first = columns.len();
                for (offset, label) in factor.column_names().into_iter().enumerate() {
                    let code = offset + 1;
                    columns.push(
                        factor
                            .codes()
                            .iter()
                            .map(|&c| if c == code { 1.0 } else { 0.0 })
                            .collect(),
                    );
                    column_names.push(label);
                }
                log::debug!(
                    "factor '{}' has levels {:?} (reference '{}')",
                    name,
                    factor.levels(),
                    factor.reference()
                );
                terms.push(Term {
                    name: name.clone(),
                    kind: TermKind::Categorical {
                        levels: factor.levels().to_vec(),
                    },
                    columns: (first..columns.len()).collect(),
                });
            }
        }
    }

    let p = columns.len();
    let matrix = Array2::from_shape_fn((n, p), |(i, j)| columns[j][i]);
    log::debug!("built {}x{} design matrix: {:?}", n, p, column_names);

    Ok(DesignMatrix {
        matrix,
        layout: DesignLayout {
            column_names,
            terms,
        },
    })
}
