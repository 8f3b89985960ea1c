//! Core data types for representing observations and predictors.

use crate::error::{LinearModelError, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single predictor value in one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredictorValue {
    /// A real-valued measurement.
    Continuous(f64),
    /// A label drawn from a small set of levels.
    Categorical(String),
}

impl PredictorValue {
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            PredictorValue::Continuous(v) => Some(*v),
            PredictorValue::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            PredictorValue::Continuous(_) => None,
            PredictorValue::Categorical(label) => Some(label.as_str()),
        }
    }
}

impl From<f64> for PredictorValue {
    fn from(v: f64) -> Self {
        PredictorValue::Continuous(v)
    }
}

impl From<&str> for PredictorValue {
    fn from(v: &str) -> Self {
        PredictorValue::Categorical(v.to_string())
    }
}

/// A named predictor column.
///
/// Predictors are stored column-wise; use [`ModelFrame::observations`] for a
/// row-oriented view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predictor {
    /// A continuous predictor, copied verbatim into the design matrix.
    Continuous { name: String, values: Vec<f64> },
    /// A categorical predictor, expanded into indicator columns.
    Categorical { name: String, values: Vec<String> },
}

impl Predictor {
    pub fn continuous(name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        Predictor::Continuous {
            name: name.into(),
            values: values.into(),
        }
    }

    pub fn categorical<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        Predictor::Categorical {
            name: name.into(),
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Predictor::Continuous { name, .. } | Predictor::Categorical { name, .. } => name,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Predictor::Continuous { values, .. } => values.len(),
            Predictor::Categorical { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Predictor::Categorical { .. })
    }

    /// Value of this predictor for observation `i`.
    pub fn value(&self, i: usize) -> Option<PredictorValue> {
        match self {
            Predictor::Continuous { values, .. } => {
                values.get(i).map(|v| PredictorValue::Continuous(*v))
            }
            Predictor::Categorical { values, .. } => values
                .get(i)
                .map(|v| PredictorValue::Categorical(v.clone())),
        }
    }
}

/// One row of a [`ModelFrame`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observed response.
    pub response: f64,
    /// One value per declared predictor, in declaration order.
    pub values: Vec<PredictorValue>,
}

/// A response vector together with its predictors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFrame {
    response_name: String,
    response: Array1<f64>,
    predictors: Vec<Predictor>,
}

impl ModelFrame {
    /// Start building a frame around a response vector.
    pub fn builder(
        response_name: impl Into<String>,
        response: impl Into<Vec<f64>>,
    ) -> ModelFrameBuilder {
        ModelFrameBuilder {
            response_name: response_name.into(),
            response: response.into(),
            predictors: Vec::new(),
        }
    }

    /// Create a frame, validating that every column has the response's length.
    pub fn new(
        response_name: impl Into<String>,
        response: Array1<f64>,
        predictors: Vec<Predictor>,
    ) -> Result<Self> {
        let response_name = response_name.into();
        let n = response.len();
        if n == 0 {
            return Err(LinearModelError::InvalidInput(
                "model frame has no observations".to_string(),
            ));
        }
        if let Some(bad) = response.iter().find(|v| !v.is_finite()) {
            return Err(LinearModelError::InvalidInput(format!(
                "response '{}' contains non-finite value {}",
                response_name, bad
            )));
        }

        let mut seen = HashSet::new();
        for predictor in &predictors {
            if !seen.insert(predictor.name()) || predictor.name() == response_name {
                return Err(LinearModelError::InvalidInput(format!(
                    "duplicate column name '{}'",
                    predictor.name()
                )));
            }
            if predictor.len() != n {
                return Err(LinearModelError::dimension_mismatch(
                    format!("predictor '{}'", predictor.name()),
                    n,
                    predictor.len(),
                ));
            }
            if let Predictor::Continuous { name, values } = predictor {
                if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                    return Err(LinearModelError::InvalidInput(format!(
                        "predictor '{}' contains non-finite value {}",
                        name, bad
                    )));
                }
            }
        }

        Ok(Self {
            response_name,
            response,
            predictors,
        })
    }

    pub fn response_name(&self) -> &str {
        &self.response_name
    }

    pub fn response(&self) -> ArrayView1<'_, f64> {
        self.response.view()
    }

    pub fn predictors(&self) -> &[Predictor] {
        &self.predictors
    }

    pub fn predictor(&self, name: &str) -> Option<&Predictor> {
        self.predictors.iter().find(|p| p.name() == name)
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.response.len()
    }

    /// Row-oriented view of the frame.
    pub fn observations(&self) -> Vec<Observation> {
        (0..self.n_obs())
            .map(|i| Observation {
                response: self.response[i],
                values: self
                    .predictors
                    .iter()
                    .filter_map(|p| p.value(i))
                    .collect(),
            })
            .collect()
    }
}

/// Fluent builder for [`ModelFrame`].
#[derive(Debug, Clone)]
pub struct ModelFrameBuilder {
    response_name: String,
    response: Vec<f64>,
    predictors: Vec<Predictor>,
}

impl ModelFrameBuilder {
    pub fn continuous(mut self, name: impl Into<String>, values: impl Into<Vec<f64>>) -> Self {
        self.predictors.push(Predictor::continuous(name, values));
        self
    }

    pub fn categorical<S: AsRef<str>>(mut self, name: impl Into<String>, values: &[S]) -> Self {
        self.predictors.push(Predictor::categorical(name, values));
        self
    }

    pub fn predictor(mut self, predictor: Predictor) -> Self {
        self.predictors.push(predictor);
        self
    }

    pub fn build(self) -> Result<ModelFrame> {
        ModelFrame::new(
            self.response_name,
            Array1::from_vec(self.response),
            self.predictors,
        )
    }
}
