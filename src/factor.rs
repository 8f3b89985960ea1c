//! Categorical predictors and reference-level policy.
//!
//! The first level of a [`Factor`] is its reference level: it is absorbed into
//! the intercept and every other level gets its own indicator column. Which
//! level comes first changes the meaning (and sign) of the fitted
//! coefficients, so the ordering is an explicit [`LevelOrdering`] policy.

use crate::error::{LinearModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// How the levels of a categorical predictor are ordered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LevelOrdering {
    /// Levels sorted lexicographically (byte order). The smallest label is the
    /// reference, so "Control" precedes "Mutant" and "A" precedes "B".
    #[default]
    Alphabetical,
    /// Levels in the order they first appear in the data.
    FirstSeen,
    /// Caller-supplied level order per predictor name. Predictors that are not
    /// listed fall back to alphabetical ordering.
    Explicit(HashMap<String, Vec<String>>),
}

impl LevelOrdering {
    /// Explicit ordering for a single predictor.
    pub fn explicit<S: AsRef<str>>(predictor: impl Into<String>, levels: &[S]) -> Self {
        let mut map = HashMap::new();
        map.insert(
            predictor.into(),
            levels.iter().map(|l| l.as_ref().to_string()).collect(),
        );
        LevelOrdering::Explicit(map)
    }

    /// Add another predictor's explicit order. Converts other policies into
    /// an explicit one.
    pub fn with_levels<S: AsRef<str>>(self, predictor: impl Into<String>, levels: &[S]) -> Self {
        let mut map = match self {
            LevelOrdering::Explicit(map) => map,
            _ => HashMap::new(),
        };
        map.insert(
            predictor.into(),
            levels.iter().map(|l| l.as_ref().to_string()).collect(),
        );
        LevelOrdering::Explicit(map)
    }

    fn resolve(&self, name: &str, values: &[String]) -> Result<Vec<String>> {
        match self {
            LevelOrdering::Alphabetical => Ok(sorted_levels(values)),
            LevelOrdering::FirstSeen => {
                let mut levels: Vec<String> = Vec::new();
                for v in values {
                    if !levels.contains(v) {
                        levels.push(v.clone());
                    }
                }
                Ok(levels)
            }
            LevelOrdering::Explicit(map) => match map.get(name) {
                None => Ok(sorted_levels(values)),
                Some(levels) => {
                    let mut unique = BTreeSet::new();
                    for level in levels {
                        if !unique.insert(level.as_str()) {
                            return Err(LinearModelError::invalid_factor(
                                name,
                                format!("level '{}' listed more than once", level),
                            ));
                        }
                    }
                    if let Some(unknown) = values.iter().find(|v| !levels.contains(v)) {
                        return Err(LinearModelError::invalid_factor(
                            name,
                            format!("value '{}' is not one of the declared levels", unknown),
                        ));
                    }
                    if let Some(empty) = levels.iter().find(|l| !values.contains(l)) {
                        return Err(LinearModelError::invalid_factor(
                            name,
                            format!("declared level '{}' has no observations", empty),
                        ));
                    }
                    Ok(levels.clone())
                }
            },
        }
    }
}

fn sorted_levels(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// A categorical predictor with resolved levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    name: String,
    levels: Vec<String>,
    codes: Vec<usize>,
}

impl Factor {
    /// Resolve the levels of `values` under `ordering`.
    ///
    /// Fails with [`LinearModelError::InvalidFactor`] if fewer than two
    /// distinct levels are observed.
    pub fn new(name: impl Into<String>, values: &[String], ordering: &LevelOrdering) -> Result<Self> {
        let name = name.into();
        let levels = ordering.resolve(&name, values)?;
        if levels.len() < 2 {
            return Err(LinearModelError::invalid_factor(
                &name,
                format!(
                    "needs at least two distinct levels, found {}",
                    levels.len()
                ),
            ));
        }

        let index: HashMap<&str, usize> = levels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let codes = values
            .iter()
            .map(|v| {
                index.get(v.as_str()).copied().ok_or_else(|| {
                    LinearModelError::invalid_factor(
                        &name,
                        format!("value '{}' is not one of the declared levels", v),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            levels,
            codes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All levels, reference first.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn reference(&self) -> &str {
        &self.levels[0]
    }

    /// Level index of each observation.
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Design column labels, one per non-reference level.
    pub fn column_names(&self) -> Vec<String> {
        self.levels[1..]
            .iter()
            .map(|level| format!("{}{}", self.name, level))
            .collect()
    }

    /// Index of `level`, if it is one of this factor's levels.
    pub fn code_of(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == level)
    }
}
