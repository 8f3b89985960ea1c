//! Plotting of fitted linear models over their raw data.
//!
//! Three drawing primitives work on any `plotters` chart:
//! - [`render_scatter`] for the observations, coloured and shaped by group
//! - [`render_fitted_line`] for `y = intercept + slope * x`
//! - [`render_group_means`] for horizontal segments at categorical positions
//!
//! [`plot_fitted_lines`] and [`plot_group_means`] combine them into PNG files.
//!
//! Requires the `plotting` feature to be enabled.

use crate::design::{Term, TermKind};
use crate::error::{LinearModelError, Result};
use crate::ols::FittedModel;
use crate::types::{ModelFrame, Observation, Predictor, PredictorValue};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

/// Chart type every renderer draws on.
pub type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Plot configuration options.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Width of the plot in pixels.
    pub width: u32,
    /// Height of the plot in pixels.
    pub height: u32,
    /// Title of the plot.
    pub title: Option<String>,
    /// X-axis label.
    pub x_label: Option<String>,
    /// Y-axis label.
    pub y_label: Option<String>,
    /// Font size for labels.
    pub font_size: u32,
    /// Color palette name.
    pub palette: ColorPalette,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: None,
            x_label: None,
            y_label: None,
            font_size: 16,
            palette: ColorPalette::Default,
        }
    }
}

/// Color palettes for plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPalette {
    /// Default blue/orange palette.
    Default,
    /// Colorblind-friendly palette.
    ColorBlind,
}

impl ColorPalette {
    /// Get colors from the palette.
    pub fn colors(&self, n: usize) -> Vec<RGBColor> {
        let base_colors: &[RGBColor] = match self {
            ColorPalette::Default => &[
                RGBColor(31, 119, 180),  // Blue
                RGBColor(255, 127, 14),  // Orange
                RGBColor(44, 160, 44),   // Green
                RGBColor(214, 39, 40),   // Red
                RGBColor(148, 103, 189), // Purple
                RGBColor(140, 86, 75),   // Brown
            ],
            ColorPalette::ColorBlind => &[
                RGBColor(0, 114, 178),   // Blue
                RGBColor(230, 159, 0),   // Orange
                RGBColor(0, 158, 115),   // Green
                RGBColor(204, 121, 167), // Pink
                RGBColor(86, 180, 233),  // Sky blue
                RGBColor(213, 94, 0),    // Vermillion
            ],
        };
        (0..n).map(|i| base_colors[i % base_colors.len()]).collect()
    }
}

/// Point shape for a scatter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Triangle,
    Cross,
}

impl Marker {
    /// Cycle through the shapes by group index.
    pub fn nth(i: usize) -> Self {
        match i % 3 {
            0 => Marker::Circle,
            1 => Marker::Triangle,
            _ => Marker::Cross,
        }
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> LinearModelError {
    LinearModelError::Plotting(e.to_string())
}

/// Draw observations as points, one legend entry per group.
///
/// `position` maps an observation to its `(x, y)` coordinate; observations
/// for which it returns `None` are skipped. Groups are drawn in order of
/// first appearance.
pub fn render_scatter<DB, P, G, C, M>(
    chart: &mut Chart<'_, DB>,
    observations: &[Observation],
    position: P,
    group_label: G,
    color: C,
    marker: M,
) -> Result<()>
where
    DB: DrawingBackend,
    P: Fn(usize, &Observation) -> Option<(f64, f64)>,
    G: Fn(&Observation) -> String,
    C: Fn(&str) -> RGBColor,
    M: Fn(&str) -> Marker,
{
    let mut groups: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    for (i, obs) in observations.iter().enumerate() {
        let Some(point) = position(i, obs) else {
            continue;
        };
        let label = group_label(obs);
        match groups.iter_mut().find(|(name, _)| *name == label) {
            Some((_, points)) => points.push(point),
            None => groups.push((label, vec![point])),
        }
    }

    for (label, points) in groups {
        let style = color(&label);
        match marker(&label) {
            Marker::Circle => {
                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, 5, style.filled())))
                    .map_err(plot_err)?
                    .label(label.as_str())
                    .legend(move |(x, y)| Circle::new((x + 10, y), 5, style.filled()));
            }
            Marker::Triangle => {
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|&p| TriangleMarker::new(p, 6, style.filled())),
                    )
                    .map_err(plot_err)?
                    .label(label.as_str())
                    .legend(move |(x, y)| TriangleMarker::new((x + 10, y), 6, style.filled()));
            }
            Marker::Cross => {
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|&p| Cross::new(p, 5, style.stroke_width(2))),
                    )
                    .map_err(plot_err)?
                    .label(label.as_str())
                    .legend(move |(x, y)| Cross::new((x + 10, y), 5, style.stroke_width(2)));
            }
        }
    }

    Ok(())
}

/// Draw `y = intercept + slope * x` across the chart's x range.
pub fn render_fitted_line<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    intercept: f64,
    slope: f64,
    color: RGBColor,
) -> Result<()> {
    let x_range = chart.x_range();
    let points = vec![
        (x_range.start, intercept + slope * x_range.start),
        (x_range.end, intercept + slope * x_range.end),
    ];
    chart
        .draw_series(LineSeries::new(points, color.stroke_width(2)))
        .map_err(plot_err)?;
    Ok(())
}

/// Draw a horizontal segment at each categorical position.
pub fn render_group_means<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    group_positions: &[f64],
    mean_values: &[f64],
    color: RGBColor,
) -> Result<()> {
    if group_positions.len() != mean_values.len() {
        return Err(LinearModelError::dimension_mismatch(
            "group means",
            group_positions.len(),
            mean_values.len(),
        ));
    }
    const HALF_WIDTH: f64 = 0.3;
    chart
        .draw_series(group_positions.iter().zip(mean_values.iter()).map(|(&x, &m)| {
            PathElement::new(
                vec![(x - HALF_WIDTH, m), (x + HALF_WIDTH, m)],
                color.stroke_width(3),
            )
        }))
        .map_err(plot_err)?;
    Ok(())
}

fn continuous_values<'a>(frame: &'a ModelFrame, name: &str) -> Result<&'a [f64]> {
    match frame.predictor(name) {
        Some(Predictor::Continuous { values, .. }) => Ok(values),
        Some(_) => Err(LinearModelError::InvalidInput(format!(
            "predictor '{}' is not continuous",
            name
        ))),
        None => Err(LinearModelError::InvalidInput(format!(
            "unknown predictor '{}'",
            name
        ))),
    }
}

fn categorical_term<'a>(model: &'a FittedModel, name: &str) -> Result<(&'a Term, &'a [String])> {
    if let Some(term) = model.layout().term(name) {
        if let TermKind::Categorical { levels } = &term.kind {
            return Ok((term, levels.as_slice()));
        }
    }
    Err(LinearModelError::InvalidInput(format!(
        "'{}' is not a categorical term of the model",
        name
    )))
}

fn label_of(frame: &ModelFrame, obs: &Observation, name: &str) -> String {
    frame
        .predictors()
        .iter()
        .position(|p| p.name() == name)
        .and_then(|i| obs.values.get(i))
        .and_then(PredictorValue::as_categorical)
        .unwrap_or_default()
        .to_string()
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let margin = if hi > lo { (hi - lo) * 0.1 } else { 1.0 };
    (lo - margin, hi + margin)
}

/// Scatter `response ~ x` coloured by `group` with one fitted line per
/// group level.
///
/// The model must contain `x` as a continuous term and `group` as a
/// categorical term. Any other terms are held at zero (their reference
/// level for factors).
pub fn plot_fitted_lines(
    model: &FittedModel,
    frame: &ModelFrame,
    x: &str,
    group: &str,
    path: &str,
    config: &PlotConfig,
) -> Result<()> {
    let x_values = continuous_values(frame, x)?;
    let slope = model
        .coefficient(x)
        .ok_or_else(|| {
            LinearModelError::InvalidInput(format!("'{}' is not a term of the model", x))
        })?
        .estimate;
    let (group_term, levels) = categorical_term(model, group)?;
    let intercept = model.estimates()[0];

    let lines: Vec<(f64, f64)> = levels
        .iter()
        .enumerate()
        .map(|(code, _)| {
            let shift = if code == 0 {
                0.0
            } else {
                model.estimates()[group_term.columns[code - 1]]
            };
            (intercept + shift, slope)
        })
        .collect();

    let response = frame.response();
    let (x_min, x_max) = padded_range(x_values.iter().copied());
    let (y_min, y_max) = padded_range(
        response.iter().copied().chain(
            lines
                .iter()
                .flat_map(|&(a, b)| [a + b * x_min, a + b * x_max]),
        ),
    );

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let title = config
        .title
        .clone()
        .unwrap_or_else(|| model.formula());

    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", config.font_size).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(config.x_label.as_deref().unwrap_or(x))
        .y_desc(config.y_label.as_deref().unwrap_or(frame.response_name()))
        .draw()
        .map_err(plot_err)?;

    let colors = config.palette.colors(levels.len());
    let color_of = |label: &str| {
        levels
            .iter()
            .position(|l| l == label)
            .map(|i| colors[i])
            .unwrap_or(BLACK)
    };
    let marker_of = |label: &str| Marker::nth(levels.iter().position(|l| l == label).unwrap_or(0));

    let observations = frame.observations();
    render_scatter(
        &mut chart,
        &observations,
        |i, obs| Some((x_values[i], obs.response)),
        |obs| label_of(frame, obs, group),
        color_of,
        marker_of,
    )?;

    for (i, &(a, b)) in lines.iter().enumerate() {
        render_fitted_line(&mut chart, a, b, colors[i])?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("wrote fitted-line plot to {}", path);
    Ok(())
}

/// Jittered points per categorical cell with the model's fitted cell means.
///
/// Cells are the levels of `group`, nested inside the levels of `batch`
/// when one is given. The model must consist of exactly these categorical
/// terms.
pub fn plot_group_means(
    model: &FittedModel,
    frame: &ModelFrame,
    group: &str,
    batch: Option<&str>,
    path: &str,
    config: &PlotConfig,
) -> Result<()> {
    let (_, group_levels) = categorical_term(model, group)?;
    let batch_levels: Vec<String> = match batch {
        Some(name) => categorical_term(model, name)?.1.to_vec(),
        None => vec![String::new()],
    };

    // One fitted mean per (batch, group) cell, in model term order.
    let mut cells: Vec<(String, String, f64)> = Vec::new();
    let mut rows: Vec<Vec<PredictorValue>> = Vec::new();
    for batch_level in &batch_levels {
        for group_level in group_levels {
            let row = model
                .layout()
                .terms()
                .iter()
                .filter(|t| t.kind != TermKind::Intercept)
                .map(|t| {
                    if t.name == group {
                        Ok(PredictorValue::Categorical(group_level.clone()))
                    } else if Some(t.name.as_str()) == batch {
                        Ok(PredictorValue::Categorical(batch_level.clone()))
                    } else {
                        Err(LinearModelError::InvalidInput(format!(
                            "term '{}' cannot be shown on a group-means plot",
                            t.name
                        )))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
            cells.push((batch_level.clone(), group_level.clone(), 0.0));
        }
    }
    let means = model.predict_values(&rows)?;
    for (cell, mean) in cells.iter_mut().zip(means.iter()) {
        cell.2 = *mean;
    }

    let stride = group_levels.len() + 1;
    let position_of = |batch_level: &str, group_level: &str| -> Option<f64> {
        let b = batch_levels.iter().position(|l| l == batch_level)?;
        let g = group_levels.iter().position(|l| l == group_level)?;
        Some((b * stride + g + 1) as f64)
    };

    let observations = frame.observations();
    let cell_key = |obs: &Observation| {
        let b = batch.map(|name| label_of(frame, obs, name)).unwrap_or_default();
        (b, label_of(frame, obs, group))
    };

    // Spread points of the same cell symmetrically around its position.
    let keys: Vec<(String, String)> = observations.iter().map(|o| cell_key(o)).collect();
    let jitter: Vec<f64> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let same: Vec<usize> = (0..keys.len()).filter(|&j| keys[j] == *key).collect();
            let rank = same.iter().position(|&j| j == i).unwrap_or(0) as f64;
            (rank - (same.len() as f64 - 1.0) / 2.0) * 0.08
        })
        .collect();

    let x_max = (batch_levels.len() * stride) as f64;
    let response = frame.response();
    let (y_min, y_max) = padded_range(
        response
            .iter()
            .copied()
            .chain(cells.iter().map(|c| c.2)),
    );

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let title = config
        .title
        .clone()
        .unwrap_or_else(|| model.formula());

    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", config.font_size).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)
        .map_err(plot_err)?;

    let tick_label = |x: &f64| -> String {
        cells
            .iter()
            .find(|(b, g, _)| {
                position_of(b, g).is_some_and(|p| (p - x).abs() < 1e-6)
            })
            .map(|(b, g, _)| {
                if b.is_empty() {
                    g.clone()
                } else {
                    format!("{}:{}", b, g)
                }
            })
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(batch_levels.len() * stride + 1)
        .x_label_formatter(&tick_label)
        .x_desc(config.x_label.as_deref().unwrap_or(group))
        .y_desc(config.y_label.as_deref().unwrap_or(frame.response_name()))
        .draw()
        .map_err(plot_err)?;

    let colors = config.palette.colors(group_levels.len());
    let color_of = |label: &str| {
        group_levels
            .iter()
            .position(|l| l == label)
            .map(|i| colors[i])
            .unwrap_or(BLACK)
    };
    let marker_of = |label: &str| {
        Marker::nth(group_levels.iter().position(|l| l == label).unwrap_or(0))
    };

    render_scatter(
        &mut chart,
        &observations,
        |i, obs| {
            let (b, g) = &keys[i];
            position_of(b, g).map(|x| (x + jitter[i], obs.response))
        },
        |obs| label_of(frame, obs, group),
        color_of,
        marker_of,
    )?;

    for (gi, group_level) in group_levels.iter().enumerate() {
        let (positions, values): (Vec<f64>, Vec<f64>) = cells
            .iter()
            .filter(|(_, g, _)| g == group_level)
            .filter_map(|(b, g, m)| position_of(b, g).map(|p| (p, *m)))
            .unzip();
        render_group_means(&mut chart, &positions, &values, colors[gi])?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("wrote group-means plot to {}", path);
    Ok(())
}
