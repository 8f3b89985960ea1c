//! Integration tests for lmdesign.

use approx::assert_relative_eq;
use lmdesign::datasets::{batch_effect, weight_genotype};
use lmdesign::prelude::*;
use ndarray::array;

#[test]
fn test_weight_genotype_design_matrix() {
    let frame = weight_genotype().unwrap();
    let design = build_design_matrix(&frame, &LevelOrdering::Alphabetical).unwrap();

    assert_eq!(design.column_names(), &["(Intercept)", "TypeMutant", "Weight"]);
    assert_eq!(design.nrows(), 8);
    assert_eq!(
        design.matrix().column(1),
        array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]
    );
    assert_eq!(
        design.matrix().column(2),
        array![67.2, 98.0, 123.2, 137.2, 47.6, 78.4, 89.6, 109.2]
    );
}

#[test]
fn test_weight_genotype_fit() {
    let frame = weight_genotype().unwrap();
    let model = lm(&frame).unwrap();

    assert_eq!(model.n_obs(), 8);
    assert_eq!(model.n_params(), 3);
    assert_eq!(model.df_residual(), 5);

    let intercept = model.coefficient("(Intercept)").unwrap();
    assert_relative_eq!(intercept.estimate, 0.201298701299, epsilon = 1e-8);
    assert_relative_eq!(intercept.std_error, 1.318591871918, epsilon = 1e-8);
    assert_relative_eq!(intercept.t_value, 0.1526618703, epsilon = 1e-6);
    assert_relative_eq!(intercept.p_value, 0.88463429902, epsilon = 1e-6);

    let mutant = model.coefficient("TypeMutant").unwrap();
    assert_relative_eq!(mutant.estimate, 3.717126623377, epsilon = 1e-8);
    assert_relative_eq!(mutant.std_error, 0.650574156789, epsilon = 1e-8);
    assert_relative_eq!(mutant.t_value, 5.7136094088, epsilon = 1e-6);
    assert_relative_eq!(mutant.p_value, 0.0022952337354, epsilon = 1e-7);

    let weight = model.coefficient("Weight").unwrap();
    assert_relative_eq!(weight.estimate, 0.065659786642, epsilon = 1e-9);
    assert_relative_eq!(weight.std_error, 0.011780506833, epsilon = 1e-9);
    assert_relative_eq!(weight.t_value, 5.5735960748, epsilon = 1e-6);
    assert_relative_eq!(weight.p_value, 0.0025609777494, epsilon = 1e-7);

    assert_relative_eq!(model.sigma(), 0.8186765729937747, epsilon = 1e-9);
    assert_relative_eq!(model.r_squared(), 0.8974544461037408, epsilon = 1e-9);
    assert_relative_eq!(model.adj_r_squared(), 0.8564362245452372, epsilon = 1e-9);
    assert_relative_eq!(model.f_statistic(), 21.87940900420842, epsilon = 1e-7);
    assert_relative_eq!(model.f_p_value(), 0.003367379689754462, epsilon = 1e-7);
}

#[test]
fn test_weight_genotype_confidence_intervals() {
    let frame = weight_genotype().unwrap();
    let model = lm(&frame).unwrap();

    // t_{0.975, 5} = 2.5705818...
    let weight = model.coefficient("Weight").unwrap();
    let half_width = 2.5705818356363124 * 0.011780506833;
    assert_relative_eq!(weight.ci_lower, 0.065659786642 - half_width, epsilon = 1e-5);
    assert_relative_eq!(weight.ci_upper, 0.065659786642 + half_width, epsilon = 1e-5);
}

#[test]
fn test_batch_effect_fit() {
    let frame = batch_effect().unwrap();
    let model = lm(&frame).unwrap();

    assert_eq!(model.coefficient_names(), &["(Intercept)", "LabB", "TypeMutant"]);
    assert_eq!(model.n_obs(), 12);
    assert_eq!(model.df_residual(), 9);

    let beta = model.estimates();
    assert_relative_eq!(beta[0], 2.116666666667, epsilon = 1e-9);
    assert_relative_eq!(beta[1], -0.933333333333, epsilon = 1e-9);
    assert_relative_eq!(beta[2], 1.266666666667, epsilon = 1e-9);

    let se = model.std_errors();
    assert_relative_eq!(se[0], 0.227913238853, epsilon = 1e-9);
    assert_relative_eq!(se[1], 0.263171539607, epsilon = 1e-9);
    assert_relative_eq!(se[2], 0.263171539607, epsilon = 1e-9);

    let p = model.p_values();
    assert_relative_eq!(p[0], 6.5987398173e-06, epsilon = 1e-9);
    assert_relative_eq!(p[1], 6.2502519634e-03, epsilon = 1e-7);
    assert_relative_eq!(p[2], 9.5613523186e-04, epsilon = 1e-7);

    assert_relative_eq!(model.r_squared(), 0.7988526353531733, epsilon = 1e-9);
}

#[test]
fn test_intercept_column_is_constant() {
    for frame in [weight_genotype().unwrap(), batch_effect().unwrap()] {
        let design = build_design_matrix(&frame, &LevelOrdering::Alphabetical).unwrap();
        assert!(design.matrix().column(0).iter().all(|&v| v == 1.0));
    }
}

#[test]
fn test_indicator_columns_per_factor() {
    let frame = batch_effect().unwrap();
    let design = build_design_matrix(&frame, &LevelOrdering::Alphabetical).unwrap();
    let m = design.matrix();

    for predictor in frame.predictors() {
        let Predictor::Categorical { name, values } = predictor else {
            continue;
        };
        let columns = design.term_columns(name).unwrap();
        let factor = Factor::new(name.clone(), values, &LevelOrdering::Alphabetical).unwrap();
        assert_eq!(columns.len(), factor.n_levels() - 1);

        for (i, &code) in factor.codes().iter().enumerate() {
            let active: f64 = columns.iter().map(|&j| m[[i, j]]).sum();
            if code == 0 {
                assert_eq!(active, 0.0);
            } else {
                assert_eq!(active, 1.0);
                assert_eq!(m[[i, columns[code - 1]]], 1.0);
            }
        }
    }
}

#[test]
fn test_fitted_plus_residuals_round_trip() {
    for frame in [weight_genotype().unwrap(), batch_effect().unwrap()] {
        let model = lm(&frame).unwrap();
        let rebuilt = &model.fitted_values() + &model.residuals();
        for (a, b) in rebuilt.iter().zip(frame.response().iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_refit_is_deterministic() {
    let frame = weight_genotype().unwrap();
    let model = LinearModel::default();
    let first = model.fit(&frame).unwrap();
    let second = model.fit(&frame).unwrap();
    assert_eq!(first.estimates(), second.estimates());
    assert_eq!(first.std_errors(), second.std_errors());
}

#[test]
fn test_fit_ols_on_prebuilt_design() {
    let frame = weight_genotype().unwrap();
    let design = build_design_matrix(&frame, &LevelOrdering::Alphabetical).unwrap();
    let model = fit_ols(&design, &frame.response(), &ModelConfig::default()).unwrap();
    assert_eq!(model.df_residual(), 5);
    assert_relative_eq!(model.estimates()[1], 3.717126623377, epsilon = 1e-8);
}

#[test]
fn test_single_level_factor_fails_before_fitting() {
    let frame = ModelFrame::builder("Size", vec![4.75, 7.5, 7.25, 9.25])
        .categorical("Type", &["Control", "Control", "Control", "Control"])
        .continuous("Weight", vec![67.2, 98.0, 123.2, 137.2])
        .build()
        .unwrap();

    let err = lm(&frame).unwrap_err();
    assert!(matches!(err, LinearModelError::InvalidFactor { ref name, .. } if name == "Type"));
}

#[test]
fn test_confounded_factors_are_collinear() {
    let lab = ["A", "A", "A", "A", "A", "A", "B", "B", "B", "B", "B", "B"];
    let site = ["x", "x", "x", "x", "x", "x", "y", "y", "y", "y", "y", "y"];
    let frame = ModelFrame::builder(
        "Gene_Expression",
        vec![1.7, 2.0, 2.2, 3.1, 3.6, 3.9, 0.9, 1.2, 1.9, 1.8, 2.2, 2.9],
    )
    .categorical("Lab", &lab)
    .categorical("Site", &site)
    .build()
    .unwrap();

    let err = lm(&frame).unwrap_err();
    assert_eq!(
        err,
        LinearModelError::CollinearPredictors {
            column: "Sitey".to_string()
        }
    );
}

fn weight_frame_with(size: impl Fn(f64) -> f64, weight_scale: f64) -> ModelFrame {
    let size: Vec<f64> = [4.75, 7.50, 7.25, 9.25, 7.00, 8.25, 9.75, 12.00]
        .iter()
        .map(|&v| size(v))
        .collect();
    let weight: Vec<f64> = [67.2, 98.0, 123.2, 137.2, 47.6, 78.4, 89.6, 109.2]
        .iter()
        .map(|w| w * weight_scale)
        .collect();
    let types = [
        "Control", "Control", "Control", "Control", "Mutant", "Mutant", "Mutant", "Mutant",
    ];
    ModelFrame::builder("Size", size)
        .categorical("Type", &types)
        .continuous("Weight", weight)
        .build()
        .unwrap()
}

#[test]
fn test_rescaled_predictor_is_not_collinear() {
    let frame = weight_frame_with(|v| v, 1e10);
    let model = lm(&frame).unwrap();

    let weight = model.coefficient("Weight").unwrap();
    assert_relative_eq!(weight.estimate, 0.065659786642e-10, max_relative = 1e-6);
    assert_relative_eq!(weight.p_value, 0.0025609777494, max_relative = 1e-4);
    let mutant = model.coefficient("TypeMutant").unwrap();
    assert_relative_eq!(mutant.estimate, 3.717126623377, max_relative = 1e-6);
    assert_relative_eq!(mutant.p_value, 0.0022952337354, max_relative = 1e-4);
}

#[test]
fn test_offset_response_keeps_t_tests() {
    // Residuals of order 1e-3 on a response of order 1e9.
    let frame = weight_frame_with(|v| 1e9 + 1e-3 * v, 1.0);
    let model = lm(&frame).unwrap();

    assert!(model.sigma() > 0.0);
    assert_relative_eq!(model.sigma(), 0.8186765729937747e-3, max_relative = 1e-2);
    assert!(model.p_values().iter().all(|p| p.is_finite()));
    let mutant = model.coefficient("TypeMutant").unwrap();
    assert_relative_eq!(mutant.p_value, 0.0022952337354, max_relative = 0.1);
}

#[test]
fn test_underdetermined_model() {
    let frame = ModelFrame::builder("y", vec![1.0, 2.0, 3.0])
        .categorical("g", &["a", "b", "a"])
        .continuous("x", vec![1.0, 5.0, 2.0])
        .build()
        .unwrap();
    assert_eq!(
        lm(&frame).unwrap_err(),
        LinearModelError::UnderdeterminedModel {
            observations: 3,
            parameters: 3,
        }
    );
}

#[test]
fn test_explicit_reference_flips_genotype_effect() {
    let frame = weight_genotype().unwrap();
    let config = ModelConfig::default()
        .with_level_ordering(LevelOrdering::explicit("Type", &["Mutant", "Control"]));
    let model = LinearModel::new(config).fit(&frame).unwrap();

    assert_eq!(model.coefficient_names(), &["(Intercept)", "TypeControl", "Weight"]);
    let control = model.coefficient("TypeControl").unwrap();
    assert_relative_eq!(control.estimate, -3.717126623377, epsilon = 1e-8);
    assert_relative_eq!(control.p_value, 0.0022952337354, epsilon = 1e-7);
    // The slope does not depend on the reference level.
    assert_relative_eq!(
        model.coefficient("Weight").unwrap().estimate,
        0.065659786642,
        epsilon = 1e-9
    );
}

#[test]
fn test_predict_new_observations() {
    let frame = weight_genotype().unwrap();
    let model = lm(&frame).unwrap();

    let preds = model
        .predict_values(&[
            vec!["Control".into(), PredictorValue::Continuous(100.0)],
            vec!["Mutant".into(), PredictorValue::Continuous(100.0)],
        ])
        .unwrap();
    assert_relative_eq!(
        preds[0],
        0.201298701299 + 0.065659786642 * 100.0,
        epsilon = 1e-7
    );
    assert_relative_eq!(preds[1] - preds[0], 3.717126623377, epsilon = 1e-8);

    // Predicting the training observations reproduces the fitted values.
    let in_sample = model.predict_observations(&frame.observations()).unwrap();
    for (a, b) in in_sample.iter().zip(model.fitted_values().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-10);
    }
}

#[test]
fn test_json_round_trip() {
    let frame = batch_effect().unwrap();
    let model = lm(&frame).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    model.to_json_file(path.to_str().unwrap()).unwrap();
    let loaded = FittedModel::from_json_file(path.to_str().unwrap()).unwrap();

    assert_eq!(loaded.coefficient_names(), model.coefficient_names());
    for (a, b) in loaded.estimates().iter().zip(model.estimates().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
    assert_eq!(loaded.df_residual(), 9);
    assert_eq!(loaded.formula(), "Gene_Expression ~ Lab + Type");
}

#[test]
fn test_json_round_trip_perfect_fit() {
    let frame = ModelFrame::builder("y", vec![1.0, 3.0, 5.0, 7.0])
        .continuous("x", vec![0.0, 1.0, 2.0, 3.0])
        .build()
        .unwrap();
    let model = lm(&frame).unwrap();
    assert!(model.t_values().iter().all(|t| t.is_nan()));

    let json = model.to_json().unwrap();
    let loaded = FittedModel::from_json(&json).unwrap();
    assert!(loaded.p_values().iter().all(|p| p.is_nan()));
}

#[test]
fn test_summary_mentions_every_coefficient() {
    let frame = weight_genotype().unwrap();
    let model = lm(&frame).unwrap();
    let text = model.to_string();

    assert!(text.starts_with("Call: Size ~ Type + Weight"));
    for name in model.coefficient_names() {
        assert!(text.contains(name.as_str()));
    }
    assert!(text.contains("on 5 degrees of freedom"));
    assert!(text.contains("on 2 and 5 DF"));
}
