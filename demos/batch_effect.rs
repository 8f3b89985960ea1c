//! Fit `Gene_Expression ~ Lab + Type` to separate a lab batch effect from
//! the genotype effect, then plot the fitted cell means.
//!
//! Run with `cargo run --example batch_effect --features plotting`.

use lmdesign::datasets::batch_effect;
use lmdesign::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Batch Effect Regression");
    println!("=======================");

    let frame = batch_effect()?;
    let model = LinearModel::new(ModelConfig::default());

    let design = model.design_matrix(&frame)?;
    println!("Design matrix columns: {:?}", design.column_names());
    println!("{}", design.matrix());
    println!();

    let fitted = model.fit(&frame)?;
    println!("{}", fitted);

    for name in ["LabB", "TypeMutant"] {
        let coef = fitted.coefficient(name).ok_or("missing coefficient")?;
        println!(
            "{:<12} {:>8.4} [{:.4}, {:.4}]",
            coef.name, coef.estimate, coef.ci_lower, coef.ci_upper
        );
    }

    let path = std::env::temp_dir().join("batch_effect.png");
    let config = PlotConfig {
        title: Some("Gene_Expression ~ Lab + Type".to_string()),
        x_label: Some("Lab:Type".to_string()),
        palette: ColorPalette::ColorBlind,
        ..PlotConfig::default()
    };
    plot_group_means(
        &fitted,
        &frame,
        "Type",
        Some("Lab"),
        &path.to_string_lossy(),
        &config,
    )?;
    println!("Plot written to {}", path.display());

    Ok(())
}
