//! Fit `Size ~ Type + Weight` and draw one fitted line per genotype.
//!
//! Run with `cargo run --example weight_genotype --features plotting`.

use lmdesign::datasets::weight_genotype;
use lmdesign::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Weight / Genotype Regression");
    println!("============================");

    let frame = weight_genotype()?;
    let model = LinearModel::new(ModelConfig::default());

    let design = model.design_matrix(&frame)?;
    println!("Design matrix columns: {:?}", design.column_names());
    println!("{:.2}", design.matrix());
    println!();

    let fitted = model.fit(&frame)?;
    println!("{}", fitted);

    // Both genotypes share the Weight slope; the Mutant line is shifted
    // by the TypeMutant coefficient.
    let mutant = fitted
        .coefficient("TypeMutant")
        .ok_or("missing TypeMutant coefficient")?;
    println!(
        "Mutants are {:.3} larger at equal weight (p = {:.4})",
        mutant.estimate, mutant.p_value
    );

    let path = std::env::temp_dir().join("weight_genotype.png");
    let config = PlotConfig {
        title: Some("Size ~ Type + Weight".to_string()),
        ..PlotConfig::default()
    };
    plot_fitted_lines(
        &fitted,
        &frame,
        "Weight",
        "Type",
        &path.to_string_lossy(),
        &config,
    )?;
    println!("Plot written to {}", path.display());

    Ok(())
}
