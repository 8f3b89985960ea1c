//! The two toy datasets used by the demos.

use crate::error::Result;
use crate::types::ModelFrame;

/// Mouse size against weight for control and mutant genotypes.
///
/// Fitting `Size ~ Type + Weight` gives two parallel lines, one per genotype.
pub fn weight_genotype() -> Result<ModelFrame> {
    ModelFrame::builder(
        "Size",
        vec![4.75, 7.50, 7.25, 9.25, 7.00, 8.25, 9.75, 12.00],
    )
    .categorical(
        "Type",
        &[
            "Control", "Control", "Control", "Control", "Mutant", "Mutant", "Mutant", "Mutant",
        ],
    )
    .continuous(
        "Weight",
        vec![67.2, 98.0, 123.2, 137.2, 47.6, 78.4, 89.6, 109.2],
    )
    .build()
}

/// Gene expression of control and mutant samples measured in two labs.
///
/// Fitting `Gene_Expression ~ Lab + Type` removes the batch (lab) effect
/// before testing the genotype effect.
pub fn batch_effect() -> Result<ModelFrame> {
    ModelFrame::builder(
        "Gene_Expression",
        vec![1.7, 2.0, 2.2, 3.1, 3.6, 3.9, 0.9, 1.2, 1.9, 1.8, 2.2, 2.9],
    )
    .categorical("Lab", &["A", "A", "A", "A", "A", "A", "B", "B", "B", "B", "B", "B"])
    .categorical(
        "Type",
        &[
            "Control", "Control", "Control", "Mutant", "Mutant", "Mutant", "Control", "Control",
            "Control", "Mutant", "Mutant", "Mutant",
        ],
    )
    .build()
}
