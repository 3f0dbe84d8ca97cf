use super::{build_tree, output_json, output_tree};
use crate::cli::CommonArgs;
use crate::heat::{load_analysis, HeatCalculator};
use anyhow::Context;
use console::Term;
use std::time::Instant;

pub fn exec(common: CommonArgs, json: bool, depth: Option<usize>) -> anyhow::Result<()> {
    let started = Instant::now();
    let show_progress = !json && Term::stderr().is_term();
    let analysis = load_analysis(&common, show_progress)?;

    let scores = HeatCalculator::new(common.scoring_config()).compute_heat_scores(&analysis.file_stats);
    let tree = build_tree(&scores, &analysis.file_stats).context("Failed to build heat tree")?;

    if json {
        output_json(tree, &analysis, started.elapsed())?;
    } else {
        output_tree(&tree, depth)?;
    }

    Ok(())
}
