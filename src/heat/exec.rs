use super::{
    find_candidates, load_analysis, output_dead_json, output_dead_ndjson, output_dead_table, output_json,
    output_ndjson, output_table, HeatCalculator,
};
use crate::cli::CommonArgs;
use console::Term;
use std::time::Instant;

pub fn exec(common: CommonArgs, json: bool, ndjson: bool, limit: usize) -> anyhow::Result<()> {
    let started = Instant::now();
    // keep machine-readable output free of spinners
    let show_progress = !(json || ndjson) && Term::stderr().is_term();
    let analysis = load_analysis(&common, show_progress)?;

    let calculator = HeatCalculator::new(common.scoring_config());
    let scores = calculator.compute_heat_scores(&analysis.file_stats);

    if json {
        output_json(&scores, &analysis, started.elapsed())?;
    } else if ndjson {
        output_ndjson(&scores)?;
    } else {
        output_table(&scores, &analysis, limit)?;
    }

    Ok(())
}

pub fn exec_dead(common: CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let show_progress = !(json || ndjson) && Term::stderr().is_term();
    let analysis = load_analysis(&common, show_progress)?;

    let candidates = find_candidates(&analysis.file_stats, analysis.analyzed_at);

    if json {
        output_dead_json(&candidates, &analysis)?;
    } else if ndjson {
        output_dead_ndjson(&candidates)?;
    } else {
        output_dead_table(&candidates, &analysis)?;
    }

    Ok(())
}
