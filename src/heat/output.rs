use crate::model::{AnalysisResult, DeadCodeCandidate, DeadCodeOutput, HeatScore, ScoresOutput, SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use console::style;
use std::time::Duration;

/// Elapsed time rounded to milliseconds, e.g. `1s 250ms`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(elapsed.as_millis() as u64);
    humantime::format_duration(millis).to_string()
}

pub fn output_json(scores: &[HeatScore], analysis: &AnalysisResult, elapsed: Duration) -> Result<()> {
    let output = ScoresOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: analysis.repository_path.clone(),
        branch: analysis.branch.clone(),
        time_range_days: analysis.time_range_days,
        commit_count: analysis.commit_count,
        analyzed_files: scores.len(),
        duration: format_elapsed(elapsed),
        scores: scores.to_vec(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn output_ndjson(scores: &[HeatScore]) -> Result<()> {
    for score in scores {
        println!("{}", serde_json::to_string(score)?);
    }
    Ok(())
}

pub fn heat_bar(score: f64) -> &'static str {
    match (score / 20.0) as u32 {
        0 if score < 1.0 => " ",
        0 => "▁",
        1 => "▃",
        2 => "▅",
        3 => "▇",
        _ => "█",
    }
}

pub fn output_table(scores: &[HeatScore], analysis: &AnalysisResult, limit: usize) -> Result<()> {
    if scores.is_empty() {
        println!("No changes in the last {} days", analysis.time_range_days);
        return Ok(());
    }

    println!(
        "{} {} ({} commits, last {} days)",
        style("Code heat for").bold(),
        analysis.repository_path,
        analysis.commit_count,
        analysis.time_range_days
    );
    println!(
        "{:<50} {:>7}   {:>8} {:>9} {:>6}",
        style("Path").bold(),
        style("Score").bold(),
        style("Changes").bold(),
        style("Per week").bold(),
        style("Idle").bold()
    );
    println!("{}", "─".repeat(88));
    for s in scores.iter().take(limit) {
        println!(
            "{:<50} {:>7.1} {} {:>8} {:>9.2} {:>5}d",
            s.path,
            s.score,
            style(heat_bar(s.score)).red(),
            s.total_file_changes,
            s.change_frequency,
            s.days_since_edit
        );
    }
    if scores.len() > limit {
        println!("\n... and {} more files", scores.len() - limit);
    }
    Ok(())
}

pub fn output_dead_json(candidates: &[DeadCodeCandidate], analysis: &AnalysisResult) -> Result<()> {
    let output = DeadCodeOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: analysis.repository_path.clone(),
        branch: analysis.branch.clone(),
        time_range_days: analysis.time_range_days,
        analyzed_files: analysis.file_stats.len(),
        candidates: candidates.to_vec(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn output_dead_ndjson(candidates: &[DeadCodeCandidate]) -> Result<()> {
    for c in candidates {
        println!("{}", serde_json::to_string(c)?);
    }
    Ok(())
}

pub fn output_dead_table(candidates: &[DeadCodeCandidate], analysis: &AnalysisResult) -> Result<()> {
    if candidates.is_empty() {
        println!(
            "No dead code candidates among {} files",
            analysis.file_stats.len()
        );
        return Ok(());
    }

    println!(
        "{:<50} {:>8} {:>8} {:>12}  {}",
        style("Path").bold(),
        style("Changes").bold(),
        style("Authors").bold(),
        style("Last change").bold(),
        style("Signals").bold()
    );
    println!("{}", "─".repeat(110));
    for c in candidates {
        println!(
            "{:<50} {:>8} {:>8} {:>12}  {}",
            c.path,
            c.total_changes,
            c.authors,
            c.last_modified.format("%Y-%m-%d"),
            style(c.signals.join(", ")).yellow()
        );
    }
    Ok(())
}
