use crate::cache::Cache;
use crate::cli::CommonArgs;
use crate::git::GitRepo;
use crate::history::{analyze_repository, load_stats_file};
use crate::model::AnalysisResult;
use anyhow::Context;
use chrono::Utc;
use tracing::info;

/// Produce the change stats for a run, from a stats file when one is given,
/// otherwise from the repository's history.
pub fn load_analysis(common: &CommonArgs, show_progress: bool) -> anyhow::Result<AnalysisResult> {
    if let Some(stats_path) = &common.from_stats {
        let file_stats = load_stats_file(stats_path)
            .with_context(|| format!("Failed to read stats file {}", stats_path.display()))?;
        info!(files = file_stats.len(), path = %stats_path.display(), "loaded change stats");
        return Ok(AnalysisResult {
            repository_path: stats_path.to_string_lossy().to_string(),
            branch: common.branch.clone().unwrap_or_default(),
            analyzed_at: Utc::now(),
            commit_count: 0,
            time_range_days: common.days,
            file_stats,
        });
    }

    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let mut cache = if common.no_cache {
        None
    } else {
        Some(Cache::new(common.cache.as_deref(), repo.path()).context("Failed to initialize cache")?)
    };

    analyze_repository(&repo, cache.as_mut(), &common.analyze_options(), show_progress)
}
