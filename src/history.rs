//! Turns git history (or a stats file produced elsewhere) into the per-file
//! change stats the heat scorer consumes.

use crate::cache::Cache;
use crate::error::Result;
use crate::git::GitRepo;
use crate::model::{AnalysisResult, AnalyzeOptions, CommitChanges, DateRange, FileChangeStats};
use crate::util::days_between;
use anyhow::Context;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Fold commit changes into one stats entry per path.
pub fn accumulate(commits: &[CommitChanges], now: DateTime<Utc>) -> HashMap<String, FileChangeStats> {
    let mut file_stats: HashMap<String, FileChangeStats> = HashMap::new();

    for commit in commits {
        let timestamp = commit.info.timestamp;
        let day_offset = days_between(&now, &timestamp);
        for path in &commit.paths {
            file_stats
                .entry(path.clone())
                .or_insert_with(|| FileChangeStats::new(path.clone(), timestamp))
                .record_change(&commit.info.author_name, timestamp, day_offset);
        }
    }

    file_stats
}

/// Commits in `range` with their changed paths, diffing only those the
/// cache has not seen.
pub fn fetch_commit_changes(
    repo: &GitRepo,
    cache: Option<&mut Cache>,
    tip: gix::ObjectId,
    range: &DateRange,
    include_merges: bool,
    show_progress: bool,
) -> anyhow::Result<Vec<CommitChanges>> {
    let pb = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} ({pos})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Walking commits...");
        pb
    } else {
        ProgressBar::hidden()
    };

    let infos = repo
        .walk_commits(tip, range, include_merges, &pb)
        .context("Failed to walk commit history")?;

    pb.set_message("Diffing commits...");
    let mut changes = Vec::with_capacity(infos.len());
    let mut missing = Vec::new();

    for info in infos {
        let cached = match cache.as_deref() {
            Some(cache) => cache
                .get_commit(&info.id)
                .context("Failed to read commit cache")?,
            None => None,
        };
        match cached {
            Some(hit) => changes.push(hit),
            None => {
                let paths = repo
                    .changed_paths(&info)
                    .with_context(|| format!("Failed to diff commit {}", info.id))?;
                missing.push(CommitChanges { info, paths });
            }
        }
    }

    debug!(cached = changes.len(), diffed = missing.len(), "resolved commit changes");

    if let Some(cache) = cache {
        if !missing.is_empty() {
            cache
                .store_commits(&missing)
                .context("Failed to store commits in cache")?;
        }
    }
    changes.extend(missing);

    pb.finish_and_clear();
    Ok(changes)
}

/// Run the git side of an analysis: resolve the branch, collect the window's
/// commits and fold them into file stats.
pub fn analyze_repository(
    repo: &GitRepo,
    cache: Option<&mut Cache>,
    opts: &AnalyzeOptions,
    show_progress: bool,
) -> anyhow::Result<AnalysisResult> {
    let now = Utc::now();
    let (branch, tip) = repo
        .resolve_tip(opts.branch.as_deref())
        .context("Failed to resolve branch")?;
    let range = DateRange::last_days(opts.time_range_days, now);
    info!(
        branch = %branch,
        days = opts.time_range_days,
        repo = %repo.path().display(),
        "analyzing repository"
    );

    let commits = fetch_commit_changes(repo, cache, tip, &range, opts.include_merges, show_progress)?;
    let file_stats = accumulate(&commits, now);
    info!(commits = commits.len(), files = file_stats.len(), "collected change stats");

    Ok(AnalysisResult {
        repository_path: repo.path().to_string_lossy().to_string(),
        branch,
        analyzed_at: now,
        commit_count: commits.len(),
        time_range_days: opts.time_range_days,
        file_stats,
    })
}

/// Load a `path -> FileChangeStats` JSON object produced by an external
/// history provider.
pub fn load_stats_file(path: &Path) -> Result<HashMap<String, FileChangeStats>> {
    let raw = std::fs::read_to_string(path)?;
    let mut stats: HashMap<String, FileChangeStats> = serde_json::from_str(&raw)?;
    // the map key is authoritative
    for (key, fs) in stats.iter_mut() {
        if fs.file_path != *key {
            fs.file_path = key.clone();
        }
    }
    Ok(stats)
}
