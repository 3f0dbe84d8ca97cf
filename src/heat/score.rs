use crate::model::{FileChangeStats, HeatScore};
use crate::util::days_between;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub const DECAY_RATE: f64 = 0.01;
pub const AUTHOR_BONUS_STEP: f64 = 0.1;
pub const AUTHOR_BONUS_CAP: f64 = 0.5;
pub const MIN_SCORE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Exponential decay per day of age applied to each change.
    pub decay_rate: f64,
    pub author_bonus_step: f64,
    pub author_bonus_cap: f64,
    /// Score every file gets when nothing in the batch changed.
    pub min_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            decay_rate: DECAY_RATE,
            author_bonus_step: AUTHOR_BONUS_STEP,
            author_bonus_cap: AUTHOR_BONUS_CAP,
            min_score: MIN_SCORE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeatCalculator {
    config: ScoringConfig,
}

impl HeatCalculator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score every file in the batch against the hottest one.
    ///
    /// Results come back hottest first, ties broken by path.
    pub fn compute_heat_scores(&self, stats: &HashMap<String, FileChangeStats>) -> Vec<HeatScore> {
        self.compute_heat_scores_at(stats, Utc::now())
    }

    pub fn compute_heat_scores_at(
        &self,
        stats: &HashMap<String, FileChangeStats>,
        now: DateTime<Utc>,
    ) -> Vec<HeatScore> {
        let raw_scores: Vec<(&String, &FileChangeStats, f64)> = stats
            .iter()
            .map(|(path, fs)| (path, fs, self.raw_score(fs)))
            .collect();

        let max_raw = raw_scores
            .iter()
            .map(|(_, _, raw)| *raw)
            .fold(0.0_f64, f64::max);
        debug!(files = raw_scores.len(), max_raw, "computed raw heat scores");

        let mut scores: Vec<HeatScore> = raw_scores
            .into_iter()
            .map(|(path, fs, raw)| {
                let score = if max_raw > 0.0 {
                    raw / max_raw * 100.0
                } else {
                    self.config.min_score
                };
                let days_since_edit = days_between(&now, &fs.last_modified).max(0);
                HeatScore {
                    path: path.clone(),
                    score,
                    change_frequency: change_frequency(fs.total_changes, days_since_edit),
                    days_since_edit,
                    total_file_changes: fs.total_changes,
                }
            })
            .collect();

        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        scores
    }

    /// Decay-weighted change count boosted by author diversity.
    pub fn raw_score(&self, fs: &FileChangeStats) -> f64 {
        let decayed: f64 = fs
            .changes_by_day
            .iter()
            .map(|(&day_offset, &count)| f64::from(count) * self.time_decay(day_offset))
            .sum();
        decayed * (1.0 + self.author_bonus(fs.author_count()))
    }

    pub fn time_decay(&self, day_offset: i64) -> f64 {
        (-self.config.decay_rate * day_offset as f64).exp()
    }

    pub fn author_bonus(&self, unique_authors: usize) -> f64 {
        (unique_authors as f64 * self.config.author_bonus_step).min(self.config.author_bonus_cap)
    }
}

/// Changes per week since the last edit; zero for files edited today.
pub fn change_frequency(total_changes: u32, days_since_edit: i64) -> f64 {
    if days_since_edit <= 0 {
        return 0.0;
    }
    let weeks = days_since_edit as f64 / 7.0;
    f64::from(total_changes) / weeks
}

pub fn compute_heat_scores(stats: &HashMap<String, FileChangeStats>) -> Vec<HeatScore> {
    HeatCalculator::default().compute_heat_scores(stats)
}
