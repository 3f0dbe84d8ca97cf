//! Staleness heuristic for spotting files that may no longer be used.
//!
//! Independent of heat scoring: it looks at one file's change stats in
//! isolation and never influences the score or the tree.

use crate::model::{DeadCodeCandidate, FileChangeStats};
use chrono::{DateTime, Months, Utc};
use std::collections::HashMap;

pub const STALE_MONTHS: u32 = 6;
pub const FEW_CHANGES_THRESHOLD: u32 = 3;
pub const SIGNALS_REQUIRED: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadCodeVerdict {
    /// No change in the last six months.
    pub stale: bool,
    pub few_changes: bool,
    pub single_author: bool,
}

impl DeadCodeVerdict {
    pub fn signal_count(&self) -> usize {
        [self.stale, self.few_changes, self.single_author]
            .iter()
            .filter(|s| **s)
            .count()
    }

    pub fn likely_dead(&self) -> bool {
        self.signal_count() >= SIGNALS_REQUIRED
    }

    pub fn signals(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.stale {
            out.push(format!("no changes in {STALE_MONTHS}+ months"));
        }
        if self.few_changes {
            out.push(format!("fewer than {FEW_CHANGES_THRESHOLD} changes"));
        }
        if self.single_author {
            out.push("single author".to_string());
        }
        out
    }
}

pub fn classify(stats: &FileChangeStats, now: DateTime<Utc>) -> DeadCodeVerdict {
    let cutoff = now.checked_sub_months(Months::new(STALE_MONTHS)).unwrap_or(now);
    DeadCodeVerdict {
        stale: stats.last_modified < cutoff,
        few_changes: stats.total_changes < FEW_CHANGES_THRESHOLD,
        single_author: stats.author_count() == 1,
    }
}

pub fn is_likely_dead_code(stats: &FileChangeStats, now: DateTime<Utc>) -> bool {
    classify(stats, now).likely_dead()
}

/// Files flagged by the heuristic, stalest first.
pub fn find_candidates(
    stats: &HashMap<String, FileChangeStats>,
    now: DateTime<Utc>,
) -> Vec<DeadCodeCandidate> {
    let mut candidates: Vec<DeadCodeCandidate> = stats
        .values()
        .filter_map(|fs| {
            let verdict = classify(fs, now);
            verdict.likely_dead().then(|| DeadCodeCandidate {
                path: fs.file_path.clone(),
                total_changes: fs.total_changes,
                authors: fs.author_count(),
                last_modified: fs.last_modified,
                signals: verdict.signals(),
            })
        })
        .collect();
    candidates.sort_by(|a, b| {
        a.last_modified
            .cmp(&b.last_modified)
            .then_with(|| a.path.cmp(&b.path))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
    }

    fn stats(path: &str, age_days: i64, changes: u32, authors: &[&str]) -> FileChangeStats {
        let at = now() - Duration::days(age_days);
        let mut fs = FileChangeStats::new(path.to_string(), at);
        for i in 0..changes {
            let author = authors[i as usize % authors.len()];
            fs.record_change(author, at, age_days);
        }
        fs
    }

    #[test]
    fn two_signals_are_enough() {
        // stale and single author, but plenty of changes
        let fs = stats("old/tool.rs", 300, 10, &["ana"]);
        let verdict = classify(&fs, now());
        assert_eq!(
            verdict,
            DeadCodeVerdict {
                stale: true,
                few_changes: false,
                single_author: true
            }
        );
        assert!(verdict.likely_dead());
    }

    #[test]
    fn one_signal_is_not_enough() {
        let fs = stats("src/main.rs", 2, 2, &["ana", "bo"]);
        assert!(!is_likely_dead_code(&fs, now()));
        // recent, two authors, two changes: only the low-count signal fires
        assert_eq!(classify(&fs, now()).signal_count(), 1);
    }

    #[test]
    fn recent_busy_shared_file_is_alive() {
        let fs = stats("src/lib.rs", 1, 12, &["ana", "bo", "cy"]);
        assert_eq!(classify(&fs, now()).signal_count(), 0);
    }

    #[test]
    fn candidates_are_sorted_stalest_first() {
        let input: HashMap<_, _> = [
            stats("a.rs", 250, 1, &["x"]),
            stats("b.rs", 400, 1, &["y"]),
            stats("c.rs", 3, 9, &["x", "y"]),
        ]
        .into_iter()
        .map(|s| (s.file_path.clone(), s))
        .collect();

        let found = find_candidates(&input, now());
        let paths: Vec<_> = found.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["b.rs", "a.rs"]);
        assert_eq!(found[0].signals.len(), 3);
    }
}
