use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_TIME_RANGE_DAYS: u32 = 180;

/// Change observations for a single path inside the analysis window.
///
/// `total_changes` is expected to equal the sum of `changes_by_day` values and
/// the sum of `unique_authors` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChangeStats {
    pub file_path: String,
    pub total_changes: u32,
    pub last_modified: DateTime<Utc>,
    pub first_seen: DateTime<Utc>,
    /// Days-before-now offset -> changes recorded on that day.
    pub changes_by_day: HashMap<i64, u32>,
    /// Author name -> commits by that author touching the file.
    pub unique_authors: HashMap<String, u32>,
}

impl FileChangeStats {
    pub fn new(file_path: String, seen_at: DateTime<Utc>) -> Self {
        Self {
            file_path,
            total_changes: 0,
            last_modified: seen_at,
            first_seen: seen_at,
            changes_by_day: HashMap::new(),
            unique_authors: HashMap::new(),
        }
    }

    pub fn record_change(&mut self, author: &str, timestamp: DateTime<Utc>, day_offset: i64) {
        self.total_changes += 1;
        if timestamp > self.last_modified {
            self.last_modified = timestamp;
        }
        if timestamp < self.first_seen {
            self.first_seen = timestamp;
        }
        *self.changes_by_day.entry(day_offset).or_insert(0) += 1;
        *self.unique_authors.entry(author.to_string()).or_insert(0) += 1;
    }

    pub fn author_count(&self) -> usize {
        self.unique_authors.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatScore {
    pub path: String,
    /// 0-100, relative to the hottest file of the same batch.
    pub score: f64,
    /// Changes per week since the last edit.
    pub change_frequency: f64,
    pub days_since_edit: i64,
    pub total_file_changes: u32,
}

impl HeatScore {
    /// Placeholder score for a folder, filled in by aggregation.
    pub fn folder(path: &str) -> Self {
        Self {
            path: path.to_string(),
            score: 0.0,
            change_frequency: 0.0,
            days_since_edit: 0,
            total_file_changes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Folder,
}

/// Reserved for function-level breakdowns; files always carry an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub size: u64,
    pub lines_of_code: u64,
    pub file_count: usize,
    pub last_modified: Option<DateTime<Utc>>,
    pub heat_score: Option<HeatScore>,
    /// `Some(empty)` on files, `None` on folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionNode>>,
    pub children: Vec<FileNode>,
}

impl FileNode {
    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }

    pub fn is_folder(&self) -> bool {
        self.node_type == NodeType::Folder
    }

    pub fn score(&self) -> f64 {
        self.heat_score.as_ref().map(|h| h.score).unwrap_or(0.0)
    }

    pub fn total_file_changes(&self) -> u32 {
        self.heat_score
            .as_ref()
            .map(|h| h.total_file_changes)
            .unwrap_or(0)
    }

    /// Depth-first iterator over this node and every descendant.
    pub fn walk(&self) -> impl Iterator<Item = &FileNode> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub branch: Option<String>,
    pub time_range_days: u32,
    pub include_merges: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            branch: None,
            time_range_days: DEFAULT_TIME_RANGE_DAYS,
            include_merges: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub repository_path: String,
    pub branch: String,
    pub analyzed_at: DateTime<Utc>,
    pub commit_count: usize,
    pub time_range_days: u32,
    pub file_stats: HashMap<String, FileChangeStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub parent_ids: Vec<String>,
}

/// A commit together with the paths its diff touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitChanges {
    pub info: CommitInfo,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoresOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub branch: String,
    pub time_range_days: u32,
    pub commit_count: usize,
    pub analyzed_files: usize,
    pub duration: String,
    pub scores: Vec<HeatScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub branch: String,
    pub time_range_days: u32,
    pub commit_count: usize,
    pub analyzed_files: usize,
    pub duration: String,
    pub tree: FileNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadCodeOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub branch: String,
    pub time_range_days: u32,
    pub analyzed_files: usize,
    pub candidates: Vec<DeadCodeCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadCodeCandidate {
    pub path: String,
    pub total_changes: u32,
    pub authors: usize,
    pub last_modified: DateTime<Utc>,
    pub signals: Vec<String>,
}

/// Open-ended analysis window; `None` keeps every commit.
#[derive(Debug, Clone, Default)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open-ended window starting `days` days before `now`.
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Self {
        Self::new().with_since(now - Duration::days(i64::from(days)))
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| *timestamp >= since)
    }
}
