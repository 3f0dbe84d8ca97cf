use crate::error::{FiresightError, Result};
use crate::model::{FileChangeStats, FileNode, HeatScore, NodeType};
use crate::util::{extension, node_id, path_segments};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// `node_id` never yields a `/`, so no real node can share this id.
pub const ROOT_ID: &str = "/";
pub const ROOT_NAME: &str = "root";

const ROOT: usize = 0;

struct PendingNode {
    name: String,
    path: String,
    node_type: NodeType,
    heat_score: Option<HeatScore>,
    last_modified: Option<DateTime<Utc>>,
    children: Vec<usize>,
}

/// Builds one heat tree. Consumed by [`TreeBuilder::build`], so the
/// path lookup never outlives a single run.
pub struct TreeBuilder {
    nodes: Vec<PendingNode>,
    // path -> index into `nodes`
    node_cache: HashMap<String, usize>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        let root = PendingNode {
            name: ROOT_NAME.to_string(),
            path: String::new(),
            node_type: NodeType::Folder,
            heat_score: None,
            last_modified: None,
            children: Vec::new(),
        };
        let mut node_cache = HashMap::new();
        node_cache.insert(String::new(), ROOT);
        Self {
            nodes: vec![root],
            node_cache,
        }
    }

    pub fn build(
        mut self,
        heat_scores: &[HeatScore],
        stats: &HashMap<String, FileChangeStats>,
    ) -> Result<FileNode> {
        for score in heat_scores {
            let fs = stats
                .get(&score.path)
                .ok_or_else(|| FiresightError::MissingStats {
                    path: score.path.clone(),
                })?;
            self.add_file(score, fs)?;
        }
        debug!(
            files = heat_scores.len(),
            nodes = self.nodes.len(),
            "inserted files into heat tree"
        );
        Ok(self.assemble(ROOT))
    }

    /// Walks `score.path` from the root, creating any missing folders and the
    /// file leaf. Shared prefixes resolve to the node created first.
    fn add_file(&mut self, score: &HeatScore, stats: &FileChangeStats) -> Result<()> {
        let parts: Vec<&str> = path_segments(&score.path).collect();
        if parts.is_empty() {
            return Err(FiresightError::EmptyPath(score.path.clone()));
        }

        let mut current_path = String::new();
        let mut current = ROOT;

        for (i, part) in parts.iter().enumerate() {
            if !current_path.is_empty() {
                current_path.push('/');
            }
            current_path.push_str(part);

            let is_file = i == parts.len() - 1;
            let wanted = if is_file { NodeType::File } else { NodeType::Folder };

            if let Some(&existing) = self.node_cache.get(&current_path) {
                // a second file at the same path, or a file where a folder is needed
                if is_file || self.nodes[existing].node_type != wanted {
                    return Err(FiresightError::PathConflict { path: current_path });
                }
                current = existing;
                continue;
            }

            let node = PendingNode {
                name: part.to_string(),
                path: current_path.clone(),
                node_type: wanted,
                heat_score: is_file.then(|| score.clone()),
                last_modified: is_file.then_some(stats.last_modified),
                children: Vec::new(),
            };
            let idx = self.nodes.len();
            self.nodes.push(node);
            self.nodes[current].children.push(idx);
            self.node_cache.insert(current_path.clone(), idx);
            current = idx;
        }
        Ok(())
    }

    /// Converts the pending arena into owned nodes, children first, so every
    /// folder aggregates over finished subtrees.
    fn assemble(&mut self, idx: usize) -> FileNode {
        let child_ids = std::mem::take(&mut self.nodes[idx].children);
        let children: Vec<FileNode> = child_ids.into_iter().map(|c| self.assemble(c)).collect();

        let pending = &mut self.nodes[idx];
        let name = std::mem::take(&mut pending.name);
        let path = std::mem::take(&mut pending.path);

        match pending.node_type {
            NodeType::File => FileNode {
                id: node_id(&path),
                extension: extension(&name),
                name,
                path,
                node_type: NodeType::File,
                size: 0,
                lines_of_code: 0,
                file_count: 0,
                last_modified: pending.last_modified,
                heat_score: pending.heat_score.take(),
                functions: Some(Vec::new()),
                children,
            },
            NodeType::Folder => {
                let id = if idx == ROOT {
                    ROOT_ID.to_string()
                } else {
                    node_id(&path)
                };
                let mut folder = FileNode {
                    id,
                    heat_score: Some(HeatScore::folder(&path)),
                    name,
                    path,
                    node_type: NodeType::Folder,
                    extension: None,
                    size: 0,
                    lines_of_code: 0,
                    file_count: 0,
                    last_modified: None,
                    functions: None,
                    children,
                };
                aggregate_folder(&mut folder);
                sort_children(&mut folder.children);
                folder
            }
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fills a folder's aggregates from its direct children, which must already
/// carry their own subtree totals.
pub fn aggregate_folder(node: &mut FileNode) {
    let mut file_count = 0usize;
    let mut size = 0u64;
    let mut lines = 0u64;
    let mut changes = 0u32;
    let mut latest: Option<DateTime<Utc>> = None;
    let mut weighted_heat = 0.0f64;
    let mut total_weight = 0u64;

    for child in &node.children {
        file_count += if child.is_file() { 1 } else { child.file_count };
        size += child.size;
        lines += child.lines_of_code;

        let child_changes = child.total_file_changes();
        changes += child_changes;

        if child.last_modified > latest {
            latest = child.last_modified;
        }

        // untouched children still count, with minimal influence
        let weight = u64::from(child_changes.max(1));
        weighted_heat += child.score() * weight as f64;
        total_weight += weight;
    }

    node.file_count = file_count;
    node.size = size;
    node.lines_of_code = lines;
    node.last_modified = latest;

    let path = &node.path;
    let heat = node
        .heat_score
        .get_or_insert_with(|| HeatScore::folder(path));
    heat.total_file_changes = changes;
    heat.score = if total_weight > 0 {
        weighted_heat / total_weight as f64
    } else {
        0.0
    };
}

/// Folders first by name, then files hottest first. Stable, so equal
/// scores keep insertion order.
pub fn sort_children(children: &mut [FileNode]) {
    children.sort_by(|a, b| match (a.node_type, b.node_type) {
        (NodeType::Folder, NodeType::File) => Ordering::Less,
        (NodeType::File, NodeType::Folder) => Ordering::Greater,
        (NodeType::Folder, NodeType::Folder) => a.name.cmp(&b.name),
        (NodeType::File, NodeType::File) => {
            b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal)
        }
    });
}

pub fn build_tree(
    heat_scores: &[HeatScore],
    stats: &HashMap<String, FileChangeStats>,
) -> Result<FileNode> {
    TreeBuilder::new().build(heat_scores, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heat::HeatCalculator;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn stats(path: &str, day: i64, changes: u32, author: &str) -> FileChangeStats {
        let at = now() - Duration::days(day);
        let mut fs = FileChangeStats::new(path.to_string(), at);
        for _ in 0..changes {
            fs.record_change(author, at, day);
        }
        fs
    }

    fn batch(items: Vec<FileChangeStats>) -> HashMap<String, FileChangeStats> {
        items.into_iter().map(|s| (s.file_path.clone(), s)).collect()
    }

    fn score(path: &str, score: f64, changes: u32) -> HeatScore {
        HeatScore {
            path: path.to_string(),
            score,
            change_frequency: 0.0,
            days_since_edit: 0,
            total_file_changes: changes,
        }
    }

    fn names(node: &FileNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    fn find<'a>(root: &'a FileNode, path: &str) -> &'a FileNode {
        root.walk().find(|n| n.path == path).unwrap()
    }

    #[test]
    fn two_file_scenario_builds_sorted_folder() {
        let input = batch(vec![stats("a/b.go", 0, 10, "x"), stats("a/c.go", 200, 1, "y")]);
        let scores = HeatCalculator::default().compute_heat_scores_at(&input, now());
        let root = build_tree(&scores, &input).unwrap();

        assert_eq!(root.id, ROOT_ID);
        assert_eq!(root.name, ROOT_NAME);
        assert_eq!(root.path, "");
        assert_eq!(names(&root), vec!["a"]);

        let a = &root.children[0];
        assert_eq!(a.path, "a");
        assert_eq!(a.node_type, NodeType::Folder);
        assert_eq!(names(a), vec!["b.go", "c.go"]);
        assert_eq!(a.file_count, 2);
        assert_eq!(a.total_file_changes(), 11);

        let b = &a.children[0];
        assert_eq!(b.id, "a_b.go");
        assert_eq!(b.extension.as_deref(), Some("go"));
        assert!((b.score() - 100.0).abs() < 1e-9);

        // (100 * 10 + c * 1) / 11
        let c = a.children[1].score();
        let expected = (100.0 * 10.0 + c) / 11.0;
        assert!((a.score() - expected).abs() < 1e-9);
        assert!((root.score() - a.score()).abs() < 1e-9);
        assert_eq!(a.last_modified, Some(now()));
    }

    #[test]
    fn single_idle_file_gets_floor_score_chain() {
        let input = batch(vec![stats("deep/er/idle.txt", 0, 0, "x")]);
        let scores = HeatCalculator::default().compute_heat_scores_at(&input, now());
        let root = build_tree(&scores, &input).unwrap();

        let leaf = find(&root, "deep/er/idle.txt");
        assert!(leaf.is_file());
        assert_eq!(leaf.score(), 1.0);
        assert_eq!(find(&root, "deep/er").score(), 1.0);
        assert_eq!(find(&root, "deep").file_count, 1);
        assert_eq!(root.file_count, 1);
    }

    #[test]
    fn folders_precede_files_and_files_run_hot_to_cold() {
        let paths = [
            ("src/zeta.rs", 10.0, 1),
            ("src/alpha.rs", 90.0, 1),
            ("src/util/x.rs", 50.0, 1),
            ("src/core/y.rs", 20.0, 1),
            ("README.md", 5.0, 1),
            ("docs/guide.md", 1.0, 1),
        ];
        let input = batch(paths.iter().map(|(p, _, c)| stats(p, 1, *c, "x")).collect());
        let scores: Vec<_> = paths.iter().map(|(p, s, c)| score(p, *s, *c)).collect();
        let root = build_tree(&scores, &input).unwrap();

        assert_eq!(names(&root), vec!["docs", "src", "README.md"]);
        assert_eq!(
            names(find(&root, "src")),
            vec!["core", "util", "alpha.rs", "zeta.rs"]
        );

        for node in root.walk() {
            let kids = &node.children;
            let first_file = kids.iter().position(|c| c.is_file()).unwrap_or(kids.len());
            assert!(kids[first_file..].iter().all(|c| c.is_file()));
            assert!(kids[..first_file].windows(2).all(|w| w[0].name <= w[1].name));
            assert!(kids[first_file..].windows(2).all(|w| w[0].score() >= w[1].score()));
        }
    }

    #[test]
    fn folder_totals_match_file_descendants() {
        let input = batch(vec![
            stats("a/one.rs", 1, 4, "x"),
            stats("a/b/two.rs", 3, 2, "y"),
            stats("a/b/c/three.rs", 9, 7, "x"),
            stats("d/four.rs", 40, 1, "z"),
            stats("five.rs", 0, 3, "x"),
        ]);
        let scores = HeatCalculator::default().compute_heat_scores_at(&input, now());
        let root = build_tree(&scores, &input).unwrap();

        let file_nodes: Vec<_> = root.walk().filter(|n| n.is_file()).collect();
        assert_eq!(file_nodes.len(), input.len());
        for path in input.keys() {
            assert_eq!(file_nodes.iter().filter(|n| &n.path == path).count(), 1);
        }

        for folder in root.walk().filter(|n| n.is_folder()) {
            let files: Vec<_> = folder.walk().filter(|n| n.is_file()).collect();
            assert_eq!(folder.file_count, files.len(), "at '{}'", folder.path);
            assert_eq!(
                folder.total_file_changes(),
                files.iter().map(|f| f.total_file_changes()).sum::<u32>()
            );
        }
        assert_eq!(root.total_file_changes(), 17);
    }

    #[test]
    fn child_paths_extend_parent_paths() {
        let input = batch(vec![stats("x/y/z.rs", 1, 1, "a"), stats("x/w.rs", 1, 1, "a")]);
        let scores = HeatCalculator::default().compute_heat_scores_at(&input, now());
        let root = build_tree(&scores, &input).unwrap();

        for node in root.walk() {
            for child in &node.children {
                let expected = if node.path.is_empty() {
                    child.name.clone()
                } else {
                    format!("{}/{}", node.path, child.name)
                };
                assert_eq!(child.path, expected);
            }
        }
    }

    #[test]
    fn zero_change_children_still_carry_weight() {
        let input = batch(vec![stats("f/busy.rs", 0, 3, "x"), stats("f/quiet.rs", 0, 0, "x")]);
        let scores = vec![score("f/busy.rs", 80.0, 3), score("f/quiet.rs", 20.0, 0)];
        let root = build_tree(&scores, &input).unwrap();
        // (80 * 3 + 20 * 1) / 4
        assert!((find(&root, "f").score() - 65.0).abs() < 1e-9);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let input = batch(vec![stats("/lib//core/mod.rs/", 0, 1, "x")]);
        let scores = vec![score("/lib//core/mod.rs/", 100.0, 1)];
        let root = build_tree(&scores, &input).unwrap();

        let paths: Vec<_> = root.walk().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["", "lib", "lib/core", "lib/core/mod.rs"]);
    }

    #[test]
    fn insertion_order_does_not_change_the_tree() {
        let input = batch(vec![
            stats("a/x.rs", 1, 2, "p"),
            stats("b/y.rs", 2, 5, "q"),
            stats("a/c/z.rs", 3, 1, "p"),
        ]);
        let scores = HeatCalculator::default().compute_heat_scores_at(&input, now());
        let mut reversed = scores.clone();
        reversed.reverse();

        assert_eq!(
            build_tree(&scores, &input).unwrap(),
            build_tree(&reversed, &input).unwrap()
        );
    }

    #[test]
    fn empty_input_gives_bare_root() {
        let root = build_tree(&[], &HashMap::new()).unwrap();
        assert!(root.children.is_empty());
        assert_eq!(root.file_count, 0);
        assert_eq!(root.score(), 0.0);
        assert_eq!(root.last_modified, None);
    }

    #[test]
    fn missing_stats_fail_fast() {
        let err = build_tree(&[score("ghost.rs", 10.0, 1)], &HashMap::new()).unwrap_err();
        assert!(matches!(err, FiresightError::MissingStats { ref path } if path == "ghost.rs"));
    }

    #[test]
    fn colliding_paths_are_rejected() {
        let input = batch(vec![stats("a/b", 0, 1, "x"), stats("a//b", 0, 1, "x")]);
        let scores = vec![score("a/b", 50.0, 1), score("a//b", 40.0, 1)];
        let err = build_tree(&scores, &input).unwrap_err();
        assert!(matches!(err, FiresightError::PathConflict { .. }));
    }

    #[test]
    fn file_used_as_folder_is_rejected() {
        let input = batch(vec![stats("a", 0, 1, "x"), stats("a/b.rs", 0, 1, "x")]);
        let scores = vec![score("a", 50.0, 1), score("a/b.rs", 40.0, 1)];
        assert!(matches!(
            build_tree(&scores, &input),
            Err(FiresightError::PathConflict { ref path }) if path == "a"
        ));
    }

    #[test]
    fn separator_only_path_is_rejected() {
        let input = batch(vec![stats("//", 0, 1, "x")]);
        let scores = vec![score("//", 100.0, 1)];
        assert!(matches!(
            build_tree(&scores, &input),
            Err(FiresightError::EmptyPath(_))
        ));
    }

    #[test]
    fn top_level_folder_named_root_keeps_its_own_path() {
        let input = batch(vec![stats("root/main.rs", 0, 1, "x")]);
        let scores = vec![score("root/main.rs", 100.0, 1)];
        let tree = build_tree(&scores, &input).unwrap();
        let inner = &tree.children[0];
        assert_eq!(inner.path, "root");
        assert_eq!(inner.id, "root");
        assert_ne!(tree.id, inner.id);
        assert_eq!(inner.children[0].path, "root/main.rs");
        assert_eq!(inner.children[0].id, "root_main.rs");
        assert_eq!(tree.path, "");
    }
}
