use crate::error::{FiresightError, Result};
use crate::model::{CommitInfo, DateRange};
use chrono::DateTime;
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use indicatif::ProgressBar;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FALLBACK_BRANCH: &str = "master";
const DEFAULT_BRANCH: &str = "main";

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the commit to start walking from, with the branch name it came from.
    ///
    /// Without a branch the current HEAD is used. A missing `main` falls back
    /// to `master`.
    pub fn resolve_tip(&self, branch: Option<&str>) -> Result<(String, ObjectId)> {
        let Some(branch) = branch else {
            let mut head = self.repo.head()?;
            let name = head
                .referent_name()
                .map(|n| n.shorten().to_string())
                .unwrap_or_else(|| "HEAD".to_string());
            let commit = head.peel_to_commit_in_place()?;
            return Ok((name, commit.id));
        };

        match self.branch_tip(branch) {
            Ok(id) => Ok((branch.to_string(), id)),
            Err(err) if branch == DEFAULT_BRANCH => {
                warn!(branch, fallback = FALLBACK_BRANCH, "branch not found, falling back");
                let id = self.branch_tip(FALLBACK_BRANCH).map_err(|_| err)?;
                Ok((FALLBACK_BRANCH.to_string(), id))
            }
            Err(err) => Err(err),
        }
    }

    fn branch_tip(&self, branch: &str) -> Result<ObjectId> {
        let refname = format!("refs/heads/{branch}");
        let id = self
            .repo
            .rev_parse_single(refname.as_str())
            .map_err(|e| FiresightError::GitRepo(format!("Branch '{branch}' not found: {e}")))?;
        Ok(id.detach())
    }

    /// Every ancestor of `tip` whose author time falls inside `range`.
    ///
    /// Ancestors outside the range are still traversed, since history is not
    /// guaranteed to be ordered by time.
    pub fn walk_commits(
        &self,
        tip: ObjectId,
        range: &DateRange,
        include_merges: bool,
        progress: &ProgressBar,
    ) -> Result<Vec<CommitInfo>> {
        let mut commits = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([tip]);

        while let Some(commit_id) = stack.pop_back() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let author = commit.author()?;
            let secs = author.seconds();
            let timestamp = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| FiresightError::InvalidDate(format!("Invalid timestamp: {secs}")))?;

            let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();
            let skip = !range.contains(&timestamp) || (!include_merges && parents.len() > 1);

            if !skip {
                commits.push(CommitInfo {
                    id: commit_id.to_string(),
                    author_name: author.name.to_string(),
                    author_email: author.email.to_string(),
                    timestamp,
                    parent_ids: parents.iter().map(|id| id.to_string()).collect(),
                });
                progress.inc(1);
            }

            stack.extend(parents);
        }

        debug!(walked = seen.len(), kept = commits.len(), "walked commit graph");
        Ok(commits)
    }

    /// File paths touched by `commit` relative to its first parent, or every
    /// file of the tree for a root commit. Directory and submodule entries are
    /// left out.
    pub fn changed_paths(&self, commit: &CommitInfo) -> Result<Vec<String>> {
        let commit_id = parse_id(&commit.id)?;
        let commit_tree = self.repo.find_commit(commit_id)?.tree()?;

        let changes: Vec<ChangeDetached> = match commit.parent_ids.first() {
            Some(parent) => {
                let parent_tree = self.repo.find_commit(parse_id(parent)?)?.tree()?;
                self.repo
                    .diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), None)?
            }
            None => self.repo.diff_tree_to_tree(None, Some(&commit_tree), None)?,
        };

        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for change in changes {
            let mode = change.entry_mode();
            if mode.is_tree() || mode.is_commit() {
                continue;
            }
            let location = match change {
                ChangeDetached::Addition { location, .. }
                | ChangeDetached::Deletion { location, .. }
                | ChangeDetached::Modification { location, .. }
                | ChangeDetached::Rewrite { location, .. } => location.to_string(),
            };
            if seen.insert(location.clone()) {
                paths.push(location);
            }
        }
        Ok(paths)
    }
}

fn parse_id(hex: &str) -> Result<ObjectId> {
    ObjectId::from_hex(hex.as_bytes())
        .map_err(|e| FiresightError::Parse(format!("Invalid commit ID '{hex}': {e}")))
}
