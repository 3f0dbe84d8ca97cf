//! Code heat analysis for git repositories.
//!
//! Per-file change stats go through [`heat::HeatCalculator`] to get
//! decay-weighted, batch-normalized scores, and [`tree::build_tree`] folds
//! those scores into a folder tree with change-weighted aggregates.
//!
//! ```no_run
//! use firesight::heat::compute_heat_scores;
//! use firesight::history::load_stats_file;
//! use firesight::tree::build_tree;
//!
//! let stats = load_stats_file(std::path::Path::new("stats.json"))?;
//! let scores = compute_heat_scores(&stats);
//! let tree = build_tree(&scores, &stats)?;
//! println!("{} files, root heat {:.1}", tree.file_count, tree.score());
//! # Ok::<(), firesight::error::FiresightError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod error;
pub mod git;
pub mod heat;
pub mod history;
pub mod logging;
pub mod model;
pub mod tree;
pub mod util;
