use crate::heat::ScoringConfig;
use crate::logging::{init_logging, LogFormat};
use crate::model::{AnalyzeOptions, DEFAULT_TIME_RANGE_DAYS};
use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "firesight")]
#[command(about = "Code heat analysis: which files are evolving and which are going cold")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    #[arg(long, env = "FIRESIGHT_REPO", help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, env = "FIRESIGHT_BRANCH", help = "Branch to analyze (defaults to HEAD)")]
    pub branch: Option<String>,

    #[arg(
        long,
        env = "FIRESIGHT_DAYS",
        default_value_t = DEFAULT_TIME_RANGE_DAYS,
        help = "Size of the analysis window in days"
    )]
    pub days: u32,

    #[arg(long, help = "Include merge commits", default_value_t = true, action = ArgAction::Set)]
    pub include_merges: bool,

    #[arg(long, env = "FIRESIGHT_CACHE", help = "Path to cache directory")]
    pub cache: Option<PathBuf>,

    #[arg(long, help = "Diff every commit instead of using the commit cache")]
    pub no_cache: bool,

    #[arg(
        long,
        value_name = "FILE",
        help = "Read a JSON map of path -> change stats instead of walking git history"
    )]
    pub from_stats: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = crate::heat::DECAY_RATE,
        value_parser = parse_decay_rate,
        help = "Per-day exponential decay applied to changes"
    )]
    pub decay_rate: f64,

    #[arg(long, help = "Log level or filter directives (overridden by FIRESIGHT_LOG)")]
    pub log_level: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, help = "Log output format")]
    pub log_format: LogFormat,
}

impl CommonArgs {
    pub fn analyze_options(&self) -> AnalyzeOptions {
        AnalyzeOptions {
            branch: self.branch.clone(),
            time_range_days: self.days,
            include_merges: self.include_merges,
        }
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            decay_rate: self.decay_rate,
            ..ScoringConfig::default()
        }
    }
}

fn parse_decay_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("invalid number '{s}': {e}"))?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(format!("decay rate must be a finite number >= 0, got {s}"));
    }
    Ok(rate)
}

#[derive(Subcommand)]
pub enum Commands {
    /// Per-file heat scores, hottest first
    Scores {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, default_value_t = 50, help = "Rows to show in table output")]
        limit: usize,
    },
    /// Folder tree with aggregated heat
    Tree {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Maximum depth to print in table output")]
        depth: Option<usize>,
    },
    /// Files that look abandoned
    Dead {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        init_logging(self.common.log_level.as_deref(), self.common.log_format);

        match self.command {
            Commands::Scores { json, ndjson, limit } => {
                crate::heat::exec(self.common, json, ndjson, limit)
            }
            Commands::Tree { json, depth } => crate::tree::exec(self.common, json, depth),
            Commands::Dead { json, ndjson } => crate::heat::exec_dead(self.common, json, ndjson),
        }
    }
}
