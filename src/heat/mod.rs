pub mod dead_code;
pub mod exec;
pub mod fetch;
pub mod output;
pub mod score;

pub use dead_code::{classify, find_candidates, is_likely_dead_code, DeadCodeVerdict};
pub use exec::{exec, exec_dead};
pub use fetch::load_analysis;
pub use output::{output_dead_json, output_dead_ndjson, output_dead_table, output_json, output_ndjson, output_table};
pub use score::{compute_heat_scores, HeatCalculator, ScoringConfig, DECAY_RATE, MIN_SCORE};
