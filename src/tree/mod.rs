pub mod builder;
pub mod exec;
pub mod output;

pub use builder::{aggregate_folder, build_tree, sort_children, TreeBuilder, ROOT_ID, ROOT_NAME};
pub use exec::exec;
pub use output::{output_json, output_tree, render_tree};
