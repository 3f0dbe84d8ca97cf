use crate::heat::output::{format_elapsed, heat_bar};
use crate::model::{AnalysisResult, FileNode, TreeOutput, SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use console::style;
use std::time::Duration;

pub fn output_json(tree: FileNode, analysis: &AnalysisResult, elapsed: Duration) -> Result<()> {
    let output = TreeOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: analysis.repository_path.clone(),
        branch: analysis.branch.clone(),
        time_range_days: analysis.time_range_days,
        commit_count: analysis.commit_count,
        analyzed_files: tree.file_count,
        duration: format_elapsed(elapsed),
        tree,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Indented plain-text rendering, one node per line, down to `max_depth`
/// levels below the root.
pub fn render_tree(root: &FileNode, max_depth: Option<usize>) -> String {
    let mut out = format!(
        "{} ({} files, heat {:.1})\n",
        root.name,
        root.file_count,
        root.score()
    );
    render_children(root, 1, max_depth, &mut out);
    out
}

fn render_children(node: &FileNode, depth: usize, max_depth: Option<usize>, out: &mut String) {
    if max_depth.is_some_and(|max| depth > max) {
        return;
    }
    let indent = "  ".repeat(depth);
    for child in &node.children {
        if child.is_folder() {
            out.push_str(&format!(
                "{indent}{}/ ({} files, {} changes, heat {:.1})\n",
                child.name,
                child.file_count,
                child.total_file_changes(),
                child.score()
            ));
            render_children(child, depth + 1, max_depth, out);
        } else {
            out.push_str(&format!(
                "{indent}{} {} ({} changes, heat {:.1})\n",
                heat_bar(child.score()),
                child.name,
                child.total_file_changes(),
                child.score()
            ));
        }
    }
}

pub fn output_tree(root: &FileNode, max_depth: Option<usize>) -> Result<()> {
    if root.children.is_empty() {
        println!("No data to display");
        return Ok(());
    }
    println!("{}", style("Code Heat Tree").bold());
    println!("{}", "─".repeat(50));
    print!("{}", render_tree(root, max_depth));
    Ok(())
}
