use std::path::Path;

use tandem_core::merge::{merge, MergeMode};

use crate::error::CliError;

pub fn run_merge(old_path: &Path, new_path: &Path, lines: bool) -> Result<(), CliError> {
    let old = std::fs::read_to_string(old_path)?;
    let new = std::fs::read_to_string(new_path)?;
    println!("{}", merge_texts(&old, &new, lines)?);
    Ok(())
}

pub fn merge_texts(old: &str, new: &str, lines: bool) -> Result<String, CliError> {
    let mode = if lines {
        MergeMode::Lines
    } else {
        MergeMode::Markup
    };
    Ok(merge(old, new, mode)?)
}
