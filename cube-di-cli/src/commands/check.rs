//! Validate a configuration file

use anyhow::{bail, Result};
use colored::*;
use cube_di::{analysis, Issue};
use std::path::Path;

/// Check `file` and fail if any issue is found
pub fn run(file: &Path) -> Result<()> {
    let issues = issues(file)?;

    if issues.is_empty() {
        println!("{} {} is valid", "✓".green().bold(), file.display());
        return Ok(());
    }

    for issue in &issues {
        println!("  {} {}", "✗".red(), issue);
    }
    bail!("{} issue(s) found in {}", issues.len(), file.display())
}

fn issues(file: &Path) -> Result<Vec<Issue>> {
    let config = super::load(file)?;
    Ok(analysis::check(&config))
}
