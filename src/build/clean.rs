//! Staging cleanup.
//!
//! Nothing is recovered in place: a failed run is fixed by removing the
//! staging directories and running again.
//!
//! - `tset clean` - Remove the build, test build and package directories
//! - `tset clean --all` - Also remove `out/` (the persisted `.env`)

use super::OrchestratorConfig;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::PathBuf;

pub fn clean(config: &OrchestratorConfig, all: bool) -> Result<Vec<PathBuf>> {
    let mut targets = vec![
        config.build_dir.clone(),
        config.tests_build_dir(),
        config.package_dir.clone(),
    ];
    if all {
        targets.push(config.project_root.join("out"));
    }

    let mut removed = Vec::new();
    for dir in targets {
        if !dir.exists() {
            continue;
        }
        if config.dry_run {
            println!("   {} rm -r {}", "Would execute:".dimmed(), dir.display());
            continue;
        }
        fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
        println!("{} Removed {}", "🗑️".red(), dir.display());
        removed.push(dir);
    }

    if removed.is_empty() {
        println!("{} Nothing to clean", "!".yellow());
    } else {
        println!("{} Clean complete.", "✓".green());
    }
    Ok(removed)
}
