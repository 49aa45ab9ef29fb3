//! Self-contained deployment: package binaries and libraries side by side.

use super::assemble::{AssemblyReport, CopyRule, Origin, Selector};
use anyhow::Result;
use colored::*;
use std::path::{Path, PathBuf};

/// Copy the package `bin/` and then `lib/` into `<dest>/bin`.
pub fn deploy(package_dir: &Path, dest: &Path) -> Result<AssemblyReport> {
    if !package_dir.is_dir() {
        anyhow::bail!(
            "Package directory {} not found - run 'tset package' first",
            package_dir.display()
        );
    }

    let mut report = AssemblyReport::default();
    for src in ["bin", "lib"] {
        let rule = CopyRule {
            origin: Origin::Build,
            src: PathBuf::from(src),
            dst: PathBuf::from("bin"),
            select: Selector::glob("*")?,
            excludes: Vec::new(),
            keep_path: true,
        };
        rule.apply(package_dir, dest, &mut report)?;
    }

    println!(
        "{} Deployed {} files to {}",
        "✓".green(),
        report.copied.len(),
        dest.join("bin").display()
    );
    Ok(report)
}
