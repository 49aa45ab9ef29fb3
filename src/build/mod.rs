//! Build orchestration.
//!
//! A package goes through three stages, strictly in order:
//!
//! 1. **build** - `cmake` configure + build ([`cmake`])
//! 2. **package** - copy outputs into `bin/`, `include/`, `lib/` ([`assemble`])
//! 3. **package_info** - publish consumer metadata ([`metadata`])
//!
//! The first failing stage aborts the run.

pub mod assemble;
pub mod cmake;
pub mod metadata;

mod clean;
mod deploy;

pub use assemble::{AssemblyReport, is_shared_library, is_static_library, is_test_artifact};
pub use clean::clean;
pub use deploy::deploy;
pub use metadata::PackageInfo;
pub use test::{
    TestOutcome, TestReport, discover_test_binaries, run_test_binaries, run_tests, tests_invocation,
};

use crate::config::{self, PackageConfig};
use crate::descriptor::{PackageDescriptor, StagingTree};
use crate::settings::{BuildOptions, BuildSettings};
use anyhow::{Context, Result};
use cmake::CmakeInvocation;
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a run needs, fixed before the first stage starts.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub project_root: PathBuf,
    pub build_dir: PathBuf,
    pub package_dir: PathBuf,
    pub settings: BuildSettings,
    pub options: BuildOptions,
    pub dry_run: bool,
    pub verbose: bool,
}

impl OrchestratorConfig {
    /// Defaults: `build/` and `package/` under the project root.
    pub fn new(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            build_dir: project_root.join("build"),
            package_dir: project_root.join("package"),
            settings: BuildSettings::default(),
            options: BuildOptions::default(),
            dry_run: false,
            verbose: false,
        }
    }

    /// Kept outside `build/` so the library scan never picks up test outputs.
    pub fn tests_build_dir(&self) -> PathBuf {
        self.project_root.join("build-tests")
    }
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    package_config: PackageConfig,
    descriptor: PackageDescriptor,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, package_config: PackageConfig) -> Result<Self> {
        let descriptor = PackageDescriptor::from_config(&package_config, &config.project_root)?;
        Ok(Self {
            config,
            package_config,
            descriptor,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    pub fn package_id(&self) -> String {
        self.descriptor
            .package_id(&self.config.settings, &self.config.options)
    }

    /// Stage 1: configure and build with CMake.
    pub fn build(&self) -> Result<()> {
        println!(
            "{} Building {} ({} {})...",
            "🔨".cyan(),
            self.descriptor.reference().bold(),
            self.config.settings.build_type,
            if self.config.options.shared { "shared" } else { "static" }
        );
        CmakeInvocation::new(
            &self.config.project_root,
            &self.config.build_dir,
            &self.config.settings,
            &self.config.options,
        )
        .run(self.config.dry_run, self.config.verbose)
    }

    /// Stage 2: assemble a fresh package tree from the build outputs.
    pub fn package(&self) -> Result<AssemblyReport> {
        let package_dir = &self.config.package_dir;
        println!("{} Packaging into {}...", "📦".blue(), package_dir.display());

        let rules = assemble::package_rules(&self.config.options)?;
        if self.config.dry_run {
            for rule in &rules {
                println!(
                    "   {} copy {} from {} to {}",
                    "Would execute:".dimmed(),
                    rule.select.describe(),
                    rule.src.display(),
                    package_dir.join(&rule.dst).display()
                );
            }
            return Ok(AssemblyReport::default());
        }

        if package_dir.exists() {
            fs::remove_dir_all(package_dir)
                .with_context(|| format!("Failed to clear {}", package_dir.display()))?;
        }

        let report = assemble::assemble(
            &rules,
            &self.config.project_root,
            &self.config.build_dir,
            package_dir,
        )?;

        for dir in ["bin", "include", "lib"] {
            let count = report.files_in(&package_dir.join(dir)).len();
            if count > 0 {
                println!("   {} {}/ ({} files)", "+".green(), dir, count);
            }
        }
        if self.config.verbose {
            for copied in &report.copied {
                println!(
                    "   {} {} -> {}",
                    "$".dimmed(),
                    copied.from.display(),
                    copied.to.display()
                );
            }
        }
        Ok(report)
    }

    /// Stage 3: publish include dirs, libs and runtime paths.
    pub fn package_info(&self) -> Result<PackageInfo> {
        let tree = StagingTree::snapshot(&self.config.package_dir);
        let info = PackageInfo::collect(
            &self.descriptor,
            tree,
            &self.config.package_dir,
            self.package_id(),
            |var| std::env::var_os(var),
        )?;

        if !self.config.dry_run {
            let path = info.write(&self.config.package_dir)?;
            if self.config.verbose {
                println!("   {} Wrote {}", "$".dimmed(), path.display());
            }
        }
        Ok(info)
    }

    /// Persist the loaded config to `out/.env` for a later `tset test`.
    pub fn persist_env(&self) -> Result<PathBuf> {
        let path = config::env_file(&self.config.project_root);
        if !self.config.dry_run {
            self.package_config.save(&path)?;
        }
        Ok(path)
    }

    /// Run all stages in order.
    pub fn run(&self) -> Result<PackageInfo> {
        self.build()?;
        self.package()?;
        let info = self.package_info()?;
        self.persist_env()?;

        println!(
            "{} Package ready: {} ({})",
            "✓".green(),
            self.descriptor.reference().bold(),
            if info.header_only { "header-only" } else { "binary" }
        );
        println!("   package_id: {}", info.package_id.dimmed());
        Ok(info)
    }
}
