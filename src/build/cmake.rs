//! Configure + build through the external `cmake` binary.

use crate::error::PackageError;
use crate::settings::{BuildOptions, BuildSettings};
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// One configure + build run of a CMake project.
#[derive(Debug, Clone)]
pub struct CmakeInvocation {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub settings: BuildSettings,
    pub options: BuildOptions,
    /// Extra `-D` cache entries, in order
    pub defines: Vec<(String, String)>,
}

impl CmakeInvocation {
    pub fn new(
        source_dir: &Path,
        build_dir: &Path,
        settings: &BuildSettings,
        options: &BuildOptions,
    ) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            settings: settings.clone(),
            options: options.clone(),
            defines: Vec::new(),
        }
    }

    pub fn define(mut self, key: &str, value: impl Into<String>) -> Self {
        self.defines.push((key.to_string(), value.into()));
        self
    }

    /// Output directory for executables (and DLLs).
    pub fn bin_dir(&self) -> PathBuf {
        self.build_dir.join("bin")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.build_dir.join("lib")
    }

    pub fn configure_args(&self) -> Vec<String> {
        let on_off = |b: bool| if b { "ON" } else { "OFF" };
        let mut args = vec![
            "-S".to_string(),
            self.source_dir.to_string_lossy().to_string(),
            "-B".to_string(),
            self.build_dir.to_string_lossy().to_string(),
            format!("-DCMAKE_BUILD_TYPE={}", self.settings.build_type),
            format!("-DBUILD_SHARED_LIBS={}", on_off(self.options.shared)),
            format!(
                "-DCMAKE_RUNTIME_OUTPUT_DIRECTORY={}",
                self.bin_dir().to_string_lossy()
            ),
            format!(
                "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY={}",
                self.lib_dir().to_string_lossy()
            ),
            format!(
                "-DCMAKE_ARCHIVE_OUTPUT_DIRECTORY={}",
                self.lib_dir().to_string_lossy()
            ),
        ];
        for (key, value) in &self.defines {
            args.push(format!("-D{}={}", key, value));
        }
        args
    }

    pub fn build_args(&self) -> Vec<String> {
        vec![
            "--build".to_string(),
            self.build_dir.to_string_lossy().to_string(),
            "--config".to_string(),
            self.settings.build_type.clone(),
        ]
    }

    /// Configure, then build. The first failing step aborts with its exit code.
    pub fn run(&self, dry_run: bool, verbose: bool) -> Result<()> {
        let steps = [
            ("cmake configure", self.configure_args()),
            ("cmake --build", self.build_args()),
        ];

        if dry_run {
            for (_, args) in &steps {
                println!("   {} cmake {}", "Would execute:".dimmed(), args.join(" "));
            }
            return Ok(());
        }

        let start_time = Instant::now();
        for (stage, args) in &steps {
            run_step(stage, args, verbose)?;
        }
        println!(
            "{} Build finished in {:.2?}",
            "✓".green(),
            start_time.elapsed()
        );
        Ok(())
    }
}

fn run_step(stage: &str, args: &[String], verbose: bool) -> Result<()> {
    if verbose {
        println!("   {} cmake {}", "$".dimmed(), args.join(" "));
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Running {}...", stage));

    let output = Command::new("cmake").args(args).output();
    pb.finish_and_clear();

    let output = match output {
        Ok(out) => out,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("{} cmake not found in PATH.", "x".red());
            println!("   Install it from {}", "https://cmake.org/download/".blue());
            return Err(e).context("Failed to execute cmake");
        }
        Err(e) => return Err(e).context("Failed to execute cmake"),
    };

    if verbose {
        print!("{}", String::from_utf8_lossy(&output.stdout));
    }

    if !output.status.success() {
        if !verbose {
            print!("{}", String::from_utf8_lossy(&output.stdout));
        }
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        println!("{} {} failed", "x".red(), stage);
        return Err(PackageError::BuildFailure {
            stage: stage.to_string(),
            code: output.status.code(),
        }
        .into());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        println!("{} Warnings from {}:\n{}", "!".yellow(), stage, stderr);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> CmakeInvocation {
        let settings = BuildSettings::default().with_build_type(Some("debug"));
        CmakeInvocation::new(
            Path::new("/work/acme"),
            Path::new("/work/acme/build"),
            &settings,
            &BuildOptions::default(),
        )
    }

    #[test]
    fn test_configure_args() {
        let args = invocation().define("FOO", "bar").configure_args();
        assert_eq!(&args[..4], &["-S", "/work/acme", "-B", "/work/acme/build"]);
        assert!(args.contains(&"-DCMAKE_BUILD_TYPE=Debug".to_string()));
        assert!(args.contains(&"-DBUILD_SHARED_LIBS=ON".to_string()));
        assert!(args.contains(
            &"-DCMAKE_RUNTIME_OUTPUT_DIRECTORY=/work/acme/build/bin".to_string()
        ));
        assert_eq!(args.last().map(String::as_str), Some("-DFOO=bar"));
    }

    #[test]
    fn test_static_option() {
        let mut inv = invocation();
        inv.options.shared = false;
        assert!(
            inv.configure_args()
                .contains(&"-DBUILD_SHARED_LIBS=OFF".to_string())
        );
    }

    #[test]
    fn test_build_args() {
        assert_eq!(
            invocation().build_args(),
            vec!["--build", "/work/acme/build", "--config", "Debug"]
        );
    }

    #[test]
    fn test_dry_run_executes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let inv = CmakeInvocation::new(
            dir.path(),
            &dir.path().join("build"),
            &BuildSettings::default(),
            &BuildOptions::default(),
        );
        inv.run(true, false).unwrap();
        assert!(!dir.path().join("build").exists());
    }
}
