//! Consumer metadata for an assembled package (`package_info.json`).

use crate::descriptor::{PackageDescriptor, StagingTree};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const PACKAGE_INFO_FILE: &str = "package_info.json";

/// Dynamic loader search path variables (Linux, macOS).
pub const RUNTIME_PATH_VARS: [&str; 2] = ["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub package_id: String,
    pub header_only: bool,
    /// Relative to the package root
    pub include_dirs: Vec<String>,
    pub libs: Vec<String>,
    /// Relative to the package root
    pub lib_dirs: Vec<String>,
    /// Environment for consumers, with the package `lib/` appended
    pub env: BTreeMap<String, String>,
}

impl PackageInfo {
    /// Derive consumer metadata. `current_env` supplies the existing value of
    /// a variable so the package lib dir is appended rather than replacing it.
    pub fn collect<F>(
        descriptor: &PackageDescriptor,
        tree: StagingTree,
        package_dir: &Path,
        package_id: String,
        current_env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut info = Self {
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            package_id,
            header_only: descriptor.is_header_only,
            include_dirs: Vec::new(),
            libs: Vec::new(),
            lib_dirs: Vec::new(),
            env: BTreeMap::new(),
        };

        if tree.has_include_dir {
            info.include_dirs.push("include".to_string());
        }

        if tree.has_lib_dir || !descriptor.is_header_only {
            info.libs.push(descriptor.name.clone());
            info.lib_dirs.push("lib".to_string());

            let lib_dir = package_dir.join("lib");
            for var in RUNTIME_PATH_VARS {
                let value = append_search_path(current_env(var), &lib_dir)?;
                info.env
                    .insert(var.to_string(), value.to_string_lossy().to_string());
            }
        }

        Ok(info)
    }

    pub fn write(&self, package_dir: &Path) -> Result<PathBuf> {
        let path = package_dir.join(PACKAGE_INFO_FILE);
        fs::create_dir_all(package_dir)
            .with_context(|| format!("Failed to create {}", package_dir.display()))?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn read(package_dir: &Path) -> Result<Self> {
        let path = package_dir.join(PACKAGE_INFO_FILE);
        let content = fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read {} - run 'tset package' first",
                path.display()
            )
        })?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// `export VAR=value` lines for a POSIX shell.
    pub fn shell_exports(&self) -> Vec<String> {
        self.env
            .iter()
            .map(|(k, v)| format!("export {}=\"{}\"", k, v))
            .collect()
    }
}

/// Append `dir` to a `PATH`-style list unless it is already present.
pub fn append_search_path(existing: Option<OsString>, dir: &Path) -> Result<OsString> {
    let mut paths: Vec<PathBuf> = existing
        .as_deref()
        .map(|v| std::env::split_paths(v).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default();
    if !paths.iter().any(|p| p == dir) {
        paths.push(dir.to_path_buf());
    }
    std::env::join_paths(paths).context("Library path contains a path separator")
}
