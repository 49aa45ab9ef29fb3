//! Package assembly: copy build outputs into `bin/`, `include/` and `lib/`.
//!
//! File classification lives in small named predicates so the policy can be
//! tested on its own. Rules run in order and a later copy overwrites an
//! earlier one with the same destination.

use crate::settings::BuildOptions;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Test executables are named `test*` and never ship in `bin/`.
pub fn is_test_artifact(name: &str) -> bool {
    name.starts_with("test")
}

/// `libfoo.so`, `libfoo.so.1.2` and `libfoo.dylib`.
pub fn is_shared_library(name: &str) -> bool {
    if name.ends_with(".so") || name.ends_with(".dylib") {
        return true;
    }
    match name.split_once(".so.") {
        Some((stem, version)) => {
            !stem.is_empty()
                && version
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        }
        None => false,
    }
}

pub fn is_static_library(name: &str) -> bool {
    name.ends_with(".a")
}

pub fn is_header(name: &str) -> bool {
    name.ends_with(".h")
}

/// Shell-style file name pattern (`*` and `?`).
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self> {
        let mut re = String::from("^");
        for c in pattern.chars() {
            match c {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                _ => re.push_str(&regex::escape(&c.to_string())),
            }
        }
        re.push('$');
        let regex = Regex::new(&re).with_context(|| format!("Invalid pattern '{}'", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Selects files by name.
#[derive(Debug, Clone)]
pub enum Selector {
    Glob(Glob),
    Named(&'static str, fn(&str) -> bool),
}

impl Selector {
    pub fn glob(pattern: &str) -> Result<Self> {
        Ok(Selector::Glob(Glob::new(pattern)?))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Selector::Glob(glob) => glob.matches(name),
            Selector::Named(_, predicate) => predicate(name),
        }
    }

    pub fn describe(&self) -> &str {
        match self {
            Selector::Glob(glob) => glob.pattern.as_str(),
            Selector::Named(name, _) => *name,
        }
    }
}

/// Which tree a rule reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The project checkout (headers)
    Source,
    /// The CMake build directory
    Build,
}

#[derive(Debug, Clone)]
pub struct CopyRule {
    pub origin: Origin,
    /// Directory under the origin to walk; empty for the whole tree
    pub src: PathBuf,
    /// Directory under the destination root
    pub dst: PathBuf,
    pub select: Selector,
    pub excludes: Vec<Selector>,
    /// Preserve the path relative to `src`, otherwise flatten to the file name
    pub keep_path: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Default)]
pub struct AssemblyReport {
    pub copied: Vec<CopiedFile>,
}

impl AssemblyReport {
    /// Destinations under `dir`, sorted and deduplicated.
    pub fn files_in(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .copied
            .iter()
            .filter(|c| c.to.starts_with(dir))
            .map(|c| c.to.clone())
            .collect();
        files.sort();
        files.dedup();
        files
    }
}

impl CopyRule {
    pub fn apply(&self, src_root: &Path, dst_root: &Path, report: &mut AssemblyReport) -> Result<()> {
        let src = src_root.join(&self.src);
        if !src.is_dir() {
            return Ok(());
        }
        let dst = dst_root.join(&self.dst);

        let walker = WalkDir::new(&src)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            // never re-read what this rule writes, e.g. a package under the build tree
            .filter_entry(|e| !e.path().starts_with(&dst));

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
            let path = entry.path();
            let is_file = entry.file_type().is_file() || (entry.path_is_symlink() && path.is_file());
            if !is_file {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !self.select.matches(&name) || self.excludes.iter().any(|e| e.matches(&name)) {
                continue;
            }

            let target = if self.keep_path {
                dst.join(path.strip_prefix(&src)?)
            } else {
                dst.join(entry.file_name())
            };

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::copy(path, &target).with_context(|| {
                format!("Failed to copy {} to {}", path.display(), target.display())
            })?;

            report.copied.push(CopiedFile {
                from: path.to_path_buf(),
                to: target,
            });
        }
        Ok(())
    }
}

/// The packaging rules, in order:
///
/// 1. build `bin/` -> `bin/`, minus test executables and shared libraries
/// 2. source `include/**/*.h` -> `include/`, keeping the tree
/// 3. shared libraries (and optionally `*.a`) anywhere in the build -> `lib/`, flattened
pub fn package_rules(options: &BuildOptions) -> Result<Vec<CopyRule>> {
    let mut rules = vec![
        CopyRule {
            origin: Origin::Build,
            src: PathBuf::from("bin"),
            dst: PathBuf::from("bin"),
            select: Selector::glob("*")?,
            excludes: vec![
                Selector::Named("test*", is_test_artifact),
                Selector::Named("*.so", is_shared_library),
            ],
            keep_path: true,
        },
        CopyRule {
            origin: Origin::Source,
            src: PathBuf::from("include"),
            dst: PathBuf::from("include"),
            select: Selector::Named("*.h", is_header),
            excludes: Vec::new(),
            keep_path: true,
        },
    ];

    if options.stage_static_libs {
        rules.push(CopyRule {
            origin: Origin::Build,
            src: PathBuf::new(),
            dst: PathBuf::from("lib"),
            select: Selector::Named("*.a", is_static_library),
            excludes: Vec::new(),
            keep_path: false,
        });
    }

    rules.push(CopyRule {
        origin: Origin::Build,
        src: PathBuf::new(),
        dst: PathBuf::from("lib"),
        select: Selector::Named("*.so", is_shared_library),
        excludes: Vec::new(),
        keep_path: false,
    });

    Ok(rules)
}

/// Run `rules` against the project and build trees into `package_dir`.
pub fn assemble(
    rules: &[CopyRule],
    project_root: &Path,
    build_dir: &Path,
    package_dir: &Path,
) -> Result<AssemblyReport> {
    let mut report = AssemblyReport::default();
    for rule in rules {
        let src_root = match rule.origin {
            Origin::Source => project_root,
            Origin::Build => build_dir,
        };
        rule.apply(src_root, package_dir, &mut report)?;
    }
    Ok(report)
}
