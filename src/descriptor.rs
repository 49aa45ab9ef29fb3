//! Package identity derived from the project config.
//!
//! A [`PackageDescriptor`] is a snapshot: it checks the file system once when
//! built and is never refreshed. Rebuild it for each build step.

use crate::config::{self, PackageConfig};
use crate::settings::{BuildOptions, BuildSettings};
use anyhow::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where package identity comes from.
#[derive(Debug, Clone)]
pub enum DescriptorSource {
    /// `PROJECT_*` / `CONAN_*` variables of the current process
    Environment,
    /// A `KEY=VALUE` config file
    ConfigFile(PathBuf),
}

const RECOGNIZED_KEYS: [&str; 8] = [
    config::PROJECT_NAME,
    config::PROJECT_VERSION,
    config::PROJECT_DESCRIPTION,
    config::PROJECT_URL,
    config::PROJECT_LICENSE,
    config::CONAN_REQUIRE,
    config::CONAN_USER,
    config::CONAN_CHANNEL,
];

/// Load the raw config for `source`.
pub fn load_config(source: &DescriptorSource, strict: bool) -> Result<PackageConfig> {
    match source {
        DescriptorSource::Environment => Ok(config_from_vars(std::env::vars())),
        DescriptorSource::ConfigFile(path) if strict => PackageConfig::load_strict(path),
        DescriptorSource::ConfigFile(path) => PackageConfig::load(path),
    }
}

/// Keep only the recognized keys out of a set of environment variables.
pub fn config_from_vars<I>(vars: I) -> PackageConfig
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(key, _)| RECOGNIZED_KEYS.contains(&key.as_str()))
        .collect()
}

pub fn load_descriptor(source: &DescriptorSource, project_root: &Path) -> Result<PackageDescriptor> {
    let config = load_config(source, false)?;
    PackageDescriptor::from_config(&config, project_root)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub license: String,
    /// `None` means no constraint, which is not the same as zero requirements.
    pub requires: Option<Vec<String>>,
    pub is_header_only: bool,
}

impl PackageDescriptor {
    pub fn from_config(config: &PackageConfig, project_root: &Path) -> Result<Self> {
        Ok(Self {
            name: config.require(config::PROJECT_NAME)?.to_string(),
            version: config.require(config::PROJECT_VERSION)?.to_string(),
            description: config.get_non_empty(config::PROJECT_DESCRIPTION).map(String::from),
            url: config.get_non_empty(config::PROJECT_URL).map(String::from),
            license: config
                .get_non_empty(config::PROJECT_LICENSE)
                .unwrap_or("Proprietary")
                .to_string(),
            requires: resolve_requirements(config),
            is_header_only: is_header_only(project_root),
        })
    }

    /// `name/version`
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// Binary identity of this package for the given settings.
    ///
    /// Header-only packages have one identity regardless of settings and options.
    pub fn package_id(&self, settings: &BuildSettings, options: &BuildOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("name={}\n", self.name));
        hasher.update(format!("version={}\n", self.version));
        if !self.is_header_only {
            for line in settings.identity_lines().iter().chain(&options.identity_lines()) {
                hasher.update(line.as_bytes());
                hasher.update(b"\n");
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Dependency specifiers from `CONAN_REQUIRE`, with `{user}` and `{channel}`
/// filled in from `CONAN_USER` / `CONAN_CHANNEL`.
pub fn resolve_requirements(config: &PackageConfig) -> Option<Vec<String>> {
    let require = config.get_non_empty(config::CONAN_REQUIRE)?;
    let user = config.get(config::CONAN_USER).unwrap_or("");
    let channel = config.get(config::CONAN_CHANNEL).unwrap_or("");

    let resolved = require.replace("{user}", user).replace("{channel}", channel);
    Some(resolved.split(',').map(str::to_string).collect())
}

/// True when `src/` is missing or holds no files.
pub fn is_header_only(project_root: &Path) -> bool {
    let src = project_root.join("src");
    if !src.is_dir() {
        return true;
    }
    !WalkDir::new(&src)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file())
}

/// Which output directories exist in a package tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingTree {
    pub has_include_dir: bool,
    pub has_lib_dir: bool,
}

impl StagingTree {
    pub fn snapshot(package_dir: &Path) -> Self {
        Self {
            has_include_dir: package_dir.join("include").is_dir(),
            has_lib_dir: package_dir.join("lib").is_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(text: &str) -> PackageConfig {
        PackageConfig::parse(text)
    }

    #[test]
    fn test_requirements_split() {
        let cfg = config("CONAN_REQUIRE=libfoo/1.0,libbar/2.0");
        assert_eq!(
            resolve_requirements(&cfg),
            Some(vec!["libfoo/1.0".to_string(), "libbar/2.0".to_string()])
        );
    }

    #[test]
    fn test_requirements_absent_or_empty_is_none() {
        assert_eq!(resolve_requirements(&config("PROJECT_NAME=x")), None);
        assert_eq!(resolve_requirements(&config("CONAN_REQUIRE=")), None);
        assert_eq!(resolve_requirements(&config("CONAN_REQUIRE=''")), None);
    }

    #[test]
    fn test_requirements_placeholders() {
        let cfg = config(
            "CONAN_REQUIRE=libfoo/1.0@{user}/{channel},libbar/2.0\nCONAN_USER=acme\nCONAN_CHANNEL=stable",
        );
        assert_eq!(
            resolve_requirements(&cfg),
            Some(vec![
                "libfoo/1.0@acme/stable".to_string(),
                "libbar/2.0".to_string()
            ])
        );

        let cfg = config("CONAN_REQUIRE=libfoo/1.0@{user}/{channel}");
        assert_eq!(resolve_requirements(&cfg), Some(vec!["libfoo/1.0@/".to_string()]));
    }

    #[test]
    fn test_header_only_detection() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_header_only(dir.path()));

        fs::create_dir_all(dir.path().join("src").join("nested")).unwrap();
        assert!(is_header_only(dir.path()));

        fs::write(dir.path().join("src").join("nested").join("lib.cpp"), "").unwrap();
        assert!(!is_header_only(dir.path()));
    }

    #[test]
    fn test_descriptor_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(
            "PROJECT_NAME=acme\nPROJECT_VERSION=1.0.0\nPROJECT_URL=\"https://example.com/acme\"\n",
        );
        let desc = PackageDescriptor::from_config(&cfg, dir.path()).unwrap();
        assert_eq!(desc.reference(), "acme/1.0.0");
        assert_eq!(desc.url.as_deref(), Some("https://example.com/acme"));
        assert_eq!(desc.description, None);
        assert_eq!(desc.license, "Proprietary");
        assert_eq!(desc.requires, None);
        assert!(desc.is_header_only);
    }

    #[test]
    fn test_descriptor_requires_name_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let err = PackageDescriptor::from_config(&config("PROJECT_NAME=acme"), dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("PROJECT_VERSION"));
    }

    #[test]
    fn test_config_from_vars_filters_keys() {
        let vars = vec![
            ("PROJECT_NAME".to_string(), "acme".to_string()),
            ("HOME".to_string(), "/root".to_string()),
            ("PROJECT_VERSION".to_string(), "0.1".to_string()),
        ];
        let cfg = config_from_vars(vars);
        assert_eq!(cfg.len(), 2);
        assert_eq!(cfg.get("HOME"), None);
    }

    #[test]
    fn test_package_id_header_only_ignores_settings() {
        let mut desc = PackageDescriptor {
            name: "acme".into(),
            version: "1.0".into(),
            description: None,
            url: None,
            license: "MIT".into(),
            requires: None,
            is_header_only: true,
        };
        let release = BuildSettings::default();
        let debug = BuildSettings::default().with_build_type(Some("Debug"));
        let shared = BuildOptions::default();
        let static_ = BuildOptions {
            shared: false,
            ..BuildOptions::default()
        };

        assert_eq!(
            desc.package_id(&release, &shared),
            desc.package_id(&debug, &static_)
        );

        desc.is_header_only = false;
        assert_ne!(desc.package_id(&release, &shared), desc.package_id(&debug, &shared));
        assert_ne!(desc.package_id(&release, &shared), desc.package_id(&release, &static_));
        assert_eq!(desc.package_id(&release, &shared).len(), 64);
    }

    #[test]
    fn test_staging_tree_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("include")).unwrap();
        let tree = StagingTree::snapshot(dir.path());
        assert!(tree.has_include_dir);
        assert!(!tree.has_lib_dir);
    }
}
