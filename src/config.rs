//! Project config parsing (`KEY=VALUE` files).
//!
//! The same format serves two files:
//!
//! - `config` at the project root, describing the package
//! - `out/.env`, persisted by `tset package` and read back by `tset test`
//!
//! Parsing is permissive: blank lines, `#` comments and lines without `=`
//! are skipped. [`PackageConfig::load_strict`] reports the malformed ones
//! instead.

use crate::error::PackageError;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Default project config file name.
pub const CONFIG_FILE: &str = "config";

pub const PROJECT_NAME: &str = "PROJECT_NAME";
pub const PROJECT_VERSION: &str = "PROJECT_VERSION";
pub const PROJECT_DESCRIPTION: &str = "PROJECT_DESCRIPTION";
pub const PROJECT_URL: &str = "PROJECT_URL";
pub const PROJECT_LICENSE: &str = "PROJECT_LICENSE";
pub const CONAN_REQUIRE: &str = "CONAN_REQUIRE";
pub const CONAN_USER: &str = "CONAN_USER";
pub const CONAN_CHANNEL: &str = "CONAN_CHANNEL";

/// Location of the persisted config handed from `package` to `test`.
pub fn env_file(project_root: &Path) -> PathBuf {
    project_root.join("out").join(".env")
}

/// How a single line of a config file was read.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Blank,
    Comment,
    Entry(String, String),
    Malformed(String),
}

pub fn classify_line(raw: &str) -> Line {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if line.starts_with('#') {
        return Line::Comment;
    }
    match line.split_once('=') {
        Some((key, value)) => Line::Entry(key.trim().to_string(), unquote(value.trim()).to_string()),
        None => Line::Malformed(line.to_string()),
    }
}

/// Parse one line into a `(key, value)` pair, or `None` if it carries no entry.
pub fn parse_line(raw: &str) -> Option<(String, String)> {
    match classify_line(raw) {
        Line::Entry(key, value) => Some((key, value)),
        _ => None,
    }
}

// Strip exactly one layer of matching quotes. A lone quote character
// counts as both ends and unquotes to the empty string.
fn unquote(value: &str) -> &str {
    let (Some(first), Some(last)) = (value.chars().next(), value.chars().last()) else {
        return value;
    };
    if first != last || !matches!(first, '"' | '\'') {
        return value;
    }
    if value.len() == 1 {
        ""
    } else {
        &value[1..value.len() - 1]
    }
}

/// Lazy sequence of entries in file order.
pub struct ConfigEntries<R> {
    lines: Lines<R>,
}

impl<R: BufRead> ConfigEntries<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for ConfigEntries<R> {
    type Item = std::io::Result<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    if let Some(entry) = parse_line(&line) {
                        return Some(Ok(entry));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Open `path` and iterate its entries.
pub fn read_entries(path: &Path) -> Result<ConfigEntries<BufReader<File>>> {
    if !path.exists() {
        return Err(PackageError::ConfigNotFound(path.to_path_buf()).into());
    }
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(ConfigEntries::new(BufReader::new(file)))
}

/// Key/value mapping loaded from a config file. Later duplicates win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageConfig {
    values: BTreeMap<String, String>,
}

impl PackageConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        for entry in read_entries(path)? {
            let (key, value) =
                entry.with_context(|| format!("Failed to read {}", path.display()))?;
            config.insert(key, value);
        }
        Ok(config)
    }

    /// Like [`PackageConfig::load`], but a malformed line is an error.
    pub fn load_strict(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PackageError::ConfigNotFound(path.to_path_buf()).into());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut config = Self::default();
        for (idx, raw) in content.lines().enumerate() {
            match classify_line(raw) {
                Line::Entry(key, value) => config.insert(key, value),
                Line::Malformed(content) => {
                    return Err(PackageError::MalformedLine {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        content,
                    }
                    .into());
                }
                Line::Blank | Line::Comment => {}
            }
        }
        Ok(config)
    }

    pub fn parse(text: &str) -> Self {
        text.lines().filter_map(parse_line).collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, treating an empty value the same as a missing one.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> std::result::Result<&str, PackageError> {
        self.get(key)
            .ok_or_else(|| PackageError::MissingKey(key.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render as `KEY=VALUE` lines that parse back to the same mapping.
    pub fn to_env_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.values {
            out.push_str(key);
            out.push('=');
            out.push_str(&quote_if_needed(value));
            out.push('\n');
        }
        out
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_env_string())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl FromIterator<(String, String)> for PackageConfig {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut config = Self::default();
        for (key, value) in iter {
            config.insert(key, value);
        }
        config
    }
}

// Values with spaces or `#` are always quoted, as are values that would
// otherwise lose padding or a quote layer on re-read.
fn quote_if_needed(value: &str) -> String {
    let padded = value != value.trim();
    let looks_quoted = unquote(value).len() != value.len();
    let spaced = value.contains(|c: char| c.is_whitespace() || c == '#');
    if !padded && !looks_quoted && !spaced {
        return value.to_string();
    }
    let quote = if value.starts_with('"') { '\'' } else { '"' };
    format!("{quote}{value}{quote}")
}
