//! Error taxonomy for configuration, build and test failures.

use std::path::PathBuf;

#[derive(Debug)]
pub enum PackageError {
    /// The config or `.env` file does not exist
    ConfigNotFound(PathBuf),
    /// A required key is absent from the loaded config
    MissingKey(String),
    /// A line that is neither blank, a comment, nor `KEY=VALUE` (strict mode only)
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },
    /// The external build tool exited unsuccessfully
    BuildFailure { stage: String, code: Option<i32> },
    /// One or more test binaries exited unsuccessfully
    TestFailure { failed: Vec<String>, total: usize },
}

impl std::fmt::Display for PackageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageError::ConfigNotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            PackageError::MissingKey(key) => write!(f, "Required key '{}' is not set", key),
            PackageError::MalformedLine {
                path,
                line,
                content,
            } => write!(
                f,
                "{}:{}: expected KEY=VALUE, found '{}'",
                path.display(),
                line,
                content
            ),
            PackageError::BuildFailure { stage, code } => match code {
                Some(code) => write!(f, "{} failed with exit code {}", stage, code),
                None => write!(f, "{} was terminated by a signal", stage),
            },
            PackageError::TestFailure { failed, total } => write!(
                f,
                "{}/{} test binaries failed: {}",
                failed.len(),
                total,
                failed.join(", ")
            ),
        }
    }
}

impl std::error::Error for PackageError {}

impl PackageError {
    /// Process exit code to report for this failure.
    ///
    /// Build failures surface the build tool's own status verbatim.
    pub fn exit_code(&self) -> i32 {
        match self {
            PackageError::BuildFailure { code: Some(code), .. } => *code,
            _ => 1,
        }
    }
}
