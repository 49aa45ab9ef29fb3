//! Build settings and package options.
//!
//! Settings describe the machine a package is built for; options describe
//! how it is linked. Both feed CMake and the package id.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSettings {
    pub os: String,
    pub compiler: String,
    pub build_type: String,
    pub arch: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            compiler: "gcc".to_string(),
            build_type: "Release".to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

impl BuildSettings {
    /// Settings for the host, with the compiler taken from `CXX`/`CC` when set.
    pub fn detect() -> Self {
        let compiler = std::env::var("CXX")
            .or_else(|_| std::env::var("CC"))
            .ok()
            .map(|path| compiler_family(&path))
            .unwrap_or_else(|| default_compiler().to_string());

        Self {
            compiler,
            ..Self::default()
        }
    }

    pub fn with_build_type(mut self, build_type: Option<&str>) -> Self {
        if let Some(bt) = build_type {
            self.build_type = normalize_build_type(bt);
        }
        self
    }

    /// Stable `key=value` lines, used when hashing the package id.
    pub fn identity_lines(&self) -> Vec<String> {
        vec![
            format!("arch={}", self.arch),
            format!("build_type={}", self.build_type),
            format!("compiler={}", self.compiler),
            format!("os={}", self.os),
        ]
    }
}

fn default_compiler() -> &'static str {
    if cfg!(target_os = "macos") {
        "apple-clang"
    } else if cfg!(windows) {
        "msvc"
    } else {
        "gcc"
    }
}

/// Map a compiler path like `/usr/bin/clang++-17` to its family name.
pub fn compiler_family(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path).to_lowercase();
    if file.starts_with("clang-cl") || file.starts_with("cl.exe") || file == "cl" {
        "msvc".to_string()
    } else if file.contains("clang") {
        "clang".to_string()
    } else if file.contains("g++") || file.contains("gcc") || file == "cc" || file == "c++" {
        "gcc".to_string()
    } else {
        file
    }
}

/// CMake build types are case-sensitive in multi-config generators.
pub fn normalize_build_type(value: &str) -> String {
    match value.to_lowercase().as_str() {
        "debug" => "Debug".to_string(),
        "release" => "Release".to_string(),
        "relwithdebinfo" => "RelWithDebInfo".to_string(),
        "minsizerel" => "MinSizeRel".to_string(),
        _ => value.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOptions {
    /// Build shared libraries (`BUILD_SHARED_LIBS=ON`)
    pub shared: bool,
    /// Also stage `*.a` archives into the package `lib/`
    pub stage_static_libs: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            shared: true,
            stage_static_libs: false,
        }
    }
}

impl BuildOptions {
    pub fn identity_lines(&self) -> Vec<String> {
        vec![format!("shared={}", self.shared)]
    }
}
