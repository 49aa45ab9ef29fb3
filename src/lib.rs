//! # tset - CMake package builder
//!
//! tset builds a C/C++ library or executable with CMake, lays the outputs out
//! as a package (`bin/`, `include/`, `lib/`), publishes what consumers need
//! to link against it, and runs the package's test binaries.
//!
//! The project is described by a flat `KEY=VALUE` file:
//!
//! ```text
//! PROJECT_NAME=acme
//! PROJECT_VERSION=1.2.0
//! CONAN_REQUIRE=fmt/10.2.1@{user}/{channel}
//! CONAN_USER=acme
//! CONAN_CHANNEL=stable
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `KEY=VALUE` parsing and persistence
//! - [`descriptor`] - Package identity and header-only detection
//! - [`build`] - Build, package, publish, deploy and test stages
//! - [`settings`] - Build settings and package options

/// Build orchestration stages.
pub mod build;

/// `KEY=VALUE` config file parsing.
pub mod config;

/// Package identity derived from the config.
pub mod descriptor;

/// Error taxonomy.
pub mod error;

/// Build settings and package options.
pub mod settings;

/// Terminal UI utilities (tables).
pub mod ui;
