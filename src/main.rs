//! # tset CLI Entry Point
//!
//! Parses CLI arguments with clap and routes commands to the library.
//!
//! ## Command Structure
//!
//! - **Stages**: `build`, `package`, `test`, `deploy`
//! - **Project**: `init`, `info`, `clean`
//! - **Shell**: `completion`

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use inquire::Text;
use std::path::{Path, PathBuf};

use tset::build::{self, Orchestrator, OrchestratorConfig, PackageInfo};
use tset::config::{self, PackageConfig};
use tset::descriptor::{self, DescriptorSource, PackageDescriptor};
use tset::error::PackageError;
use tset::settings::{BuildOptions, BuildSettings};
use tset::ui;

#[derive(Parser)]
#[command(name = "tset")]
#[command(about = "Build, package and test C/C++ libraries with CMake", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Project config file, relative to the root
    #[arg(long, global = true, default_value = config::CONFIG_FILE)]
    config: PathBuf,
    /// Read PROJECT_* values from the environment instead of the config file
    #[arg(long, global = true)]
    from_env: bool,
    /// Reject malformed config lines instead of skipping them
    #[arg(long, global = true)]
    strict: bool,
    /// Show executed commands and copied files
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct BuildArgs {
    /// CMake build type (Debug, Release, RelWithDebInfo, MinSizeRel) [default: Release]
    #[arg(long)]
    build_type: Option<String>,
    /// Link statically (BUILD_SHARED_LIBS=OFF)
    #[arg(long = "static")]
    static_link: bool,
    /// Also stage static libraries (*.a) into the package lib/
    #[arg(long)]
    static_libs: bool,
    /// Show what would be executed without running
    #[arg(long)]
    dry_run: bool,
    /// Build directory [default: <root>/build]
    #[arg(long)]
    build_dir: Option<PathBuf>,
    /// Package directory [default: <root>/package]
    #[arg(long)]
    package_dir: Option<PathBuf>,
}

/// Settings and directories only, for commands that never build.
#[derive(Args, Clone, Default)]
struct InfoArgs {
    /// CMake build type used for the package id [default: Release]
    #[arg(long)]
    build_type: Option<String>,
    /// Report the id of a static build
    #[arg(long = "static")]
    static_link: bool,
    /// Build directory [default: <root>/build]
    #[arg(long)]
    build_dir: Option<PathBuf>,
    /// Package directory [default: <root>/package]
    #[arg(long)]
    package_dir: Option<PathBuf>,
}

impl From<&InfoArgs> for BuildArgs {
    fn from(args: &InfoArgs) -> Self {
        BuildArgs {
            build_type: args.build_type.clone(),
            static_link: args.static_link,
            build_dir: args.build_dir.clone(),
            package_dir: args.package_dir.clone(),
            ..BuildArgs::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Configure and build the project with CMake
    Build(BuildArgs),
    /// Build, assemble the package tree and publish its metadata
    Package(BuildArgs),
    /// Build the tests/ project against the package and run its test binaries
    Test {
        #[command(flatten)]
        build: BuildArgs,
        /// Only run test binaries whose name contains this string
        #[arg(long)]
        filter: Option<String>,
    },
    /// Copy the package bin/ and lib/ into <DEST>/bin
    Deploy {
        /// Deployment root, relative to --root
        dest: PathBuf,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Show package identity and published metadata
    Info(InfoArgs),
    /// Remove build and package directories
    Clean {
        /// Also remove out/ (the persisted .env)
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Write a new config file
    Init {
        /// Package name (prompted if omitted)
        name: Option<String>,
        /// Package version
        #[arg(long = "pkg-version")]
        pkg_version: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Comma-separated requirements (may use {user} and {channel})
        #[arg(long)]
        require: Option<String>,
        /// Accept defaults instead of prompting
        #[arg(short, long)]
        yes: bool,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "x".red(), e);
        let code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<PackageError>())
            .map(PackageError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = std::path::absolute(&cli.root)
        .with_context(|| format!("Invalid project root {}", cli.root.display()))?;
    let source = if cli.from_env {
        DescriptorSource::Environment
    } else {
        DescriptorSource::ConfigFile(root.join(&cli.config))
    };

    match &cli.command {
        Some(Commands::Build(args)) => orchestrator(&cli, &root, &source, args)?.build(),
        Some(Commands::Package(args)) => {
            let info = orchestrator(&cli, &root, &source, args)?.run()?;
            print_exports(&info);
            Ok(())
        }
        Some(Commands::Test {
            build: args,
            filter,
        }) => {
            let config = orchestrator_config(&root, args, cli.verbose);
            build::run_tests(&config, filter.as_deref())?;
            Ok(())
        }
        Some(Commands::Deploy { dest, build: args }) => {
            let config = orchestrator_config(&root, args, cli.verbose);
            build::deploy(&config.package_dir, &root.join(dest))?;
            Ok(())
        }
        Some(Commands::Info(args)) => print_info(&cli, &root, &source, &BuildArgs::from(args)),
        Some(Commands::Clean { all, build: args }) => {
            let config = orchestrator_config(&root, args, cli.verbose);
            build::clean(&config, *all)?;
            Ok(())
        }
        Some(Commands::Init {
            name,
            pkg_version,
            description,
            url,
            require,
            yes,
        }) => init_project(
            &root.join(&cli.config),
            InitValues {
                name: name.clone(),
                version: pkg_version.clone(),
                description: description.clone(),
                url: url.clone(),
                require: require.clone(),
            },
            *yes,
        ),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
        None => {
            print_overview();
            Ok(())
        }
    }
}

fn orchestrator_config(root: &Path, args: &BuildArgs, verbose: bool) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::new(root);
    if let Some(dir) = &args.build_dir {
        config.build_dir = root.join(dir);
    }
    if let Some(dir) = &args.package_dir {
        config.package_dir = root.join(dir);
    }
    config.settings = BuildSettings::detect().with_build_type(args.build_type.as_deref());
    config.options = BuildOptions {
        shared: !args.static_link,
        stage_static_libs: args.static_libs,
    };
    config.dry_run = args.dry_run;
    config.verbose = verbose;
    config
}

fn orchestrator(
    cli: &Cli,
    root: &Path,
    source: &DescriptorSource,
    args: &BuildArgs,
) -> Result<Orchestrator> {
    let package_config = descriptor::load_config(source, cli.strict)?;
    Orchestrator::new(orchestrator_config(root, args, cli.verbose), package_config)
}

fn print_exports(info: &PackageInfo) {
    let exports = info.shell_exports();
    if exports.is_empty() {
        return;
    }
    println!("\n{}", "Consumer environment:".bold());
    for line in exports {
        println!("   {}", line);
    }
}

fn print_info(cli: &Cli, root: &Path, source: &DescriptorSource, args: &BuildArgs) -> Result<()> {
    let orch = orchestrator(cli, root, source, args)?;
    let desc: &PackageDescriptor = orch.descriptor();
    let config = orch.config();

    println!("{} v{}", "tset".bold().cyan(), env!("CARGO_PKG_VERSION"));
    let mut table = ui::Table::new(&["Field", "Value"]);
    let mut row = |key: &str, value: String| table.add_row(vec![key.bold().to_string(), value]);

    row("Name", desc.name.green().to_string());
    row("Version", desc.version.clone());
    row("Description", desc.description.clone().unwrap_or_else(|| "-".into()));
    row("URL", desc.url.clone().unwrap_or_else(|| "-".into()));
    row("License", desc.license.clone());
    row(
        "Requires",
        match &desc.requires {
            Some(reqs) => reqs.join(", "),
            None => "(unconstrained)".dimmed().to_string(),
        },
    );
    row(
        "Type",
        if desc.is_header_only {
            "header-only".yellow().to_string()
        } else {
            "binary".cyan().to_string()
        },
    );
    row(
        "Settings",
        format!(
            "{} {} {} {}",
            config.settings.os,
            config.settings.arch,
            config.settings.compiler,
            config.settings.build_type
        ),
    );
    row("Package ID", orch.package_id());

    if let Ok(info) = PackageInfo::read(&config.package_dir) {
        row("Include dirs", info.include_dirs.join(", "));
        row("Libs", info.libs.join(", "));
    }
    table.print();
    Ok(())
}

struct InitValues {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    url: Option<String>,
    require: Option<String>,
}

fn init_project(path: &Path, values: InitValues, yes: bool) -> Result<()> {
    if path.exists() {
        println!(
            "{} Error: Project already initialized ({} exists).",
            "x".red(),
            path.display()
        );
        return Ok(());
    }

    let dir_name = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "my-lib".to_string());

    let name = match values.name {
        Some(n) => n,
        None if yes => dir_name,
        None => Text::new("Package name?").with_default(&dir_name).prompt()?,
    };
    let version = match values.version {
        Some(v) => v,
        None if yes => "0.1.0".to_string(),
        None => Text::new("Version?").with_default("0.1.0").prompt()?,
    };
    let description = match values.description {
        Some(d) => d,
        None if yes => String::new(),
        None => Text::new("Description?").with_default("").prompt()?,
    };

    let mut config = PackageConfig::default();
    config.insert(config::PROJECT_NAME, name.clone());
    config.insert(config::PROJECT_VERSION, version);
    if !description.is_empty() {
        config.insert(config::PROJECT_DESCRIPTION, description);
    }
    if let Some(url) = values.url {
        config.insert(config::PROJECT_URL, url);
    }
    if let Some(require) = values.require {
        config.insert(config::CONAN_REQUIRE, require);
    }
    config.save(path)?;

    println!(
        "{} Created {} for {}. Run {} to build it.",
        "✓".green(),
        path.display(),
        name.bold(),
        "tset package".bold().white()
    );
    Ok(())
}

fn print_overview() {
    println!(
        "{} v{} - {}",
        "tset".bold().cyan(),
        env!("CARGO_PKG_VERSION"),
        "CMake package builder".dimmed().italic()
    );
    println!();

    let mut table = ui::Table::new(&["Category", "Commands"]);
    table.add_row(vec![
        "Stages".bold().yellow().to_string(),
        format!(
            "{}, {}, {}, {}",
            "build".cyan(),
            "package".cyan(),
            "test".cyan(),
            "deploy".cyan()
        ),
    ]);
    table.add_row(vec![
        "Project".bold().green().to_string(),
        format!("{}, {}, {}", "init".cyan(), "info".cyan(), "clean".cyan()),
    ]);
    table.print();
    println!();
    println!("   Run {} for detailed usage.", "tset --help".white().bold());
}
