//! Crashgroup CLI
//!
//! Stores incoming crash reports and groups them by the first
//! symbolicated application frame of the crashed thread.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::{Path, PathBuf};

use crashgroup::aggregator::GroupReport;
use crashgroup::commands::{
    execute_annotate, execute_groups, execute_ingest, execute_regroup, execute_signature,
    execute_update_log, execute_version_status, RegroupScope,
};
use crashgroup::output::read_submission;
use crashgroup::parser::SignatureOutcome;
use crashgroup::store::{CrashStore, VersionStatus};
use crashgroup::utils::config::{Settings, DEFAULT_DB_PATH, SCHEMA_VERSION};

/// Crashgroup - crash signature extraction and grouping
#[derive(Parser, Debug)]
#[command(name = "crashgroup")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the crash database
    #[arg(long, global = true, env = "CRASHGROUP_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Path to the TOML settings file
    #[arg(long, global = true, env = "CRASHGROUP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a crash submission and assign it to a group
    Ingest {
        /// Path to submission JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Re-run stored crashes through signature extraction and grouping
    Regroup {
        /// Single crash to regroup
        #[arg(long, conflicts_with_all = ["bundle", "app_version", "group"])]
        crash: Option<i64>,

        /// Regroup every crash of this application
        #[arg(long, required_unless_present = "crash")]
        bundle: Option<String>,

        /// Restrict to one application version
        #[arg(long = "version")]
        app_version: Option<String>,

        /// Restrict to crashes currently in this group (0 = ungrouped)
        #[arg(long, requires = "app_version")]
        group: Option<i64>,
    },

    /// Replace the log of a crash (e.g. after symbolication) and regroup it
    UpdateLog {
        /// Crash to update
        #[arg(long)]
        crash: i64,

        /// Path to the new log text
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the groups of one application version
    Groups {
        #[arg(long)]
        bundle: String,

        #[arg(long = "version")]
        app_version: String,

        /// Output path for JSON report (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Set the fix version or description of a group
    Annotate {
        #[arg(long)]
        group: i64,

        /// Version that fixes this crash
        #[arg(long)]
        fix: Option<String>,

        /// Replacement description
        #[arg(long)]
        description: Option<String>,
    },

    /// Set the status of an application version
    VersionStatus {
        #[arg(long)]
        bundle: String,

        #[arg(long = "version")]
        app_version: String,

        /// unknown, assigned, submitted, available or discontinued
        #[arg(long)]
        status: String,
    },

    /// Print the signature of a crash log without storing anything
    Signature {
        /// Path to crash log text
        #[arg(short, long)]
        file: PathBuf,

        /// Application name as it appears in frame lines
        #[arg(long)]
        app: String,

        /// Bundle identifier, tried when the name does not match
        #[arg(long)]
        bundle: Option<String>,
    },

    /// Display report schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Ingest { file } => {
            let settings = load_settings(cli.config.as_deref())?;
            let submission = read_submission(&file)
                .with_context(|| format!("Failed to read submission {}", file.display()))?;
            let mut store = open_store(&cli.db)?;

            let outcome = execute_ingest(&mut store, &settings, &submission)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::Regroup {
            crash,
            bundle,
            app_version,
            group,
        } => {
            let settings = load_settings(cli.config.as_deref())?;
            let scope = regroup_scope(crash, bundle, app_version, group)?;
            let mut store = open_store(&cli.db)?;

            let summary = execute_regroup(&mut store, &settings, &scope)?;
            println!("{}", summary.summary());
        }

        Commands::UpdateLog { crash, file } => {
            let settings = load_settings(cli.config.as_deref())?;
            let log_text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read log {}", file.display()))?;
            let mut store = open_store(&cli.db)?;

            let resolution = execute_update_log(&mut store, &settings, crash, &log_text)?;
            println!("Crash {} is in group {}", crash, resolution.group_id);
        }

        Commands::Groups {
            bundle,
            app_version,
            output,
        } => {
            let store = open_store(&cli.db)?;
            let report = execute_groups(&store, &bundle, &app_version, output.as_deref())?;
            print_report(&report);
        }

        Commands::Annotate {
            group,
            fix,
            description,
        } => {
            if fix.is_none() && description.is_none() {
                anyhow::bail!("Nothing to change: pass --fix and/or --description");
            }
            let mut store = open_store(&cli.db)?;
            let updated =
                execute_annotate(&mut store, group, fix.as_deref(), description.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }

        Commands::VersionStatus {
            bundle,
            app_version,
            status,
        } => {
            let status: VersionStatus = status.parse()?;
            let mut store = open_store(&cli.db)?;
            execute_version_status(&mut store, &bundle, &app_version, status)?;
        }

        Commands::Signature { file, app, bundle } => {
            let log_text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read log {}", file.display()))?;

            match execute_signature(&log_text, &app, bundle.as_deref()) {
                SignatureOutcome::Found(signature) => {
                    println!("Pattern: {}", signature.pattern);
                    println!("Block:   {:?}", signature.block);
                    println!("Frame:   {}", signature.frame.trim());
                }
                SignatureOutcome::Miss(reason) => {
                    println!("No signature: {}", reason);
                }
            }
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Load settings from `path`, or defaults when none is given
///
/// **Private** - internal command helper
fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings {}", path.display())),
        None => Ok(Settings::default()),
    }
}

/// **Private** - internal command helper
fn open_store(path: &Path) -> Result<CrashStore> {
    CrashStore::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Build the regroup scope from CLI flags
///
/// **Private** - internal command helper
fn regroup_scope(
    crash: Option<i64>,
    bundle: Option<String>,
    app_version: Option<String>,
    group: Option<i64>,
) -> Result<RegroupScope> {
    let scope = match (crash, bundle, app_version, group) {
        (Some(id), _, _, _) => RegroupScope::Crash(id),
        (None, Some(bundle_identifier), Some(affected_version), Some(group_id)) => {
            RegroupScope::Group {
                bundle_identifier,
                affected_version,
                group_id,
            }
        }
        (None, Some(bundle_identifier), Some(affected_version), None) => RegroupScope::Version {
            bundle_identifier,
            affected_version,
        },
        (None, Some(bundle_identifier), None, None) => RegroupScope::Bundle(bundle_identifier),
        _ => anyhow::bail!("Pass --crash, or --bundle with optional --version and --group"),
    };
    Ok(scope)
}

/// Print a group report as text
///
/// **Private** - internal command implementation
fn print_report(report: &GroupReport) {
    println!("\n{}", "=".repeat(80));
    println!("GROUPS: {} {}", report.bundle_identifier, report.affected_version);
    println!("{}", "=".repeat(80));
    println!("Crashes:   {}", report.total_crashes);
    println!("Groups:    {}", report.group_count());
    println!("Ungrouped: {}", report.ungrouped);

    for class in &report.classes {
        println!();
        println!("{} ({})", class.class.as_deref().unwrap_or("<functions>"), class.amount);
        for method in &class.methods {
            println!("  {} ({})", method.method, method.amount);
            for group in &method.groups {
                let fix = if group.fix_version.is_empty() {
                    String::new()
                } else {
                    format!(" fixed in {}", group.fix_version)
                };
                println!(
                    "    #{} {} x{}{}",
                    group.group_id,
                    group.location.as_deref().unwrap_or("?"),
                    group.amount,
                    fix
                );
            }
        }
    }

    if !report.unknown.is_empty() {
        println!("\nUnknown:");
        for group in &report.unknown {
            println!("  #{} {} x{}", group.group_id, group.pattern, group.amount);
        }
    }
    println!("{}", "=".repeat(80));
}

/// Display schema information
///
/// **Private** - internal command implementation
fn display_schema(show_details: bool) {
    println!("Crashgroup Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  bundle_identifier: string  - Application");
        println!("  affected_version: string   - Application version");
        println!("  total_crashes: number      - Grouped plus ungrouped crashes");
        println!("  ungrouped: number          - Crashes without a signature");
        println!("  classes: array             - Groups by crashing class");
        println!("    class: string?           - Class name (null for functions)");
        println!("    amount: number           - Crashes in this class");
        println!("    methods: array           - Groups by crashing method");
        println!("      groups: array          - Group entries");
        println!("  unknown: array             - Groups without a decodable frame");
        println!("  generated_at: string       - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("Crashgroup v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Crash signature extraction and grouping for iOS/macOS crash logs.");
}
