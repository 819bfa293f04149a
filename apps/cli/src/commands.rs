//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use benchtree_catalog::{load_catalog, render_tree};
use benchtree_core::pipeline::{ProgressReporter, ScanRequest, ScanResult, scan};
use benchtree_resolver::{PatternClassifier, StructuralMarkers, classify_ancestors};
use benchtree_shared::{AppConfig, ScanConfig, init_config, load_config, load_config_from};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// benchtree — turn benchmark result directories into a run catalog.
#[derive(Parser)]
#[command(
    name = "benchtree",
    version,
    about = "Catalog experiment / instance / run hierarchies from result directories.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.benchtree/benchtree.toml.
    #[arg(long, global = true, env = "BENCHTREE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Walk a results root and write its catalog.
    Scan {
        /// Results root directory.
        root: PathBuf,

        /// Output directory for the catalog (defaults to the root).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Log and skip paths that cannot be classified.
        #[arg(long)]
        skip_unclassified: bool,

        /// Instance name pattern (repeatable); replaces the configured ones.
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,

        /// Maximum directory depth below the root.
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Show how paths would be placed, without building anything.
    Classify {
        /// Run file paths.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Instance name pattern (repeatable); replaces the configured ones.
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,
    },

    /// Print the tree stored in a catalog file.
    Show {
        /// Path to catalog.json.
        catalog: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "benchtree=info",
        1 => "benchtree=debug",
        _ => "benchtree=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Scan {
            root,
            out,
            skip_unclassified,
            patterns,
            max_depth,
        } => {
            let mut scan_config = ScanConfig::from(&resolve_config(config_path.as_deref())?);
            if !patterns.is_empty() {
                scan_config.instance_patterns = patterns;
            }
            scan_config.skip_unclassified |= skip_unclassified;
            if max_depth.is_some() {
                scan_config.max_depth = max_depth;
            }
            cmd_scan(root, out, scan_config)
        }
        Command::Classify { paths, patterns } => {
            let mut scan_config = ScanConfig::from(&resolve_config(config_path.as_deref())?);
            if !patterns.is_empty() {
                scan_config.instance_patterns = patterns;
            }
            cmd_classify(&paths, &scan_config)
        }
        Command::Show { catalog } => cmd_show(&catalog),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

/// Load `--config` if given, otherwise the user config (or defaults).
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_scan(root: PathBuf, out: Option<PathBuf>, scan_config: ScanConfig) -> Result<()> {
    if !root.is_dir() {
        return Err(eyre!("results root '{}' is not a directory", root.display()));
    }
    let output_dir = out.unwrap_or_else(|| root.clone());

    info!(
        root = %root.display(),
        out = %output_dir.display(),
        skip_unclassified = scan_config.skip_unclassified,
        "scanning results"
    );

    let request = ScanRequest {
        root,
        output_dir,
        scan: scan_config,
    };
    let reporter = CliProgress::new();
    let result = scan(&request, &reporter)?;

    println!();
    println!("  Catalog written!");
    println!("  ID:          {}", result.catalog_id);
    println!("  Experiments: {}", result.experiments);
    println!("  Instances:   {}", result.instances);
    println!("  Runs:        {}", result.runs);
    println!("  Skipped:     {}", result.skipped.len());
    println!("  Path:        {}", result.catalog_path.display());
    println!("  Time:        {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_classify(paths: &[PathBuf], scan_config: &ScanConfig) -> Result<()> {
    let classifier = PatternClassifier::new(&scan_config.instance_patterns)?;
    let classify = |s: &str| classifier.classify(s);
    let markers = StructuralMarkers::from_names(&scan_config.structural_markers);

    let mut failures = 0usize;
    for path in paths {
        match classify_ancestors(path, &classify, &markers) {
            Ok(p) => println!(
                "{}\n  experiment: {} ({})\n  instance:   {} ({})",
                path.display(),
                p.experiment,
                p.experiment_path.display(),
                p.instance,
                p.instance_path.display()
            ),
            Err(e) => {
                failures += 1;
                println!("{}\n  error: {e}", path.display());
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{failures} of {} paths could not be classified", paths.len()));
    }
    Ok(())
}

fn cmd_show(catalog: &Path) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    println!("Catalog {} ({})", catalog.id, catalog.root);
    print!("{}", render_tree(&catalog));
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn run_recorded(&self, source: &Path, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Resolving [{current}/{total}] {}", source.display()));
    }

    fn done(&self, _result: &ScanResult) {
        self.spinner.finish_and_clear();
    }
}

// A scan that fails never reaches `done`.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
