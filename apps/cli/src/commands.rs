//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use glyphsync_assets::{AssetReport, AssetStatus, DownloadSummary};
use glyphsync_core::sync::{
    ProgressReporter, SyncOptions, SyncReport, asset_status, download_missing, load_registry,
    run_sync, update_registry,
};
use glyphsync_shared::{AppConfig, SyncConfig, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// glyphsync: sync an icon glyph registry with a remote catalog.
#[derive(Parser)]
#[command(
    name = "glyphsync",
    version,
    about = "Sync an icon glyph registry with a remote catalog and stage its SVG artwork.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./glyphsync.toml, then ~/.glyphsync/glyphsync.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Full run: merge the remote catalog, download missing artwork, export the glyph list.
    Sync {
        /// Skip the remote catalog; work from the local registry only.
        #[arg(long)]
        offline: bool,

        /// Skip downloading artwork.
        #[arg(long)]
        no_download: bool,

        /// Skip writing the glyph list.
        #[arg(long)]
        no_export: bool,
    },

    /// Create an empty registry file.
    Init {
        /// Replace an existing registry.
        #[arg(long)]
        force: bool,
    },

    /// Merge new glyphs from the remote catalog into the registry.
    Update,

    /// Download artwork missing from the glyph directory.
    Download,

    /// Write the glyph list from the registry.
    Export,

    /// Show registry size and per-style artwork coverage.
    Status,

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
    /// Write a default config file (to --config or ./glyphsync.toml).
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
        0 => "glyphsync=info",
        1 => "glyphsync=debug",
        _ => "glyphsync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Sync {
            offline,
            no_download,
            no_export,
        } => {
            let opts = SyncOptions {
                offline,
                skip_download: no_download,
                skip_export: no_export,
            };
            cmd_sync(config_path, &opts).await
        }
        Command::Init { force } => cmd_init(config_path, force),
        Command::Update => cmd_update(config_path).await,
        Command::Download => cmd_download(config_path).await,
        Command::Export => cmd_export(config_path),
        Command::Status => cmd_status(config_path),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load and validate the runtime config.
fn sync_config(config_path: Option<&Path>) -> Result<SyncConfig> {
    let app = load_config(config_path)?;
    Ok(SyncConfig::try_from(&app)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_sync(config_path: Option<&Path>, opts: &SyncOptions) -> Result<()> {
    let config = sync_config(config_path)?;

    info!(
        registry = %config.registry_path.display(),
        catalog = %config.remote.catalog_url,
        offline = opts.offline,
        "starting sync"
    );

    let reporter = CliProgress::new();
    let report = run_sync(&config, opts, &reporter).await?;

    println!();
    println!("  Glyphs:   {}", report.glyph_count);
    println!("  Added:    {}", report.added.len());
    println!(
        "  Registry: {}",
        if report.registry_saved { "updated" } else { "unchanged" }
    );
    if let Some(downloads) = &report.downloads {
        print_downloads(downloads);
    }
    match (&report.manifest_lines, &report.export_error) {
        (Some(lines), _) => {
            println!("  List:     {lines} lines -> {}", config.manifest_path.display());
        }
        (None, Some(err)) => println!("  List:     FAILED ({err})"),
        (None, None) => {}
    }
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let config = sync_config(config_path)?;
    glyphsync_registry::init(&config.registry_path, force)?;
    println!("Registry initialized at: {}", config.registry_path.display());
    Ok(())
}

async fn cmd_update(config_path: Option<&Path>) -> Result<()> {
    let config = sync_config(config_path)?;
    let reporter = CliProgress::new();
    let result = update_registry(&config, &reporter).await?;
    reporter.finish();

    if result.added.is_empty() {
        println!("No new glyphs found ({} total).", result.registry.len());
    } else {
        println!(
            "Added {} glyph(s), {} total.",
            result.added.len(),
            result.registry.len()
        );
    }
    Ok(())
}

async fn cmd_download(config_path: Option<&Path>) -> Result<()> {
    let config = sync_config(config_path)?;
    let registry = load_registry(&config)?;

    let reporter = CliProgress::new();
    let summary = download_missing(&config, &registry, &reporter).await?;
    reporter.finish();

    println!();
    print_downloads(&summary);
    println!();
    Ok(())
}

fn cmd_export(config_path: Option<&Path>) -> Result<()> {
    let config = sync_config(config_path)?;
    let registry = load_registry(&config)?;
    let lines = glyphsync_registry::export_manifest(&config.manifest_path, &registry)?;
    println!("Wrote {lines} lines to {}", config.manifest_path.display());
    Ok(())
}

fn cmd_status(config_path: Option<&Path>) -> Result<()> {
    let config = sync_config(config_path)?;
    let registry = load_registry(&config)?;

    println!("  Registry: {}", config.registry_path.display());
    println!("  Glyphs:   {}", registry.len());
    if let Some(last) = registry.order.last().and_then(|id| registry.info.get(id)) {
        println!(
            "  Range:    {:#x}..={:#x}",
            config.glyphs.base_offset, last.unicode_id
        );
    }
    println!();
    for style in asset_status(&config, &registry) {
        println!(
            "  {:<10} {:>6} present {:>6} missing",
            style.style, style.present, style.missing
        );
    }
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = init_config(config_path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_config(config_path)?;
    // Validate so `show` surfaces the same errors a run would.
    SyncConfig::try_from(&config)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_downloads(summary: &DownloadSummary) {
    println!(
        "  Assets:   {} downloaded, {} present, {} failed",
        summary.downloaded,
        summary.already_present,
        summary.failed.len()
    );
    for report in &summary.failed {
        if let AssetStatus::Failed(err) = &report.status {
            println!("    {} [{}]: {err}", report.job.glyph_id, report.job.style);
        }
    }
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
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn glyph_added(&self, id: &str) {
        self.spinner.set_message(format!("New glyph: {id}"));
    }

    fn asset_finished(&self, report: &AssetReport, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Assets [{current}/{total}] {} ({})",
            report.job.glyph_id, report.job.style
        ));
    }

    fn done(&self, _report: &SyncReport) {
        self.finish();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
