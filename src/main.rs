use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bandview::config::MapConfig;
use bandview::export::{ExportRequest, PaperSize};
use bandview::map::MapModel;
use bandview::window::Visualizer;

#[derive(Parser)]
#[command(name = "bandview")]
#[command(author, version, about = "Sentinel-2 band viewer with measurement tools", long_about = None)]
struct Cli {
    /// JSON map configuration; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the map window (default)
    Run {
        /// Where the export button writes
        #[arg(short, long, default_value = "map.pdf")]
        output: PathBuf,
    },
    /// Print the band-math style of every index layer as JSON
    Style,
    /// Render the map to a PDF without opening a window
    Export {
        /// Paper size: a0 to a5
        #[arg(short, long)]
        format: Option<PaperSize>,
        /// Print resolution in dots per inch
        #[arg(short, long)]
        dpi: Option<f64>,
        /// Scale denominator
        #[arg(short, long)]
        scale: Option<f64>,
        /// Output file
        #[arg(short, long, default_value = "map.pdf")]
        output: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "bandview=debug" } else { "bandview=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<MapConfig> {
    match path {
        Some(path) => MapConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(MapConfig::default()),
    }
}

fn print_styles(config: &MapConfig) -> Result<()> {
    for index in &config.indices {
        let style = index
            .style()
            .with_context(|| format!("failed to build style for {}", index.title))?;
        let json = serde_json::to_string(&style)?;
        println!("{}: {}", index.title, json);
    }
    Ok(())
}

fn export(
    config: &MapConfig,
    format: Option<PaperSize>,
    dpi: Option<f64>,
    scale: Option<f64>,
    output: &Path,
) -> Result<()> {
    let request = ExportRequest {
        paper: format.unwrap_or(config.export.format),
        dpi: dpi.unwrap_or(config.export.dpi),
        scale: scale.unwrap_or(config.export.scale),
    };
    let mut map = MapModel::from_config(config).context("failed to build map")?;
    let layout = map
        .export_pdf(output, request)
        .with_context(|| format!("failed to export {}", output.display()))?;
    info!(width = layout.width, height = layout.height, "done");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Some(Commands::Style) => print_styles(&config),
        Some(Commands::Export {
            format,
            dpi,
            scale,
            output,
        }) => export(&config, format, dpi, scale, &output),
        Some(Commands::Run { output }) => open_window(config, output),
        None => open_window(config, PathBuf::from("map.pdf")),
    }
}

fn open_window(config: MapConfig, output: PathBuf) -> Result<()> {
    let map = MapModel::from_config(&config).context("failed to build map")?;
    let mut visualizer = Visualizer::new(config, map, 1200, 800);
    visualizer.set_export_path(output);
    let code = visualizer.run();
    if code != gtk4::glib::ExitCode::SUCCESS {
        anyhow::bail!("window exited with {code:?}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
