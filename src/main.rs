use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use watermarker::compositor::WatermarkCompositor;
use watermarker::config::{self, WatermarkSettings};
use watermarker::imaging::{self, RustBackend};
use watermarker::output;

#[derive(Parser)]
#[command(name = "watermarker")]
#[command(about = "Stamp text and image watermarks onto photos")]
#[command(long_about = "\
Stamp text and image watermarks onto photos

Watermarks are sized as a percentage of each photo and placed at one or more
of nine anchor positions. Each layer is drawn once per anchor.

Anchors:

  top-left      top-center      top-right
  center-left   center          center-right
  bottom-left   bottom-center   bottom-right

Settings come from a TOML file (see 'watermarker gen-config'); command line
flags override the file. The text layer needs a font file: set text.font in
the config or pass --font. Photos smaller than both min_width and min_height
are copied unchanged.")]
#[command(version)]
struct Cli {
    /// Log compositor decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Flags that override values from the config file.
#[derive(clap::Args, Clone, Default)]
struct OverrideArgs {
    /// Config file (defaults apply when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Text to draw; enables the text layer
    #[arg(long)]
    text: Option<String>,

    /// Font file (TTF/OTF) for the text layer
    #[arg(long)]
    font: Option<PathBuf>,

    /// Marker image to draw; enables the image layer
    #[arg(long)]
    marker: Option<PathBuf>,
}

impl OverrideArgs {
    /// Command line overrides as a sparse TOML table.
    fn overlay(&self) -> Option<toml::Value> {
        let mut root = toml::Table::new();
        let mut text_table = toml::Table::new();
        if let Some(text) = &self.text {
            text_table.insert("enabled".into(), true.into());
            text_table.insert("content".into(), text.clone().into());
        }
        if let Some(font) = &self.font {
            text_table.insert("font".into(), font.to_string_lossy().into_owned().into());
        }
        if !text_table.is_empty() {
            root.insert("text".into(), text_table.into());
        }
        if let Some(marker) = &self.marker {
            let mut table = toml::Table::new();
            table.insert("enabled".into(), true.into());
            table.insert("path".into(), marker.to_string_lossy().into_owned().into());
            root.insert("image".into(), table.into());
        }
        (!root.is_empty()).then_some(toml::Value::Table(root))
    }

    /// Merged settings, validated and with the files they need present.
    fn load(&self) -> Result<WatermarkSettings, config::ConfigError> {
        let settings = config::load_config(self.config.as_deref(), self.overlay())?;
        settings.check_files()?;
        Ok(settings)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Watermark one image
    Apply {
        /// Source image
        input: PathBuf,
        /// Destination; the format follows the extension
        output: PathBuf,
        #[command(flatten)]
        overrides: OverrideArgs,
        /// Write a JSON report of what was drawn
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validate a config file without touching any images
    Check {
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Apply {
            input,
            output,
            overrides,
            report,
        } => {
            let settings = overrides.load()?;
            run_apply(&input, &output, &settings, report.as_deref())?;
        }
        Command::Check { overrides } => {
            let settings = overrides.load()?;
            output::print_check_output(overrides.config.as_deref(), &settings);
            println!("==> Config OK");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_apply(
    input: &Path,
    output_path: &Path,
    settings: &WatermarkSettings,
    report_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let compositor = WatermarkCompositor::new(
        RustBackend::new(),
        settings.image.enabled.then(|| settings.image.path.clone()),
    );

    let source = imaging::load_image(input)?;
    let (watermarked, report) = compositor.apply_with_report(source, settings)?;
    imaging::save_image(&watermarked, output_path)?;

    output::print_apply_output(input, output_path, &report, settings);
    if let Some(path) = report_path {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }
    Ok(())
}
