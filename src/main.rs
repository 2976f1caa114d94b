use clap::{Parser, Subcommand};
use image_kitchen::config::{self, ToolConfig};
use image_kitchen::engine::FailurePolicy;
use image_kitchen::imaging::{CropBox, OutputFormat};
use image_kitchen::request::{Transform, TransformRequest};
use image_kitchen::{menu, output};
use std::path::PathBuf;
use std::process::ExitCode;

/// Flags shared by every batch command.
#[derive(clap::Args, Clone)]
struct BatchArgs {
    /// Directory containing the images (not searched recursively)
    source: PathBuf,

    /// Directory for the results, created if missing
    dest: PathBuf,

    /// Files processed at once; 0 = one per CPU core
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Stop at the first file that fails instead of continuing
    #[arg(long)]
    fail_fast: bool,

    /// JPEG quality for .jpg output (1-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Write the batch summary as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "image-kitchen")]
#[command(about = "Batch image conversion, cropping, resizing and thumbnails")]
#[command(long_about = "\
Batch image conversion, cropping, resizing and thumbnails

Every command applies one operation to each matching file directly inside
SOURCE and writes the result to DEST. Files that fail are reported and the
rest of the batch continues (use --fail-fast to stop instead).

  to-png      *.jpg, *.jpeg  →  <name>.png
  to-jpg      *.png          →  <name>.jpg
  crop        *.jpg, *.jpeg, *.png, same names
  resize      *.jpg, *.jpeg, *.png, same names (exact size, may stretch)
  thumbnail   *.jpg, *.jpeg, *.png, same names (fit inside, never enlarged)

Extensions are matched case-sensitively. Run without a command for the
interactive menu, and 'image-kitchen gen-config' for a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./image-kitchen.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Diagnostic logging on stderr; repeat for more detail
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert JPEG images to PNG
    ToPng(BatchArgs),
    /// Convert PNG images to JPEG
    ToJpg(BatchArgs),
    /// Crop every image to a box (left/top inclusive, right/bottom exclusive)
    Crop {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long)]
        left: u32,
        #[arg(long)]
        top: u32,
        #[arg(long)]
        right: u32,
        #[arg(long)]
        bottom: u32,
    },
    /// Resize every image to exactly WIDTH x HEIGHT
    Resize {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Shrink every image to fit within MAX_WIDTH x MAX_HEIGHT
    Thumbnail {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long)]
        max_width: u32,
        #[arg(long)]
        max_height: u32,
    },
    /// Interactive numbered menu (the default)
    Menu,
    /// Print a stock image-kitchen.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir()?;
    let mut tool_config = config::load_config(cli.config.as_deref(), &cwd)?;

    let (batch, transform) = match cli.command {
        None | Some(Command::Menu) => {
            init_thread_pool(&tool_config.processing);
            menu::run_interactive(tool_config.engine_options())?;
            return Ok(ExitCode::SUCCESS);
        }
        Some(Command::GenConfig) => {
            print!("{}", config::stock_config_toml());
            return Ok(ExitCode::SUCCESS);
        }
        Some(Command::ToPng(batch)) => (batch, Transform::Convert(OutputFormat::Png)),
        Some(Command::ToJpg(batch)) => (batch, Transform::Convert(OutputFormat::Jpeg)),
        Some(Command::Crop {
            batch,
            left,
            top,
            right,
            bottom,
        }) => (
            batch,
            Transform::Crop(CropBox {
                left,
                top,
                right,
                bottom,
            }),
        ),
        Some(Command::Resize {
            batch,
            width,
            height,
        }) => (batch, Transform::Resize { width, height }),
        Some(Command::Thumbnail {
            batch,
            max_width,
            max_height,
        }) => (
            batch,
            Transform::Thumbnail {
                max_width,
                max_height,
            },
        ),
    };

    apply_overrides(&mut tool_config, &batch)?;
    init_thread_pool(&tool_config.processing);

    let request = match TransformRequest::new(&batch.source, &batch.dest, transform) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("InvalidParameters: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let summary = match output::run_with_progress(tool_config.engine_options(), &request) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{}: {e}", e.kind_name());
            return Ok(ExitCode::FAILURE);
        }
    };
    output::print_summary(&summary);

    if let Some(report) = &batch.report {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(report, json)?;
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Command-line flags win over the config file.
fn apply_overrides(
    tool_config: &mut ToolConfig,
    batch: &BatchArgs,
) -> Result<(), config::ConfigError> {
    if let Some(jobs) = batch.jobs {
        tool_config.processing.max_processes = jobs;
    }
    if batch.fail_fast {
        tool_config.processing.on_error = FailurePolicy::Abort;
    }
    if let Some(quality) = batch.quality {
        tool_config.output.jpeg_quality = quality;
    }
    tool_config.validate()
}

/// `-v` enables info, `-vv` debug; `RUST_LOG` overrides both.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    log::debug!("using {threads} worker thread(s)");
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
