use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use darkroom::models::{
    compression_ratio, format_file_size, ImageStats, OutputFormat, PipelineConfig,
    ProcessingOptions, Rotation, SourceImage,
};
use darkroom::services::{camera, ImageSession, Pipeline, ProgressReporter};

#[derive(Parser)]
#[command(name = "darkroom")]
#[command(about = "Darkroom - rotate, quantize, blur faces and re-encode photos")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the processing pipeline over one image
    Process {
        /// Source image (JPEG or PNG)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the processed image
        #[arg(short, long)]
        output: PathBuf,

        /// Encoding quality, 0-100
        #[arg(short, long, default_value_t = 75)]
        quality: u8,

        /// Longest side in pixels after compression
        #[arg(long, default_value_t = 1920)]
        max_width: u32,

        /// Quantize to a small palette with Floyd-Steinberg dithering
        #[arg(long)]
        dither: bool,

        /// Palette size when dithering (clamped to 2-32)
        #[arg(long, default_value_t = 8)]
        colors: u8,

        /// Blur detected faces
        #[arg(long)]
        blur: bool,

        /// Clockwise rotation in degrees, a multiple of 90
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        rotation: i32,

        /// Output format (overrides the config file)
        #[arg(short, long)]
        format: Option<FormatArg>,

        /// YAML config file (falls back to DARKROOM_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Jpeg,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
        }
    }
}

/// Logs stage progress at debug level.
struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, step: &str, percent: u8) {
        tracing::debug!(step, percent, "Progress");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Process {
            input,
            output,
            quality,
            max_width,
            dither,
            colors,
            blur,
            rotation,
            format,
            config,
        }) => {
            init_logging();
            let options = ProcessingOptions {
                quality,
                max_width,
                apply_dithering: dither,
                color_count: colors,
                apply_blur: blur,
                rotation: Rotation::from_degrees(rotation)?,
            };
            run_process_command(&input, &output, options, format, config).await
        }
        None => {
            run_status_command()?;
            Ok(())
        }
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "darkroom=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Process one file and print before/after stats as JSON
async fn run_process_command(
    input: &Path,
    output: &Path,
    options: ProcessingOptions,
    format: Option<FormatArg>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config_path =
        config_path.or_else(|| std::env::var("DARKROOM_CONFIG").ok().map(PathBuf::from));
    let mut config = match config_path {
        Some(path) => PipelineConfig::load(path),
        None => PipelineConfig::default(),
    };
    if let Some(format) = format {
        config.output_format = format.into();
    }

    let bytes = std::fs::read(input)?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let (stored_width, stored_height) = image::ImageReader::new(std::io::Cursor::new(&bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    let (width, height) = if camera::swaps_dimensions(camera::read_orientation(&bytes)) {
        (stored_height, stored_width)
    } else {
        (stored_width, stored_height)
    };
    let original = ImageStats {
        size: bytes.len(),
        width,
        height,
    };

    let mut session = ImageSession::new(Arc::new(Pipeline::new(config)));
    session.load(SourceImage::new(name, bytes));
    let metadata = match session.metadata().await {
        Ok(metadata) if metadata.has_metadata() => Some(metadata),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read camera metadata");
            None
        }
    };
    let result = session.process(&options, &LogProgress).await?;

    std::fs::write(output, &result.bytes)?;

    let processed = result.stats();
    let report = serde_json::json!({
        "output": output.display().to_string(),
        "format": result.format,
        "original": {
            "width": original.width,
            "height": original.height,
            "size": format_file_size(original.size),
        },
        "processed": {
            "width": processed.width,
            "height": processed.height,
            "size": format_file_size(processed.size),
        },
        "resized": processed.resized_from(&original),
        "saved": compression_ratio(&original, &processed),
        "options": options,
        "palette": result.palette.as_ref().map(|_| result.palette_hex()),
        "warnings": result.warnings,
        "metadata": metadata.map(|m| {
            let exposure = m.exposure_display();
            serde_json::json!({ "camera": m, "exposure": exposure })
        }),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Print version and the default processing options
fn run_status_command() -> anyhow::Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let config_file = std::env::var("DARKROOM_CONFIG").ok();

    println!("Darkroom v{VERSION}");
    println!("Rotate, quantize, blur faces and re-encode photos\n");

    println!("Environment Variables:");
    println!(
        "  DARKROOM_CONFIG = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );

    println!("\nDefault Options:");
    println!(
        "{}",
        serde_json::to_string_pretty(&ProcessingOptions::default())?
    );

    println!("\nRun `darkroom process --help` to process an image.");
    Ok(())
}
