//! PadResize CLI - Batch Resize-and-Pad
//!
//! Fits every image of a folder into a fixed box, pads it with a solid
//! background color, and writes the results to an output folder. Also serves
//! the same operation as a web upload form.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use padresize::input::folder_items;
use padresize::parallel::{ItemOutcome, ProgressUpdate};
use padresize::{
    init_logging, BackgroundColor, BatchResult, BatchRunner, BatchSettings, Config, OutputFormat,
    PadResizeError, TargetBox,
};

/// PadResize - Batch Resize-and-Pad
#[derive(Parser)]
#[command(
    name = "padresize",
    version,
    about = "Resize images to an exact size, padding with a solid background",
    long_about = "PadResize fits every image of a batch inside a fixed width x height box \
                  without distorting it, then fills the remaining space with a solid color so \
                  that every output has exactly the requested dimensions."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "PADRESIZE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Resize and pad every image of a folder
    Run(RunArgs),
    /// Serve the web upload form
    Serve {
        /// Address to listen on
        #[arg(short, long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
        /// Directory processed uploads are written to
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Generate example configuration file
    ExampleConfig {
        /// Output file path
        #[arg(short, long, default_value = "padresize.toml")]
        output: PathBuf,
        /// Use YAML format instead of TOML
        #[arg(long)]
        yaml: bool,
    },
    /// Validate configuration file
    CheckConfig {
        /// Configuration file to validate
        file: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Folder containing the images (prompted for when missing)
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Output folder (default: <input>/Processed)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Target width in pixels (prompted for when missing)
    #[arg(short, long, value_name = "PIXELS")]
    width: Option<String>,

    /// Target height in pixels (prompted for when missing)
    #[arg(short = 'H', long, value_name = "PIXELS")]
    height: Option<String>,

    /// Background color as #rrggbb
    #[arg(short, long, value_name = "COLOR")]
    bg_color: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    format: Option<CliOutputFormat>,

    /// Number of worker threads
    #[arg(long, value_name = "COUNT")]
    workers: Option<usize>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Jpeg,
    Png,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            CliOutputFormat::Png => OutputFormat::Png,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli).await {
        let message = match e.downcast_ref::<PadResizeError>() {
            Some(err) => err.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{}: {}", style("Error").red().bold(), message);
        process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let config = load_config(cli.config.as_deref(), cli.verbose, cli.quiet)?;
            run_batch(args, &config, cli.quiet).await
        }
        Commands::Serve { bind, output } => {
            let mut config = load_config(cli.config.as_deref(), cli.verbose, cli.quiet)?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(output) = output {
                config.server.output_dir = output;
            }
            padresize::web::serve(config).await?;
            Ok(())
        }
        Commands::ExampleConfig { output, yaml } => generate_example_config(&output, yaml),
        Commands::CheckConfig { file } => validate_config_file(&file),
    }
}

/// Load the configuration file (or defaults) and initialize logging from it
fn load_config(path: Option<&Path>, verbose: bool, quiet: bool) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if quiet {
        config.logging.level = "error".to_string();
    } else if verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging)?;

    if let Some(path) = path {
        info!("Loaded configuration from: {:?}", path);
    }

    Ok(config)
}

/// Run one batch over an input folder
async fn run_batch(args: RunArgs, config: &Config, quiet: bool) -> anyhow::Result<()> {
    let input_dir = match args.input {
        Some(path) => path,
        None => PathBuf::from(prompt("Enter the folder path containing images")?),
    };
    if !input_dir.is_dir() {
        return Err(PadResizeError::config(format!(
            "The specified input folder does not exist: {}",
            input_dir.display()
        ))
        .into());
    }

    let width = match args.width {
        Some(width) => width,
        None => prompt("Enter target width in pixels")?,
    };
    let height = match args.height {
        Some(height) => height,
        None => prompt("Enter target height in pixels")?,
    };

    let target = TargetBox::parse(&width, &height)?;
    let mut settings = BatchSettings::new(target, &config.processing);

    if let Some(color) = &args.bg_color {
        settings = settings.background(BackgroundColor::parse_hex(color)?);
    }
    if let Some(format) = args.format {
        settings = settings.format(format.into());
    }
    if let Some(workers) = args.workers {
        settings = settings.workers(workers);
    }

    let output_dir = args
        .output
        .unwrap_or_else(|| input_dir.join(&config.processing.output_subdir));

    let items = folder_items(&input_dir, &output_dir, settings.format).await?;
    if items.is_empty() {
        return Err(PadResizeError::config(format!(
            "No .png, .jpg or .jpeg images found in {}",
            input_dir.display()
        ))
        .into());
    }

    info!("Input: {:?}", input_dir);
    info!("Output: {:?}", output_dir);
    info!("Found {} images to process", items.len());

    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| PadResizeError::write(&output_dir, e))?;

    let runner = BatchRunner::new(settings)?;

    let progress_bar = if args.json || quiet {
        None
    } else {
        Some(spawn_progress_bar(runner.progress().subscribe()))
    };

    let result = runner.run_async(items).await?;

    if let Some(task) = progress_bar {
        if let Err(e) = task.await {
            debug!("Progress bar task ended abnormally: {}", e);
        }
    }

    print_summary(&result, &output_dir, args.json)
}

/// Ask for a value on stdin; surrounding quotes are stripped
fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    if read == 0 {
        return Err(PadResizeError::config(format!("No answer given for '{}'", label)).into());
    }

    Ok(line.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
}

/// Drive a progress bar from the runner's progress updates
fn spawn_progress_bar(mut updates: broadcast::Receiver<ProgressUpdate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}, {eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        loop {
            match updates.recv().await {
                Ok(ProgressUpdate::Started { total }) => pb.set_length(total as u64),
                Ok(ProgressUpdate::ItemFinished { identifier, success, finished, .. }) => {
                    pb.set_position(finished as u64);
                    if !success {
                        pb.println(format!("{} {}", style("Failed").red(), identifier));
                    }
                    pb.set_message(identifier);
                }
                Ok(ProgressUpdate::BatchCompleted { .. }) => {
                    pb.finish_with_message("Processing complete");
                    break;
                }
                Err(RecvError::Lagged(skipped)) => debug!("Progress bar skipped {} updates", skipped),
                Err(RecvError::Closed) => {
                    pb.abandon();
                    break;
                }
            }
        }
    })
}

/// Validate configuration file
fn validate_config_file(file_path: &Path) -> anyhow::Result<()> {
    let config = Config::from_file(file_path)?;

    println!("{}: Configuration file is valid", style("Success").green().bold());
    println!("Background: {}", config.processing.background_color);
    println!("Output format: {}", config.processing.output_format.extension());
    println!("Workers: {}", config.processing.workers);

    Ok(())
}

/// Generate example configuration file
fn generate_example_config(output_path: &Path, use_yaml: bool) -> anyhow::Result<()> {
    let output_path = if use_yaml && output_path.extension().map_or(true, |ext| ext == "toml") {
        output_path.with_extension("yaml")
    } else {
        output_path.to_path_buf()
    };

    Config::default().to_file(&output_path)?;

    let format = if use_yaml { "YAML" } else { "TOML" };
    println!(
        "{}: Generated example {} configuration: {}",
        style("Success").green().bold(),
        format,
        output_path.display()
    );

    Ok(())
}

/// Print processing summary
fn print_summary(result: &BatchResult, output_dir: &Path, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!();
    println!("{}", style("Processing Summary:").bold());
    println!("  {}: {}", style("Processed").green(), result.succeeded);
    if result.failed > 0 {
        println!("  {}: {}", style("Failed").red(), result.failed);
        for report in result.failures() {
            if let ItemOutcome::Failed { stage, error } = &report.outcome {
                println!("    {} ({}): {}", report.identifier, stage, error);
            }
        }
    }
    println!("  {}: {:.2}s", style("Duration").blue(), result.elapsed.as_secs_f64());
    if result.succeeded > 0 {
        println!("  {}: {:.1} images/sec", style("Speed").cyan(), result.images_per_second());
    }
    println!("  {}: {}", style("Output").cyan(), output_dir.display());

    Ok(())
}
