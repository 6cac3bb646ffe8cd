use clap::{Parser, Subcommand};
use simple_thumb::config::{self, BackendKind, ConfigOverrides, ThumbConfig};
use simple_thumb::imaging::{
    FastBackend, ImageBackend, ImageFormat, Response, RustBackend, Thumbnail,
};
use simple_thumb::{batch, output, recipe};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Operation chain shared by the commands that transform images.
#[derive(clap::Args, Clone)]
struct RecipeArgs {
    /// Operation to apply, repeatable and applied in order
    /// (e.g. --op resize=800x0 --op adaptive=300x300)
    #[arg(long = "op", value_name = "OP")]
    ops: Vec<String>,
}

#[derive(Parser)]
#[command(name = "simple-thumb")]
#[command(about = "Chainable thumbnailing over interchangeable image backends")]
#[command(long_about = "\
Chainable thumbnailing over interchangeable image backends

Operations are applied left to right. Each one sees the result of the
previous one:

  resize=WxH          fit inside WxH, keeping aspect (0 = unconstrained)
  adaptive=WxH        cover WxH, then crop the overflow from the center
  percent=N           scale both axes by N percent
  crop=X,Y,WxH        cut a region; out-of-bounds input is clamped
  center=W[xH]        centered crop, square when H is omitted
  rotate=DEG          rotate clockwise; width and height swap
  background=COLOR[@OPACITY]
                      composite over a solid color (#rgb or #rrggbb)
  text=SIZE,ANGLE,X,Y,COLOR,FONT,TEXT
                      draw text; negative X/Y anchor from the far edge

Without --resize-up, resize and adaptive never enlarge an image.

Run 'simple-thumb gen-config' to generate a documented simple-thumb.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./simple-thumb.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pixel backend
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendKind>,

    /// JPEG quality, 0-100
    #[arg(long, global = true)]
    quality: Option<u32>,

    /// Allow resize operations to enlarge images
    #[arg(long, global = true)]
    resize_up: bool,

    /// Log geometry decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print format and dimensions of an image
    Identify { input: PathBuf },
    /// Apply operations and save (format from the output extension)
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        recipe: RecipeArgs,
    },
    /// Apply operations and write the image to stdout
    Show {
        input: PathBuf,
        #[command(flatten)]
        recipe: RecipeArgs,
        /// Omit the Content-Type header
        #[arg(long)]
        raw: bool,
    },
    /// Process every image in a directory tree in parallel
    Batch {
        input_dir: PathBuf,
        output_dir: PathBuf,
        #[command(flatten)]
        recipe: RecipeArgs,
        /// Convert outputs to this format (gif, jpg, png, webp)
        #[arg(long, value_name = "EXT")]
        format: Option<String>,
        /// Write a JSON report of the run
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Print a stock simple-thumb.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = load_config(&cli)?;
    match config.backend {
        BackendKind::Rust => run(cli.command, &config, RustBackend::new()),
        BackendKind::Fast => run(cli.command, &config, FastBackend::new()),
    }
}

fn run<B>(command: Command, config: &ThumbConfig, backend: B) -> Result<(), Box<dyn Error>>
where
    B: ImageBackend + Clone + Send,
{
    match command {
        Command::Identify { input } => {
            let thumb = Thumbnail::open(&input, config.options, backend)?;
            output::print_identify(&input, thumb.format(), thumb.dimensions());
        }
        Command::Convert {
            input,
            output: out,
            recipe: args,
        } => {
            let operations = recipe::parse_recipe(&args.ops)?;
            let mut thumb = Thumbnail::open(&input, config.options, backend)?;
            let steps = recipe::apply_recipe(&mut thumb, &operations)?;
            thumb.save(&out)?;
            let format = ImageFormat::from_path(&out).unwrap_or(thumb.format());
            output::print_convert_output(&input, &out, &steps, thumb.dimensions(), format);
        }
        Command::Show {
            input,
            recipe: args,
            raw,
        } => {
            let operations = recipe::parse_recipe(&args.ops)?;
            let mut thumb = Thumbnail::open(&input, config.options, backend)?;
            recipe::apply_recipe(&mut thumb, &operations)?;
            let stdout = std::io::stdout();
            if raw {
                thumb.show_raw(&mut stdout.lock())?;
            } else {
                thumb.show(&mut Response::new(stdout.lock()))?;
            }
        }
        Command::Batch {
            input_dir,
            output_dir,
            recipe: args,
            format,
            report,
        } => {
            let ops = if args.ops.is_empty() {
                &config.batch.recipe
            } else {
                &args.ops
            };
            let format = match format {
                Some(ext) => Some(
                    ImageFormat::from_extension(ext.trim_start_matches('.'))
                        .ok_or_else(|| format!("unsupported output format '{ext}'"))?,
                ),
                None => None,
            };
            let options = batch::BatchOptions {
                operations: recipe::parse_recipe(ops)?,
                format,
                options: config.options,
                threads: config::effective_threads(&config.processing),
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::run_batch(&backend, &input_dir, &output_dir, &options, Some(tx));
            printer
                .join()
                .map_err(|_| "batch output thread panicked")?;
            let result = result?;
            output::print_batch_summary(&result);

            if let Some(path) = report {
                write_report(&path, &result)?;
            }
            if !result.failed.is_empty() {
                let failed = result.failed.len();
                return Err(format!("{failed} of {} images failed", result.total()).into());
            }
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

/// Resolve config: stock defaults, then the config file, then CLI flags.
fn load_config(cli: &Cli) -> Result<ThumbConfig, config::ConfigError> {
    let loaded = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };
    loaded.with_overrides(&ConfigOverrides {
        backend: cli.backend,
        quality: cli.quality,
        resize_up: cli.resize_up,
    })
}

fn write_report(path: &Path, report: &batch::BatchReport) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Log to stderr. `RUST_LOG` wins unless `-v` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
