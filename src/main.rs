use clap::{Parser, Subcommand};
use photo_ledger::imaging::{self, ImageBackend, Quality, RustBackend};
use photo_ledger::layout::FailurePolicy;
use photo_ledger::types::LedgerDate;
use photo_ledger::{config, document, intake, ledger, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once; called a single time at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photo-ledger")]
#[command(about = "Build construction photo ledgers (xlsx) from site photos")]
#[command(long_about = "\
Build construction photo ledgers (xlsx) from site photos

Photos are turned upright from their EXIF orientation, optionally stamped
with a date, and laid out two per row under a caption in a single A4 sheet.

Request structure:

  site-visit/
  ├── config.toml                  # Layout and stamp settings (optional)
  ├── ledger.toml                  # Customer, date stamp mode, photo list
  └── photos/
      ├── 001-toilet-handrail.jpg  # Caption defaults to \"toilet handrail\"
      └── 002-bath.jpg

ledger.toml:

  customer = \"山田 太郎\"
  [date_stamp]
  mode = \"fixed\"                   # fixed | capture | none
  date = \"2024-06-01\"              # fixed mode; defaults to today
  [[photos]]
  path = \"photos/001-toilet-handrail.jpg\"
  number = \"①\"                     # defaults to ①, ②, ... by position
  content = \"トイレ手すり取り付け\"

Run 'photo-ledger gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Log debug details (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Settings file (default: config.toml next to the request file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the ledger workbook
    Build {
        /// Ledger request file
        request: PathBuf,
        /// Directory to write the workbook to (default: next to the request file)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Fail on the first unreadable photo instead of skipping it
        #[arg(long)]
        abort_on_error: bool,
    },
    /// Read every photo and show where it would go, without building
    Check {
        /// Ledger request file
        request: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write upright, downscaled previews of every photo
    Preview {
        /// Ledger request file
        request: PathBuf,
        /// Directory for the preview JPEGs
        #[arg(long, default_value = "preview")]
        output: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let today = LedgerDate::new(chrono::Local::now().date_naive());

    match cli.command {
        Command::Build {
            request,
            output: out_dir,
            abort_on_error,
        } => {
            let settings = load_settings(cli.config.as_deref(), &request)?;
            init_thread_pool(&settings.processing);
            let mut intake = intake::load_request(&request, today)?;
            if abort_on_error {
                intake.request.policy = FailurePolicy::Abort;
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_ledger_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = ledger::build_ledger(&intake.request, &settings, today, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let build = result?;

            let out_dir = out_dir.unwrap_or_else(|| request_dir(&request));
            std::fs::create_dir_all(&out_dir)?;
            let path = out_dir.join(&build.filename);
            std::fs::write(&path, &build.artifact.bytes)?;
            output::print_build_summary(&build, &path);
        }
        Command::Check { request, json } => {
            let settings = load_settings(cli.config.as_deref(), &request)?;
            init_thread_pool(&settings.processing);
            let intake = intake::load_request(&request, today)?;
            let config = &intake.request.config;
            let reports = ledger::survey(&intake.request.entries, config, &RustBackend::new());
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                output::print_check_output(
                    &document::title_text(config.customer()),
                    &config.date_stamp,
                    &reports,
                    &intake.sources,
                    &request_dir(&request),
                );
            }
        }
        Command::Preview {
            request,
            output: out_dir,
        } => {
            let settings = load_settings(cli.config.as_deref(), &request)?;
            let intake = intake::load_request(&request, today)?;
            let backend = RustBackend::new();
            let quality = Quality::new(settings.images.quality);
            std::fs::create_dir_all(&out_dir)?;
            println!("==> Previews \u{2192} {}", out_dir.display());
            for entry in &intake.request.entries {
                let rendition =
                    imaging::preview(&backend, &entry.bytes, settings.images.preview_max_edge)
                        .and_then(|img| backend.encode(&img, quality));
                match rendition {
                    Ok(jpeg) => {
                        let path = out_dir.join(format!("{:03}.jpg", entry.index + 1));
                        std::fs::write(&path, jpeg)?;
                        println!(
                            "{}",
                            output::format_preview_line(entry.index, &entry.caption(), &path)
                        );
                    }
                    Err(e) => tracing::warn!(index = entry.index + 1, "no preview: {e}"),
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays clean
/// for `check --json`.
fn init_logger(verbose: bool) {
    let default = if verbose {
        "photo_ledger=debug,info"
    } else {
        "photo_ledger=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn request_dir(request: &Path) -> PathBuf {
    match request.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn load_settings(
    explicit: Option<&Path>,
    request: &Path,
) -> Result<config::LedgerSettings, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => config::load_config(&request_dir(request)),
    }
}
