use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wp2hugo::config::{self, CliOverrides, ExportConfig};
use wp2hugo::fetch::HttpFetcher;
use wp2hugo::site::Site;
use wp2hugo::{export, output, wxr};

#[derive(Parser)]
#[command(name = "wp2hugo", version)]
#[command(about = "Convert WordPress export files into a Hugo content tree")]
#[command(long_about = "\
Convert WordPress export files into a Hugo content tree

Reads one or more WXR files (Tools → Export in the WordPress admin), merges
their items and writes one page bundle per post and page:

  build/
  └── content/
      ├── posts/
      │   └── 2020/
      │       └── 2020_03_14_hello-world/
      │           ├── index.md         # Front matter + Markdown body
      │           ├── comments.yaml    # Nested comment threads
      │           ├── images/          # Attached images (front matter resources)
      │           ├── gpx/             # Attached GPS track logs
      │           └── docs/            # Attached PDF documents
      └── pages/
          └── about/                   # Page with child pages: a section
              ├── _index.md
              └── team/
                  └── index.md

Links into the old site are rewritten to Hugo figure and ref shortcodes.
Existing files are never downloaded twice, so an interrupted export can be
resumed by running it again.

Run 'wp2hugo gen-config' to generate a documented wp2hugo.toml.")]
struct Cli {
    /// Log verbosity: trace, debug, info, warn, error (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Config file (default: wp2hugo.toml in the working directory, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Input export files.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// WordPress export (WXR) files, merged in order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the Hugo content tree
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Root of the generated tree
        #[arg(short, long, visible_alias = "output-dir")]
        output_directory: Option<PathBuf>,

        /// Create the directory structure without fetching media
        #[arg(short = 'd', long, visible_alias = "no-downloads")]
        skip_downloads: bool,

        /// Do not write comments.yaml files
        #[arg(short = 'c', long, visible_alias = "no-comments")]
        skip_comments: bool,
    },
    /// List the items of the merged export without writing anything
    Dump {
        #[command(flatten)]
        input: InputArgs,

        /// Print the merged export as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock wp2hugo.toml with all options documented
    GenConfig,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    let mut overrides = CliOverrides {
        log_level: cli.log_level.clone(),
        ..Default::default()
    };

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Dump { input, json } => {
            let config = load(cli.config.as_deref(), &overrides)?;
            init_tracing(&config, cli.log_level.is_some())?;
            let site = Site::new(wxr::read_files(&input.files)?);
            if json {
                println!("{}", serde_json::to_string_pretty(site.channel())?);
            } else {
                output::print_dump(&site);
            }
        }
        Command::Export {
            input,
            output_directory,
            skip_downloads,
            skip_comments,
        } => {
            overrides.output_directory = output_directory;
            overrides.skip_downloads = skip_downloads;
            overrides.skip_comments = skip_comments;
            let config = load(cli.config.as_deref(), &overrides)?;
            init_tracing(&config, cli.log_level.is_some())?;
            run_export(&input.files, &config)?;
        }
    }

    Ok(())
}

fn load(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<ExportConfig, config::ConfigError> {
    let cwd = std::env::current_dir()?;
    config::load_config(config_path, &cwd, overrides)
}

/// `RUST_LOG` wins unless `--log-level` was given. Logs go to stderr so
/// `dump --json` stays machine readable.
fn init_tracing(config: &ExportConfig, explicit_level: bool) -> Result<(), config::ConfigError> {
    let from_env = if explicit_level {
        None
    } else {
        EnvFilter::try_from_default_env().ok()
    };
    let filter = match from_env {
        Some(filter) => filter,
        None => EnvFilter::new(config.filter_directive()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn run_export(files: &[PathBuf], config: &ExportConfig) -> CliResult {
    let site = Site::new(wxr::read_files(files)?);
    let fetcher = HttpFetcher::new(&config.downloads);

    println!("==> Exporting to {}", config.output_directory.display());
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_export_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = export::export(&site, config, &fetcher, Some(tx));
    printer.join().map_err(|_| "output thread panicked")?;

    output::print_export_summary(&result?);
    Ok(())
}
