//! vtshim - ANSI escape filter for the legacy Windows console
//!
//! Copies files (or standard input) to standard output, interpreting the
//! escape sequences a VT100 would understand through native console calls.
//!
//! # Quick Start
//!
//! ```text
//! some-tool --color=always | vtshim    # Render colored output
//! vtshim build.log                     # Replay a captured log
//! vtshim --raw build.log               # Show the escapes literally
//! vtshim --title "Build" --reset       # Retitle and clear the console
//! ```

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;
use crossterm::tty::IsTty;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vtshim::config::Config;
use vtshim::Options;

/// Command line settings
#[derive(Debug, Default)]
struct Args {
    /// Write escape sequences literally
    raw: bool,
    /// Switch a CP850 console to CP858
    euro: bool,
    /// Window title to set before copying
    title: Option<String>,
    /// Clear the console before copying
    reset: bool,
    /// Print the effective configuration and exit
    dump_config: bool,
    /// Inputs; empty means standard input
    files: Vec<PathBuf>,
}

/// Environment variable holding a tracing filter directive
const LOG_VAR: &str = "VTSHIM_LOG";

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("vtshim {}", VERSION);
}

fn print_help() {
    eprintln!("vtshim {} - ANSI escape emulation for the Windows console", VERSION);
    eprintln!();
    eprintln!("Usage: vtshim [OPTIONS] [FILE...]");
    eprintln!();
    eprintln!("Reads standard input when no FILE is given, or when FILE is -.");
    eprintln!();
    eprintln!("Emulation options:");
    eprintln!("  -r, --raw             Write escape sequences literally");
    eprintln!("  --euro                Use CP858 on a CP850 console (euro sign)");
    eprintln!();
    eprintln!("Console options:");
    eprintln!("  -t, --title <TITLE>   Set the console window title");
    eprintln!("  --reset               Clear the screen buffer and home the cursor");
    eprintln!();
    eprintln!("Other options:");
    eprintln!("  --dump-config         Print the effective configuration");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VTSHIM_SKIP_ANSI_EMULATION   Same as --raw when set");
    eprintln!("  VTSHIM_LOG                   Log filter, e.g. debug or vtshim=trace");
    eprintln!();
    eprintln!("Configuration: ~/.vtshim/config.toml");
}

fn parse_args() -> Result<Args, String> {
    parse_args_from(env::args().skip(1))
}

fn parse_args_from(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-r" | "--raw" => parsed.raw = true,
            "--euro" => parsed.euro = true,
            "-t" | "--title" => {
                let title = args.next().ok_or("Missing title argument")?;
                parsed.title = Some(title);
            }
            "--reset" => parsed.reset = true,
            "--dump-config" => parsed.dump_config = true,
            "-" => parsed.files.push(PathBuf::from("-")),
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            file => parsed.files.push(PathBuf::from(file)),
        }
    }

    Ok(parsed)
}

/// Install the file logger; silently skipped if the log cannot be opened
fn init_logging(config: &Config) {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("vtshim.log"))
        .unwrap_or_else(|| PathBuf::from("vtshim.log"));

    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn copy_input(path: &Path, out: &mut impl Write) -> anyhow::Result<u64> {
    if path.as_os_str() == "-" {
        return Ok(io::copy(&mut vtshim::stdin(), out)?);
    }
    let mut file =
        File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    Ok(io::copy(&mut file, out)?)
}

fn run(args: Args, config: Config) -> anyhow::Result<()> {
    let mut options = Options::from_config(&config);
    options.skip_emulation |= args.raw;
    options.euro_codepage |= args.euro;
    vtshim::init(options);

    if args.reset {
        if let Err(e) = vtshim::reset_screen() {
            info!("Reset skipped: {}", e);
        }
    }
    if let Some(title) = &args.title {
        vtshim::set_title(title)?;
    }

    // Console-only invocations do not wait on input
    let files = if args.files.is_empty() {
        if args.reset || args.title.is_some() {
            return Ok(());
        }
        if io::stdin().is_tty() {
            eprintln!("vtshim: reading from the console, end input with Ctrl+Z");
        }
        vec![PathBuf::from("-")]
    } else {
        args.files
    };

    let mut out = vtshim::stdout();
    for path in &files {
        let copied = copy_input(path, &mut out)?;
        info!("Copied {} bytes from {}", copied, path.display());
    }
    out.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let mut config = Config::load();
    if args.raw {
        config.emulation.skip_ansi_emulation = true;
    }
    if args.euro {
        config.emulation.euro_codepage = true;
    }

    if args.dump_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    init_logging(&config);
    info!("vtshim {} starting", VERSION);

    let result = run(args, config);
    if let Err(e) = &result {
        error!("vtshim failed: {:#}", e);
    }
    result
}
