// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! loadapp command line host.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tokio::time::MissedTickBehavior;

use loadapp::button::terminal;
use loadapp::colors::{BOLD, DIM, RESET, YELLOW};
use loadapp::config::{config_path, load_config, load_config_from, AppConfig};
use loadapp::detail::{DetailAction, DetailView};
use loadapp::download::{
    default_download_dir, DownloadStatus, DownloadSubsystem, HttpDownloadSubsystem,
    InMemorySubsystem, PollOutcome, RequestId,
};
use loadapp::notify::TerminalNotifier;
use loadapp::screen::{MainScreen, ScreenError, TapOutcome};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes following sysexits.h conventions
mod exit_codes {
    /// General error - unspecified error
    pub const ERROR: i32 = 1;
    /// Usage error - invalid command line arguments
    pub const USAGE: i32 = 64;
}

/// loadapp - download one file and watch the button.
#[derive(Parser)]
#[command(name = "loadapp")]
#[command(version = VERSION)]
#[command(about = "Download a file with an animated progress button.")]
#[command(long_about = "loadapp - single-file downloader\n\n\
    List files:          loadapp files\n\
    Download:            loadapp download glide\n\
    Offline demo:        loadapp download glide --simulate\n\
    Show a detail view:  loadapp detail --file-label Glide --status Successful\n\
    Configure:           loadapp config show")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ~/.loadapp/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Quiet mode: only errors are logged
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Verbose mode: detailed output for debugging
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a file from the catalogue
    ///
    /// Examples:
    ///   loadapp download glide
    ///   loadapp download retrofit --simulate
    Download {
        /// Catalogue key of the file (see `loadapp files`)
        file: Option<String>,

        /// Use a simulated download instead of the network
        #[arg(long)]
        simulate: bool,

        /// Do not open the detail view when the download finishes
        #[arg(long)]
        no_detail: bool,
    },

    /// Show the detail view for a download
    Detail {
        #[arg(long)]
        file_label: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// List the downloadable files
    Files,

    /// Show configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as JSON
    Show,
    /// Print the configuration file path
    Path,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("{}", loadapp::error::describe(&e));
        let code = match e.downcast_ref::<ScreenError>() {
            Some(ScreenError::NoSelection) | Some(ScreenError::UnknownFile(_)) => exit_codes::USAGE,
            _ => exit_codes::ERROR,
        };
        std::process::exit(code);
    }
}

fn load(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let config = load(cli.config.as_ref())?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigCommands::Path => {
                let path = match cli.config {
                    Some(path) => path,
                    None => config_path()?,
                };
                println!("{}", path.display());
            }
        },
        Commands::Files => {
            let config = load(cli.config.as_ref())?;
            for file in &config.files {
                println!("{BOLD}{:<10}{RESET} {}", file.key, file.label);
                println!("{DIM}           {}{RESET}", file.url);
            }
        }
        Commands::Detail { file_label, status } => {
            show_detail(DetailView::new(file_label.as_deref(), status.as_deref()))?;
        }
        Commands::Download {
            file,
            simulate,
            no_detail,
        } => {
            let config = load(cli.config.as_ref())?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to create Tokio runtime")?;
            let detail = runtime.block_on(download(config, file, simulate))?;
            if let Some(view) = detail.filter(|_| !no_detail) {
                show_detail(view)?;
            }
        }
    }
    Ok(())
}

fn show_detail(view: DetailView) -> Result<()> {
    println!("{}", view.render());
    if io::stdin().is_terminal() {
        print!("{DIM}Press Enter to close{RESET}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
    }
    match view.acknowledge() {
        DetailAction::Close => Ok(()),
    }
}

async fn download(config: AppConfig, file: Option<String>, simulate: bool) -> Result<Option<DetailView>> {
    let measurer = Box::new(terminal::cell_measurer(config.button.text_size));

    if simulate {
        let subsystem = Arc::new(InMemorySubsystem::new());
        let cycle = config.button.cycle();
        let script = Arc::clone(&subsystem);
        let screen = MainScreen::new(config, subsystem, TerminalNotifier::stdout(), measurer);
        drive(
            screen,
            file,
            move |id| spawn_simulation(script, id, cycle),
            |_, _| Some("simulated".to_string()),
        )
        .await
    } else {
        let dir = config
            .request
            .download_dir
            .clone()
            .unwrap_or_else(default_download_dir);
        let subsystem = HttpDownloadSubsystem::new(dir)?;
        let screen = MainScreen::new(config, subsystem, TerminalNotifier::stdout(), measurer);
        drive(screen, file, |_| {}, |subsystem: &HttpDownloadSubsystem, id| {
            let progress = subsystem.progress(id)?;
            Some(match progress.percent() {
                Some(percent) => format!("{:.0}%", percent),
                None => format!("{} KiB", progress.bytes_downloaded / 1024),
            })
        })
        .await
    }
}

/// Scripted lifecycle for `--simulate`: a short pending phase, a few
/// redundant running notifications, then success.
fn spawn_simulation(subsystem: Arc<InMemorySubsystem>, id: RequestId, cycle: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        subsystem.set_status(id, DownloadStatus::Running);
        for _ in 0..8 {
            tokio::time::sleep(cycle / 4).await;
            subsystem.notify_observers();
        }
        subsystem.set_status(id, DownloadStatus::Succeeded);
    });
}

fn draw_line(frame: &loadapp::Frame, columns: usize, suffix: Option<String>) -> Result<()> {
    let cells = terminal::rasterize(frame, columns);
    let suffix = suffix.map(|s| format!("  {DIM}{}{RESET}", s)).unwrap_or_default();
    crossterm::execute!(
        io::stdout(),
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(terminal::paint(&cells)),
        Print(suffix),
    )
    .context("Failed to draw button")
}

/// Draw the button once more in its final state, end the line and release
/// the observer.
fn settle<S: DownloadSubsystem>(
    screen: &mut MainScreen<S, TerminalNotifier<io::Stdout>>,
    columns: usize,
) -> Result<()> {
    let frame = screen.on_frame(Instant::now());
    draw_line(&frame, columns, None)?;
    println!();
    screen.teardown();
    Ok(())
}

/// Run one download on `screen` until it finishes or the user interrupts.
async fn drive<S, F, P>(
    mut screen: MainScreen<S, TerminalNotifier<io::Stdout>>,
    selection: Option<String>,
    on_started: F,
    progress: P,
) -> Result<Option<DetailView>>
where
    S: DownloadSubsystem,
    F: FnOnce(RequestId),
    P: Fn(&S, RequestId) -> Option<String>,
{
    let columns = screen.config().button.columns;
    let (width, height) = terminal::pixel_size(columns);
    screen.resize(width, height);

    let id = match screen.on_tap(selection.as_deref()) {
        Ok(TapOutcome::Started(id)) => id,
        Ok(TapOutcome::Ignored) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    on_started(id);

    let mut ticker = tokio::time::interval(screen.config().frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            signal = screen.monitor_mut().next_signal() => {
                let Some(signal) = signal else { break };
                if let PollOutcome::Completed(_) = screen.on_signal(signal) {
                    settle(&mut screen, columns)?;
                    return Ok(Some(screen.detail()));
                }
            }
            _ = ticker.tick() => {
                let frame = screen.on_frame(Instant::now());
                let suffix = progress(screen.monitor().subsystem(), id);
                draw_line(&frame, columns, suffix)?;
            }
            _ = &mut ctrl_c => {
                screen.monitor_mut().cancel();
                settle(&mut screen, columns)?;
                println!("{YELLOW}[!]{RESET} Download cancelled");
                tracing::warn!(request = %id, "Download interrupted");
                return Ok(None);
            }
        }
    }

    screen.teardown();
    Ok(None)
}
