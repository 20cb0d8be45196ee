mod age;
mod clock;
mod display;
mod export;
mod orchestrator;
mod settings;
mod stats;
mod svg;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clock::{Clock, FixedClock, SystemClock};
use display::TerminalSink;
use orchestrator::{ConfigHandle, Orchestrator};
use settings::{FileStore, SettingsStore};
use stats::TargetAge;

const DEFAULT_WIDGET_FILE: &str = "lifetimer-widget.js";

/// Live countdown toward a target age.
#[derive(Parser)]
#[command(name = "lifetimer", version)]
struct Cli {
    /// Settings file holding the birth date and target age.
    #[arg(long, env = "LIFETIMER_SETTINGS", default_value = "lifetimer.json", global = true)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the display every second (default).
    Run {
        /// Append frames instead of redrawing the screen.
        #[arg(long)]
        no_redraw: bool,
    },
    /// Print a single frame.
    Show {
        /// Evaluate at this instant instead of now (YYYY-MM-DD[THH:MM:SS]).
        #[arg(long, value_parser = parse_instant)]
        at: Option<NaiveDateTime>,
    },
    /// Save a birth date (YYYY-MM-DD) and target age.
    Set {
        birth: String,
        #[arg(allow_hyphen_values = true)]
        target_age: String,
    },
    /// Show the target date for a setting without saving it.
    Preview {
        birth: String,
        #[arg(allow_hyphen_values = true)]
        target_age: String,
    },
    /// Generate the Scriptable widget script.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write dark and light SVG progress rings.
    Svg {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn parse_instant(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|e| format!("expected YYYY-MM-DD[THH:MM:SS]: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the display, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut store = FileStore::new(cli.settings);
    let today = SystemClock.now().date_naive();

    match cli.command.unwrap_or(Command::Run { no_redraw: false }) {
        Command::Run { no_redraw } => run(store, !no_redraw).await,
        Command::Show { at } => {
            let stored = store.get().context("Failed to load settings")?;
            let now = match at {
                Some(at) => stats::localize(&Local, at)
                    .with_context(|| format!("{at} does not exist in the local time zone"))?,
                None => SystemClock.now(),
            };
            let (mut orchestrator, _handle) = Orchestrator::new(
                TerminalSink::stdout(false),
                FixedClock(now),
                stored.config(today),
            );
            orchestrator.tick();
            Ok(())
        }
        Command::Set { birth, target_age } => {
            let config = settings::update(&mut store, &birth, &target_age, today)?;
            println!("Saved to {}", store.path().display());
            let now = SystemClock.now();
            if let Some(preview) = config
                .birth_in(&Local)
                .and_then(|birth| stats::preview(&birth, config.target_age(), &now))
            {
                println!("{preview}");
            }
            Ok(())
        }
        Command::Preview { birth, target_age } => {
            let config = settings::parse_update(&birth, &target_age, today)?;
            let now = SystemClock.now();
            let preview = config
                .birth_in(&Local)
                .and_then(|birth| stats::preview(&birth, config.target_age(), &now))
                .context("Target date out of range")?;
            println!("{preview}");
            Ok(())
        }
        Command::Export { out } => {
            let stored = store.get().context("Failed to load settings")?;
            let script = export::scriptable_widget(stored.birth, stored.target_age);
            match out {
                Some(path) => write_widget(&path, &script),
                None => {
                    print!("{script}");
                    Ok(())
                }
            }
        }
        Command::Svg { dir } => {
            let stored = store.get().context("Failed to load settings")?;
            let config = stored
                .config(today)
                .context("No birth date configured; run `lifetimer set` first")?;
            let frame = orchestrator::compose_frame(&config, &SystemClock.now())
                .context("Target date out of range")?;

            fs::create_dir_all(&dir)?;
            for theme in [svg::Theme::Dark, svg::Theme::Light] {
                let path = dir.join(theme.file_name());
                fs::write(&path, svg::generate_svg(&frame, theme))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            println!("Generated dark_mode.svg and light_mode.svg successfully.");
            Ok(())
        }
    }
}

fn write_widget(path: &Path, script: &str) -> Result<()> {
    fs::write(path, script).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Widget script written");
    Ok(())
}

/// Live mode: the refresh loop plus a command reader on stdin.
async fn run(store: FileStore, redraw: bool) -> Result<()> {
    let today = SystemClock.now().date_naive();
    let stored = store.get().context("Failed to load settings")?;

    let (orchestrator, handle) =
        Orchestrator::new(TerminalSink::stdout(redraw), SystemClock, stored.config(today));
    let (quit_tx, quit_rx) = oneshot::channel();

    tokio::spawn(read_commands(store, handle, stored.target_age, quit_tx));

    orchestrator
        .run(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                // a dropped sender (stdin closed) is not a quit
                Ok(()) = quit_rx => {}
            }
        })
        .await;

    Ok(())
}

/// Accepts `set <YYYY-MM-DD> <age>`, `export [path]` and `quit` lines.
async fn read_commands(
    mut store: FileStore,
    handle: ConfigHandle,
    fallback_age: TargetAge,
    quit: oneshot::Sender<()>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {e}");
                break;
            }
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["set", birth, target_age] => {
                let today = SystemClock.now().date_naive();
                match settings::update(&mut store, birth, target_age, today) {
                    Ok(config) => handle.replace(config),
                    Err(e) => warn!("{e}"),
                }
            }
            ["set", ..] => warn!("Usage: set <YYYY-MM-DD> <target age>"),
            ["export", rest @ ..] => {
                let path = rest.first().copied().unwrap_or(DEFAULT_WIDGET_FILE);
                let current = handle.current();
                let script = export::scriptable_widget(
                    current.map(|c| c.birth()),
                    current.map_or(fallback_age, |c| c.target_age()),
                );
                if let Err(e) = write_widget(Path::new(path), &script) {
                    warn!("{e:#}");
                }
            }
            ["quit" | "exit"] => {
                let _ = quit.send(());
                return;
            }
            _ => warn!("Unknown command: {line}"),
        }
    }
}
