//! `slice-qc` — terminal reviewer for 3-D image slices.
//!
//! # Usage
//!
//! ```text
//! slice-qc --archive slices.json --csv review/ratings.csv
//! slice-qc --config ~/.config/slice-qc/config.toml --log-file qc.log
//! slice-qc summary --csv review/ratings.csv
//! ```
//!
//! Ratings are written to the CSV after every navigation step and every
//! rating change; an existing CSV is merged on start unless `--fresh` is
//! given.

mod app;
mod archive;
mod summary;
mod ui;

use std::{
  fs::File,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result, anyhow};
use app::App;
use archive::LocalArchive;
use clap::{Parser, Subcommand};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use sliceqc_core::navigation::Navigator;
use sliceqc_store_csv::CsvStore;
use summary::Summary;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "slice-qc", version, about = "Rate 3-D image slices, one at a time")]
struct Args {
  /// Path to a TOML config file (archive, csv, log_file).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Slice archive: a JSON bundle or a directory of `<key>.json` files.
  #[arg(short, long, value_name = "PATH", env = "SLICE_QC_ARCHIVE")]
  archive: Option<PathBuf>,

  /// Annotation CSV; created on first save if missing.
  #[arg(long, value_name = "FILE", env = "SLICE_QC_CSV", global = true)]
  csv: Option<PathBuf>,

  /// Start from an empty record set, overwriting any existing CSV.
  #[arg(long)]
  fresh: bool,

  /// Write logs to this file (filtered by `RUST_LOG`).
  #[arg(long, value_name = "FILE", global = true)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print record, viewed and per-rating counts for the CSV, then exit.
  Summary,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  archive:  Option<PathBuf>,
  csv:      Option<PathBuf>,
  log_file: Option<PathBuf>,
}

/// Settings after merging CLI flags over the config file.
struct Settings {
  archive:  Option<PathBuf>,
  csv:      PathBuf,
  log_file: Option<PathBuf>,
}

fn settings(args: &Args) -> Result<Settings> {
  let file_cfg: ConfigFile = match &args.config {
    Some(path) => {
      let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
      toml::from_str(&raw).context("parsing config file")?
    }
    None => ConfigFile::default(),
  };

  // CLI flags override the config file.
  let csv = args
    .csv
    .clone()
    .or(file_cfg.csv)
    .ok_or_else(|| anyhow!("no annotation CSV given (use --csv or `csv` in the config file)"))?;

  Ok(Settings {
    archive: args.archive.clone().or(file_cfg.archive),
    csv,
    log_file: args.log_file.clone().or(file_cfg.log_file),
  })
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Log to `log_file` if given. Without one, the TUI would be corrupted by log
/// output, so only `summary` logs (warnings and up, to stderr).
fn init_tracing(log_file: Option<&Path>, interactive: bool) -> Result<()> {
  let filter = |default: LevelFilter| {
    EnvFilter::builder()
      .with_default_directive(default.into())
      .from_env_lossy()
  };

  match log_file {
    Some(path) => {
      let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter(LevelFilter::INFO))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    }
    None if !interactive => {
      tracing_subscriber::fmt()
        .with_env_filter(filter(LevelFilter::WARN))
        .with_writer(io::stderr)
        .init();
    }
    None => {}
  }
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  let args = Args::parse();
  let settings = settings(&args)?;
  let interactive = args.command.is_none();
  init_tracing(settings.log_file.as_deref(), interactive)?;

  match args.command {
    Some(Command::Summary) => {
      let records = sliceqc_store_csv::load(&settings.csv);
      print!("{}", Summary::of(&records));
      Ok(())
    }
    None => review(&settings, args.fresh),
  }
}

fn review(settings: &Settings, fresh: bool) -> Result<()> {
  let archive_path = settings
    .archive
    .as_deref()
    .ok_or_else(|| anyhow!("no archive given (use --archive or `archive` in the config file)"))?;

  let archive = LocalArchive::open(archive_path)
    .with_context(|| format!("opening archive {}", archive_path.display()))?;

  let store = if fresh {
    info!(csv = %settings.csv.display(), "starting with an empty record set");
    CsvStore::fresh(&settings.csv)
  } else {
    CsvStore::open(&settings.csv)
  };

  let mut nav = Navigator::new(store, archive).context("reading archive keys")?;
  nav.start().context("loading the first item")?;
  info!(items = nav.len(), csv = %settings.csv.display(), "review session started");

  let mut app = App::new(nav);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app);

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  // Final save; reported even when the loop itself failed.
  let close_result = app
    .into_navigator()
    .close()
    .with_context(|| format!("saving annotations to {}", settings.csv.display()));

  run_result?;
  close_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<CsvStore, LocalArchive>,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    if !event::poll(Duration::from_millis(250)).context("polling terminal events")? {
      continue;
    }

    match event::read().context("reading terminal event")? {
      // Windows reports both press and release.
      Event::Key(key) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key) {
          break;
        }
      }
      Event::Resize(_, _) => {
        // Redrawn on the next iteration.
      }
      _ => {}
    }
  }

  Ok(())
}
