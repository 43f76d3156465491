use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clipmon::clipboard::{self, BackendKind};
use clipmon::config::{self, Config, ConfigStorage, TomlConfigStorage};
use clipmon::logging;
use clipmon::models::{ClipboardDataType, ClipboardSnapshot};
use clipmon::monitor::{Classifier, ClipboardListener, Monitor, RunOutcome, fingerprint};

#[derive(Parser)]
#[command(name = "clipmon")]
#[command(about = "Clipboard change monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard and print one line per change
    Watch {
        /// Clipboard system to use (overrides the config file)
        #[arg(short, long, value_enum)]
        backend: Option<BackendKind>,

        /// Polling interval in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Write copied images into this directory
        #[arg(long, value_name = "DIR")]
        save_images: Option<PathBuf>,

        /// Log to this file instead of stderr
        #[arg(long, value_name = "PATH")]
        log_file: Option<PathBuf>,
    },

    /// Classify the current clipboard content once
    Snapshot {
        #[arg(short, long, value_enum)]
        backend: Option<BackendKind>,
    },

    /// Clear the clipboard
    Clear {
        #[arg(short, long, value_enum)]
        backend: Option<BackendKind>,
    },

    /// Show the config file location
    Config {
        /// Write the default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            backend,
            interval_ms,
            save_images,
            log_file,
        } => cmd_watch(backend, interval_ms, save_images, log_file),
        Commands::Snapshot { backend } => cmd_snapshot(backend),
        Commands::Clear { backend } => cmd_clear(backend),
        Commands::Config { init } => cmd_config(init),
    }
}

fn load_config() -> Result<Config> {
    let storage = TomlConfigStorage::new(config::config_path()?);
    storage.load()
}

fn init_logging(config: &Config, log_file: Option<&Path>) -> Result<()> {
    match log_file.or(config.logging.file.as_deref()) {
        Some(path) => {
            logging::init_logger(path, &config.logging.level, &config.logging.stderr_level)
        }
        None => {
            logging::init_default();
            Ok(())
        }
    }
}

/// Prints each change and optionally saves images
struct ChangePrinter {
    save_dir: Option<PathBuf>,
    images_saved: AtomicUsize,
}

impl ChangePrinter {
    fn save_image(&self, dir: &Path, payload: &[u8]) -> Result<PathBuf> {
        let n = self.images_saved.fetch_add(1, Ordering::SeqCst) + 1;
        let path = dir.join(clipmon::image::file_name(&format!("clip-{:04}", n), payload));
        fs::write(&path, payload).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(path)
    }
}

impl ClipboardListener for ChangePrinter {
    fn on_changed_with_data(&self, payload: &[u8], content_type: ClipboardDataType) {
        let snapshot = ClipboardSnapshot::new(content_type, payload.to_vec());
        println!(
            "{} {:<7} {:>8} bytes  {}",
            chrono::Local::now().format("%H:%M:%S"),
            content_type.label(),
            snapshot.size(),
            snapshot.preview(60)
        );

        if content_type == ClipboardDataType::Image
            && let Some(dir) = &self.save_dir
        {
            match self.save_image(dir, payload) {
                Ok(path) => println!("         saved {}", path.display()),
                Err(e) => log::warn!("Could not save image: {:#}", e),
            }
        }
    }
}

/// Run the monitor in the foreground
fn cmd_watch(
    backend: Option<BackendKind>,
    interval_ms: Option<u64>,
    save_images: Option<PathBuf>,
    log_file: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config()?;
    init_logging(&config, log_file.as_deref())?;

    if let Some(backend) = backend {
        config.general.backend = backend;
    }
    if let Some(interval_ms) = interval_ms {
        if interval_ms == 0 {
            bail!("--interval-ms must be greater than zero");
        }
        config.general.poll_interval_ms = interval_ms;
    }
    if let Some(dir) = &save_images {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }

    let monitor = Monitor::new(config.monitor_config());
    monitor.gate().set_listener(Arc::new(ChangePrinter {
        save_dir: save_images,
        images_saved: AtomicUsize::new(0),
    }));

    log::info!("Watching clipboard ({} backend)", config.general.backend);

    match monitor.start()? {
        RunOutcome::Stopped => Ok(()),
        RunOutcome::AlreadyRunning => bail!("Monitor already running"),
    }
}

/// Read the clipboard once and describe what the classifier sees
fn cmd_snapshot(kind: Option<BackendKind>) -> Result<()> {
    let config = load_config()?;
    logging::init_default();

    let monitor_config = config.monitor_config();
    let mut backend = clipboard::create_backend(kind.unwrap_or(monitor_config.backend))?;

    let classifier = Classifier {
        formats: monitor_config
            .formats
            .clone()
            .unwrap_or_else(|| backend.default_formats()),
        strategy: monitor_config.strategy,
        read_timeout: monitor_config.read_timeout,
        fallback_to_other: monitor_config.fallback_to_other,
    };
    let probe = classifier.classify(backend.as_mut());
    backend.teardown();

    println!("Backend: {}", backend.name());
    println!("Formats read:");
    for read in probe.reads() {
        println!("  {:<28} {:<6} {:>8} bytes", read.format_id, read.kind.label(), read.bytes.len());
    }

    match fingerprint(probe.examined()) {
        Some(fp) => println!("Fingerprint: {}", fp),
        None => println!("Fingerprint: (nothing read)"),
    }

    let snapshot = probe.into_snapshot();
    println!("Type: {} ({})", snapshot.content_type.label(), snapshot.content_type.as_i32());
    println!("Size: {} bytes", snapshot.size());

    match snapshot.content_type {
        ClipboardDataType::Files => {
            for uri in snapshot.file_uris() {
                println!("  {}", uri);
            }
        }
        ClipboardDataType::None => {}
        _ => println!("Preview: {}", snapshot.preview(200)),
    }

    Ok(())
}

fn cmd_clear(backend: Option<BackendKind>) -> Result<()> {
    let config = load_config()?;
    logging::init_default();

    clipboard::clear_clipboard(backend.unwrap_or(config.general.backend))?;
    println!("Clipboard cleared");
    Ok(())
}

fn cmd_config(init: bool) -> Result<()> {
    let storage = TomlConfigStorage::new(config::config_path()?);

    if init {
        storage.create_default()?;
    }

    println!("{}", storage.path().display());
    if !storage.path().exists() {
        println!("(not created yet, run `clipmon config --init`)");
        return Ok(());
    }

    // Surface validation errors without writing anything
    match storage.load_existing() {
        Ok(Some(config)) => println!(
            "valid: backend {}, poll {} ms, read timeout {} ms, {} custom formats",
            config.general.backend,
            config.general.poll_interval_ms,
            config.general.read_timeout_ms,
            config.formats.len()
        ),
        Ok(None) => {}
        Err(e) => println!("invalid: {:#}", e),
    }

    Ok(())
}
