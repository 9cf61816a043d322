//! # image2min - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Caricamento della configurazione e override da CLI
//! - Lettura dello stdin quando non vengono passati path
//! - Unico punto che decide output ed exit code
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (path, plugin, out-dir, delete2x, ...)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica il file di configurazione e applica gli override della CLI
//! 4. Sceglie l'input: path dalla CLI oppure byte dallo stdin
//! 5. Esegue il `BatchExecutor` e instrada il `RunOutcome`
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image2min images/*.png --out-dir build
//! image2min -p pngquant.quality=0.5 -p pngquant.quality=0.7 logo.png
//! cat logo.png | image2min > logo.min.png
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use image2min::plugin::selector;
use image2min::{BatchExecutor, Config, Input, PluginRegistry, RunOutcome};

#[derive(Parser)]
#[command(name = "image2min")]
#[command(about = "Minify images seamlessly")]
struct Args {
    /// Files, directories or glob patterns (reads stdin when omitted)
    paths: Vec<String>,

    /// Plugin to use: `name`, `name.option=value` or `name={json}` (repeatable)
    #[arg(short, long = "plugin")]
    plugin: Vec<String>,

    /// Output directory (if not specified, replace originals in place)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Delete @2x variants when minifying in place
    #[arg(short, long)]
    delete2x: bool,

    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(args: Args) -> Result<ExitCode> {
    let input = if args.paths.is_empty() {
        if std::io::stdin().is_terminal() {
            eprintln!("Specify at least one file path");
            return Ok(ExitCode::FAILURE);
        }
        let mut data = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut data)
            .await
            .context("Failed to read stdin")?;
        Input::Buffer(data)
    } else {
        Input::Paths(args.paths.clone())
    };

    let config = load_config(&args).await?;
    debug!("Configuration: {:?}", config);

    let executor = BatchExecutor::new(config, PluginRegistry::with_builtins())?;

    match executor.run(input).await? {
        RunOutcome::Stdout(data) => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
        RunOutcome::Rejected(message) => eprintln!("{}", message),
        RunOutcome::Silent => {}
        RunOutcome::Completed(summary) => {
            println!("{}", summary);
            if !summary.failures.is_empty() {
                warn!("{} files could not be written back", summary.failures.len());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Configuration file first, then command-line overrides
async fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!("Config file does not exist: {}", path.display()));
            }
            Config::from_file(path)
                .await
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => match Config::default_path() {
            Some(path) => Config::from_file(&path).await?,
            None => Config::default(),
        },
    };

    if !args.plugin.is_empty() {
        config.plugins = selector::parse_cli(&args.plugin)?;
    }
    if let Some(ref out_dir) = args.out_dir {
        config.out_dir = Some(out_dir.clone());
    }
    if args.delete2x {
        config.delete2x = true;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    Ok(config)
}
