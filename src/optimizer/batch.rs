//! # Batch Executor
//!
//! Orchestratore di un run completo.
//!
//! ## Flusso di esecuzione:
//! 1. Normalizza i selettori dei plugin e carica la catena (fail-fast)
//! 2. Input da buffer → un solo buffer ottimizzato per lo stdout
//! 3. Più path senza `out_dir` → rifiuto con messaggio d'uso, nessun lavoro
//! 4. Path → spinner, pass di ottimizzazione, poi:
//!    - con `out_dir`: i file sono già stati scritti dal pass
//!    - in place: svuota la directory di input (se è una directory), filtra le
//!      varianti `@2x` se richiesto e riscrive ogni file al suo path sorgente
//!
//! Il risultato è un `RunOutcome`; solo `main` decide cosa stampare e con
//! quale exit code uscire.

use super::pass::{self, OptimizedFile};
use crate::config::Config;
use crate::file_manager::FileManager;
use crate::plugin::{normalize, Plugin, PluginRegistry};
use crate::progress::ProgressManager;
use crate::utils::plural;
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{debug, error};

pub const MULTI_PATH_USAGE: &str =
    "When '--out-dir' is not provided, only one resource path can be provided at a time";

/// What a run operates on
#[derive(Debug, Clone)]
pub enum Input {
    /// Raw image bytes, usually piped through stdin
    Buffer(Vec<u8>),
    /// Files, directories or glob patterns
    Paths(Vec<String>),
}

/// A write-back that did not succeed
#[derive(Debug)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub error: std::io::Error,
}

/// Counters of a completed path run
#[derive(Debug, Default)]
pub struct Summary {
    pub written: usize,
    pub total: usize,
    pub failures: Vec<WriteFailure>,
}

impl Summary {
    /// One-line report, pluralized by the total entry count
    pub fn message(&self) -> String {
        format!("{} {} minified", self.written, plural("image", self.total))
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Optimized bytes of a buffer input
    Stdout(Vec<u8>),
    /// Caller misuse; nothing was optimized
    Rejected(String),
    /// In-place run that produced no entries
    Silent,
    Completed(Summary),
}

pub struct BatchExecutor {
    config: Config,
    registry: PluginRegistry,
}

impl BatchExecutor {
    pub fn new(config: Config, registry: PluginRegistry) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, registry })
    }

    pub async fn run(&self, input: Input) -> Result<RunOutcome> {
        let pairs = normalize(&self.config.plugins);
        debug!("Plugin chain: {:?}", pairs);
        let plugins = self.registry.load(&pairs)?;

        let paths = match input {
            Input::Buffer(data) => {
                let data = pass::optimize_buffer(data, &plugins).await?;
                return Ok(RunOutcome::Stdout(data));
            }
            Input::Paths(paths) => paths,
        };

        if self.config.out_dir.is_none() && paths.len() > 1 {
            return Ok(RunOutcome::Rejected(MULTI_PATH_USAGE.to_string()));
        }

        let spinner = ProgressManager::spinner("Minifying images");
        spinner.start();
        let outcome = self.minify_paths(&paths, &plugins).await;
        spinner.stop();

        outcome
    }

    async fn minify_paths(&self, paths: &[String], plugins: &[Box<dyn Plugin>]) -> Result<RunOutcome> {
        let destination = self.config.out_dir.as_deref();
        let files = pass::optimize_paths(paths, destination, plugins, self.config.workers).await?;
        let total = files.len();

        if destination.is_some() {
            let written = files.iter().filter(|f| f.destination_path.is_some()).count();
            return Ok(RunOutcome::Completed(Summary {
                written,
                total,
                failures: Vec::new(),
            }));
        }

        if let Some(dir) = paths.first().map(Path::new).filter(|p| p.is_dir()) {
            debug!("Clearing {} before writing", dir.display());
            FileManager::clear_dir(dir).with_context(|| format!("Failed to clear directory {}", dir.display()))?;
        }

        if total == 0 {
            return Ok(RunOutcome::Silent);
        }

        let (written, failures) = write_back(files, self.config.delete2x).await;
        Ok(RunOutcome::Completed(Summary {
            written,
            total,
            failures,
        }))
    }
}

/// Write every entry back to its source path. Returns how many writes were
/// attempted and the ones that failed.
async fn write_back(files: Vec<OptimizedFile>, delete2x: bool) -> (usize, Vec<WriteFailure>) {
    let mut tasks = JoinSet::new();
    let mut written = 0;

    for file in files {
        if delete2x && FileManager::is_retina_variant(&file.source_path) {
            debug!("Dropping {}", file.source_path.display());
            continue;
        }

        written += 1;
        tasks.spawn(async move {
            let result = tokio::fs::write(&file.source_path, &file.data).await;
            (file.source_path, result)
        });
    }

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((path, Err(e))) => {
                error!("{} -- fail! {}", path.display(), e);
                failures.push(WriteFailure { path, error: e });
            }
            Err(e) => error!("Write task panicked: {}", e),
        }
    }

    (written, failures)
}
