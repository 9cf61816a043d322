//! # image2min Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per diverse operazioni
//! - `file_manager`: Espansione degli input e operazioni sui file
//! - `format`: Riconoscimento del formato di un buffer
//! - `plugin`: Selettori, registro dei plugin e plugin built-in
//! - `optimizer`: Pass di ottimizzazione e orchestratore del batch
//! - `progress`: Spinner durante il batch
//! - `tool_resolver`: Ricerca dei tool esterni
//!
//! ## Utilizzo:
//! ```ignore
//! use image2min::{BatchExecutor, Config, Input, PluginRegistry, RunOutcome};
//!
//! let executor = BatchExecutor::new(Config::default(), PluginRegistry::with_builtins())?;
//! match executor.run(Input::Paths(vec!["images".to_string()])).await? {
//!     RunOutcome::Completed(summary) => println!("{}", summary),
//!     _ => {}
//! }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod format;
pub mod optimizer;
pub mod plugin;
pub mod progress;
pub mod tool_resolver;
pub mod utils;

pub use config::Config;
pub use error::OptimizeError;
pub use optimizer::{BatchExecutor, Input, RunOutcome, Summary};
pub use plugin::{PluginRegistry, Selector};
