//! # Optimizer Module
//!
//! Separa le responsabilità in due sottomoduli:
//! - `pass`: Applica la catena di plugin a buffer e file
//! - `batch`: Orchestratore del run (routing dell'output, filtro `@2x`, riepilogo)

pub mod batch;
pub mod pass;

pub use batch::{BatchExecutor, Input, RunOutcome, Summary, WriteFailure, MULTI_PATH_USAGE};
pub use pass::{optimize_buffer, optimize_paths, OptimizedFile};
