//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare gli errori possibili
//! - Fornisce messaggi descrittivi, incluse le istruzioni di installazione
//!   quando un plugin non può essere risolto
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `PluginNotInstalled`: Plugin sconosciuto o tool esterno mancante
//! - `PluginFailed`: Il tool esterno di un plugin è fallito
//! - `InvalidSelector`: Selettore `--plugin` malformato
//! - `Glob`: Pattern glob non valido
//! - `Validation`: Errori di validazione della configurazione
//!
//! ## Esempio:
//! ```ignore
//! if resolver.resolve_tool("gifsicle").is_none() {
//!     return Err(OptimizeError::PluginNotInstalled {
//!         name: "gifsicle".to_string(),
//!         install: "sudo apt-get install gifsicle".to_string(),
//!     });
//! }
//! ```

/// Custom error types for image minification
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown plugin: {name}\n\nDid you forget to install the plugin?\nYou can install it with:\n\n  $ {install}")]
    PluginNotInstalled { name: String, install: String },

    #[error("Plugin {plugin} failed: {message}")]
    PluginFailed { plugin: String, message: String },

    #[error("Invalid plugin selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Configuration error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, OptimizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_not_installed_message() {
        let err = OptimizeError::PluginNotInstalled {
            name: "pngquant".to_string(),
            install: "sudo apt-get install pngquant".to_string(),
        };
        let message = err.to_string();

        assert!(message.starts_with("Unknown plugin: pngquant"));
        assert!(message.contains("Did you forget to install the plugin?"));
        assert!(message.ends_with("$ sudo apt-get install pngquant"));
    }
}
