//! # Progress Indication Module
//!
//! Spinner `indicatif` mostrato su stderr mentre il batch è in corso.
//! Lo stdout resta libero per i byte dell'immagine e per il riepilogo.
//!
//! ```text
//! ⠋ Minifying images
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for the path branch of a run
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a spinner; nothing is drawn until `start`
    pub fn spinner(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();

        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());

        Self { bar }
    }

    pub fn start(&self) {
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    /// Stop and erase the spinner
    pub fn stop(&self) {
        self.bar.finish_and_clear();
    }
}
