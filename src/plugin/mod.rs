//! # Plugin Module
//!
//! Modulo che separa la gestione dei plugin in sottomoduli:
//! - `selector`: Selettori utente e normalizzazione in coppie (nome, opzioni)
//! - `registry`: Registro esplicito nome → factory, con caricamento fail-fast
//! - `builtin`: Plugin built-in che incapsulano i tool esterni
//! - `exec`: Esecuzione asincrona dei tool esterni
//!
//! Un plugin è un oggetto `Plugin`: riceve i byte di un'immagine e restituisce
//! i byte ottimizzati. I plugin vengono applicati in catena, nell'ordine in cui
//! sono stati selezionati.

pub mod builtin;
pub mod exec;
pub mod registry;
pub mod selector;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use registry::{PluginFactory, PluginRegistry};
pub use selector::{normalize, Selector};

/// An optimizer bound to its options
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Identifier the plugin was selected by
    fn name(&self) -> &str;

    /// Optimize one image. Buffers the plugin does not handle are returned unchanged.
    async fn process(&self, data: Vec<u8>) -> Result<Vec<u8>>;
}

/// Opaque options record of a plugin, with typed accessors for the keys the
/// built-in plugins understand
#[derive(Debug, Clone, PartialEq)]
pub struct PluginOptions(Value);

impl PluginOptions {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object()?.get(key)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        self.f64(key).filter(|n| *n >= 0.0).map(|n| n.round() as u64)
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        number(self.get(key)?)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// A `[min, max]` pair of fractions in `0..=1`, e.g. pngquant's `quality`.
    /// A single number is read as the maximum with a minimum of zero.
    pub fn fraction_range(&self, key: &str) -> Option<(f64, f64)> {
        let (min, max) = match self.get(key)? {
            Value::Array(items) if items.len() >= 2 => (number(&items[0])?, number(&items[1])?),
            Value::Array(items) if items.len() == 1 => (0.0, number(&items[0])?),
            value => (0.0, number(value)?),
        };
        let (min, max) = (min.clamp(0.0, 1.0), max.clamp(0.0, 1.0));
        Some((min.min(max), max))
    }

    /// A 0-100 quality. Fractions (`0.8`) and ranges (`[0.6, 0.8]`, upper bound
    /// wins) are scaled, plain numbers above 1 are taken as-is.
    pub fn percent(&self, key: &str) -> Option<u8> {
        let raw = match self.get(key)? {
            Value::Array(items) => number(items.last()?)?,
            value => number(value)?,
        };
        let percent = if raw <= 1.0 { raw * 100.0 } else { raw };
        Some(percent.round().clamp(0.0, 100.0) as u8)
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_accessors() {
        let options = PluginOptions::new(json!({
            "interlaced": true,
            "optimizationLevel": 3,
            "preset": "icon",
            "speed": "4",
        }));

        assert_eq!(options.bool("interlaced"), Some(true));
        assert_eq!(options.u64("optimizationLevel"), Some(3));
        assert_eq!(options.u64("speed"), Some(4));
        assert_eq!(options.str("preset"), Some("icon"));
        assert_eq!(options.bool("missing"), None);
    }

    #[test]
    fn test_quality_scaling() {
        let options = PluginOptions::new(json!({
            "range": [0.6, 0.8],
            "fraction": 0.75,
            "absolute": 95,
        }));

        assert_eq!(options.fraction_range("range"), Some((0.6, 0.8)));
        assert_eq!(options.percent("range"), Some(80));
        assert_eq!(options.percent("fraction"), Some(75));
        assert_eq!(options.percent("absolute"), Some(95));
    }

    #[test]
    fn test_non_object_options_are_ignored() {
        let options = PluginOptions::new(json!("not an object"));
        assert_eq!(options.bool("interlaced"), None);
        assert_eq!(options.percent("quality"), None);
    }
}
