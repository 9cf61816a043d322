//! # Plugin Selectors
//!
//! Questo modulo trasforma i selettori forniti dall'utente in una lista
//! uniforme di coppie `(nome, opzioni)`.
//!
//! ## Responsabilità:
//! - `Selector`: un nome semplice (`Named`) o un nome con opzioni (`Configured`)
//! - `normalize()`: deduplica per nome (l'ultimo vince, senza spostare la posizione)
//! - `parse_cli()`: interpreta i valori di `--plugin`
//! - `serde_list`: (de)serializza la lista `plugins` del file di configurazione
//!
//! ## Sintassi `--plugin`:
//! ```text
//! -p pngquant                                     -> Named("pngquant")
//! -p 'webp={"quality":95,"preset":"icon"}'        -> Configured("webp", {...})
//! -p pngquant.quality=0.1 -p pngquant.quality=0.2 -> Configured("pngquant", {"quality":[0.1,0.2]})
//! ```

use crate::error::{OptimizeError, Result};
use serde_json::{json, Map, Value};

/// User-supplied description of which plugin to use and with what options
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Named(String),
    Configured(String, Value),
}

impl Selector {
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::Configured(name, _) => name,
        }
    }
}

/// Options given to a plugin selected by bare name
pub fn default_options() -> Value {
    json!({ "quality": [0.6, 0.8] })
}

/// Collapse selectors into ordered `(name, options)` pairs, one per name.
///
/// A name keeps the position of its first occurrence; later selectors for the
/// same name replace its options.
pub fn normalize(selectors: &[Selector]) -> Vec<(String, Value)> {
    let mut pairs: Vec<(String, Value)> = Vec::with_capacity(selectors.len());

    for selector in selectors {
        let (name, options) = match selector {
            Selector::Named(name) => (name, default_options()),
            Selector::Configured(name, options) => (name, options.clone()),
        };

        match pairs.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = options,
            None => pairs.push((name.clone(), options)),
        }
    }

    pairs
}

/// Parse the values of repeated `--plugin` flags.
///
/// Dotted assignments for one plugin are gathered into a single `Configured`
/// selector placed where that plugin's first assignment appeared. Assigning the
/// same key twice collects the values into an array.
pub fn parse_cli<S: AsRef<str>>(values: &[S]) -> Result<Vec<Selector>> {
    let mut selectors = Vec::with_capacity(values.len());
    // plugin name -> index of its gathered dotted selector
    let mut gathered: Vec<(String, usize)> = Vec::new();

    for raw in values {
        let raw = raw.as_ref().trim();
        let invalid = |reason: &str| OptimizeError::InvalidSelector {
            selector: raw.to_string(),
            reason: reason.to_string(),
        };

        let Some((head, value)) = raw.split_once('=') else {
            if raw.is_empty() || raw.contains('.') {
                return Err(invalid("expected `name`, `name.option=value` or `name={json}`"));
            }
            selectors.push(Selector::Named(raw.to_string()));
            continue;
        };

        match head.split_once('.') {
            None => {
                if head.is_empty() {
                    return Err(invalid("plugin name is empty"));
                }
                let options: Value = serde_json::from_str(value)
                    .map_err(|e| invalid(&format!("options are not valid JSON ({})", e)))?;
                selectors.push(Selector::Configured(head.to_string(), options));
            }
            Some((name, path)) => {
                let keys: Vec<&str> = path.split('.').collect();
                if name.is_empty() || keys.iter().any(|key| key.is_empty()) {
                    return Err(invalid("empty plugin name or option key"));
                }

                let index = match gathered.iter().find(|(existing, _)| existing == name) {
                    Some((_, index)) => *index,
                    None => {
                        selectors.push(Selector::Configured(name.to_string(), Value::Object(Map::new())));
                        gathered.push((name.to_string(), selectors.len() - 1));
                        selectors.len() - 1
                    }
                };

                if let Selector::Configured(_, Value::Object(options)) = &mut selectors[index] {
                    assign(options, &keys, parse_scalar(value));
                }
            }
        }
    }

    Ok(selectors)
}

/// Values are JSON when they parse as JSON (`0.1`, `true`, `[1,2]`), strings otherwise.
fn parse_scalar(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn assign(options: &mut Map<String, Value>, keys: &[&str], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = options;
    for key in parents {
        let slot = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }

    match current.get_mut(*last) {
        None => {
            current.insert(last.to_string(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

/// Serde adapter for the `plugins` list of the configuration file:
/// strings are `Named`, every entry of an object is a `Configured`.
pub mod serde_list {
    use super::Selector;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Value};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum RawSelector {
        Name(String),
        Map(Map<String, Value>),
    }

    pub fn serialize<S: Serializer>(selectors: &[Selector], serializer: S) -> Result<S::Ok, S::Error> {
        let raw: Vec<RawSelector> = selectors
            .iter()
            .map(|selector| match selector {
                Selector::Named(name) => RawSelector::Name(name.clone()),
                Selector::Configured(name, options) => {
                    let mut map = Map::new();
                    map.insert(name.clone(), options.clone());
                    RawSelector::Map(map)
                }
            })
            .collect();
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Selector>, D::Error> {
        let raw = Vec::<RawSelector>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .flat_map(|entry| match entry {
                RawSelector::Name(name) => vec![Selector::Named(name)],
                RawSelector::Map(map) => map
                    .into_iter()
                    .map(|(name, options)| Selector::Configured(name, options))
                    .collect(),
            })
            .collect())
    }
}
