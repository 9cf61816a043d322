//! # Plugin Registry
//!
//! Registro esplicito che associa ogni nome di plugin a una factory.
//!
//! ## Risoluzione di un nome:
//! 1. Factory registrata (built-in o aggiunta con `register`)
//! 2. Estensione esterna: un eseguibile `image2min-<nome>` nella directory dei
//!    tool o nel `PATH`, usato come filtro stdin → stdout
//! 3. Altrimenti `OptimizeError::PluginNotInstalled` con il comando di installazione
//!
//! ## Caricamento fail-fast:
//! `load()` istanzia i plugin nell'ordine della catena e si ferma al primo
//! plugin non risolvibile: una catena parziale non viene mai eseguita.

use super::builtin::{self, ExtensionPlugin};
use super::{Plugin, PluginOptions};
use crate::error::{OptimizeError, Result};
use crate::tool_resolver::ToolPathResolver;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Prefix of discoverable extension executables
pub const EXTENSION_PREFIX: &str = "image2min";

/// Builds a plugin instance from its options
pub type PluginFactory = Arc<dyn Fn(&PluginOptions) -> Result<Box<dyn Plugin>> + Send + Sync>;

/// Mapping from plugin identifier to factory
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
    resolver: ToolPathResolver,
}

impl PluginRegistry {
    /// An empty registry; only extension executables resolve
    pub fn new(resolver: ToolPathResolver) -> Self {
        Self {
            factories: HashMap::new(),
            resolver,
        }
    }

    /// A registry holding every built-in plugin
    pub fn with_builtins() -> Self {
        let mut registry = Self::new(ToolPathResolver::new());
        builtin::register_all(&mut registry);
        registry
    }

    pub fn resolver(&self) -> &ToolPathResolver {
        &self.resolver
    }

    /// Register (or replace) a plugin factory
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&PluginOptions) -> Result<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Registered plugin names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Find the factory for a plugin, `None` when it cannot be located
    pub fn resolve(&self, name: &str) -> Option<PluginFactory> {
        if let Some(factory) = self.factories.get(name) {
            return Some(Arc::clone(factory));
        }

        let executable = format!("{}-{}", EXTENSION_PREFIX, name);
        let tool = self.resolver.resolve_tool(&executable)?;
        debug!("Plugin {} resolved to extension {:?}", name, tool);

        let plugin_name = name.to_string();
        Some(Arc::new(move |options: &PluginOptions| {
            Ok(Box::new(ExtensionPlugin::new(plugin_name.clone(), tool.clone(), options)) as Box<dyn Plugin>)
        }))
    }

    /// Instantiate the plugin chain, in order. Fails on the first plugin that
    /// cannot be resolved.
    pub fn load(&self, pairs: &[(String, Value)]) -> Result<Vec<Box<dyn Plugin>>> {
        let mut plugins = Vec::with_capacity(pairs.len());

        for (name, options) in pairs {
            let factory = self.resolve(name).ok_or_else(|| OptimizeError::PluginNotInstalled {
                name: name.clone(),
                install: format!("cargo install {}-{}", EXTENSION_PREFIX, name),
            })?;
            let plugin = factory(&PluginOptions::new(options.clone()))?;
            debug!("Loaded plugin {}", plugin.name());
            plugins.push(plugin);
        }

        Ok(plugins)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
