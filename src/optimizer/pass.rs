//! # Optimization Pass
//!
//! Applica la catena di plugin a un buffer o a un insieme di file.
//!
//! - `optimize_buffer`: un buffer attraverso tutti i plugin, in ordine
//! - `optimize_paths`: espande gli input, ottimizza fino a `workers` file in
//!   parallelo mantenendo l'ordine, e scrive nella destinazione se presente
//!
//! Qualsiasi errore su un file interrompe l'intero pass.

use crate::error::Result;
use crate::file_manager::FileManager;
use crate::format;
use crate::plugin::Plugin;
use anyhow::Context;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One optimized input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedFile {
    pub source_path: PathBuf,
    /// Set when the result was written to a destination directory
    pub destination_path: Option<PathBuf>,
    pub data: Vec<u8>,
}

/// Run a buffer through every plugin, in chain order
pub async fn optimize_buffer(data: Vec<u8>, plugins: &[Box<dyn Plugin>]) -> Result<Vec<u8>> {
    let mut data = data;
    for plugin in plugins {
        data = plugin.process(data).await?;
    }
    Ok(data)
}

/// Optimize every file the inputs expand to. Results follow input order.
pub async fn optimize_paths<S: AsRef<str>>(
    inputs: &[S],
    destination: Option<&Path>,
    plugins: &[Box<dyn Plugin>],
    workers: usize,
) -> anyhow::Result<Vec<OptimizedFile>> {
    let files = FileManager::expand_inputs(inputs)?;
    debug!("Optimizing {} files with {} workers", files.len(), workers);

    stream::iter(files)
        .map(|path| optimize_file(path, destination, plugins))
        .buffered(workers.max(1))
        .try_collect()
        .await
}

async fn optimize_file(
    source_path: PathBuf,
    destination: Option<&Path>,
    plugins: &[Box<dyn Plugin>],
) -> anyhow::Result<OptimizedFile> {
    let (data, destination_path) = process_file(&source_path, destination, plugins)
        .await
        .with_context(|| format!("Error occurred when handling file: {}", source_path.display()))?;

    Ok(OptimizedFile {
        source_path,
        destination_path,
        data,
    })
}

async fn process_file(
    source_path: &Path,
    destination: Option<&Path>,
    plugins: &[Box<dyn Plugin>],
) -> anyhow::Result<(Vec<u8>, Option<PathBuf>)> {
    let original = tokio::fs::read(source_path).await?;
    let original_len = original.len();
    let source_kind = format::detect(&original);

    let data = optimize_buffer(original, plugins).await?;
    debug!("{}: {} -> {} bytes", source_path.display(), original_len, data.len());

    let Some(destination) = destination else {
        return Ok((data, None));
    };

    let target = FileManager::destination_path(source_path, destination, source_kind, format::detect(&data));
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    tokio::fs::write(&target, &data).await?;

    Ok((data, Some(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OptimizeError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Prefixes every buffer with its tag
    struct Tag(&'static str);

    #[async_trait]
    impl Plugin for Tag {
        fn name(&self) -> &str {
            self.0
        }

        async fn process(&self, data: Vec<u8>) -> Result<Vec<u8>> {
            let mut tagged = self.0.as_bytes().to_vec();
            tagged.extend(data);
            Ok(tagged)
        }
    }

    struct Broken;

    #[async_trait]
    impl Plugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn process(&self, _data: Vec<u8>) -> Result<Vec<u8>> {
            Err(OptimizeError::PluginFailed {
                plugin: "broken".to_string(),
                message: "cannot decode".to_string(),
            })
        }
    }

    fn chain() -> Vec<Box<dyn Plugin>> {
        vec![Box::new(Tag("a:")), Box::new(Tag("b:"))]
    }

    #[tokio::test]
    async fn test_buffer_runs_plugins_in_order() {
        let result = optimize_buffer(b"img".to_vec(), &chain()).await.unwrap();
        assert_eq!(result, b"b:a:img");
    }

    #[tokio::test]
    async fn test_paths_keep_input_order_in_place() {
        let temp_dir = TempDir::new().unwrap();
        for (name, body) in [("1.png", "one"), ("2.png", "two"), ("3.png", "three")] {
            std::fs::write(temp_dir.path().join(name), body).unwrap();
        }

        let input = temp_dir.path().to_string_lossy().to_string();
        let files = optimize_paths(&[input], None, &chain(), 2).await.unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|f| f.source_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1.png", "2.png", "3.png"]);
        assert_eq!(files[1].data, b"b:a:two");
        assert!(files.iter().all(|f| f.destination_path.is_none()));
        // In place, the pass itself never writes
        assert_eq!(std::fs::read(temp_dir.path().join("2.png")).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_paths_written_to_destination() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let destination = out.path().join("build");
        std::fs::write(source.path().join("logo.png"), "logo").unwrap();

        let input = source.path().join("logo.png").to_string_lossy().to_string();
        let files = optimize_paths(&[input], Some(destination.as_path()), &chain(), 4).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].destination_path, Some(destination.join("logo.png")));
        assert_eq!(std::fs::read(destination.join("logo.png")).unwrap(), b"b:a:logo");
    }

    #[tokio::test]
    async fn test_plugin_failure_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("bad.png");
        std::fs::write(&file, "bad").unwrap();

        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Broken)];
        let err = optimize_paths(&[file.to_string_lossy().to_string()], None, &plugins, 1)
            .await
            .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("Error occurred when handling file"));
        assert!(message.contains("bad.png"));
        assert!(message.contains("cannot decode"));
    }
}
