//! # External Tool Execution
//!
//! Runs the optimizer binaries behind the plugins with `tokio::process`.
//! Tools either filter stdin to stdout (`run_piped`) or need real files on
//! disk (`run_with_files`), in which case a temporary directory holds them.

use std::io;
use std::path::Path;
use std::process::{Output, Stdio};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Feed `input` to the tool on stdin and capture its stdout.
pub async fn run_piped(tool: &Path, args: &[String], input: &[u8]) -> io::Result<Output> {
    debug!("Running {:?} {:?} ({} bytes on stdin)", tool, args, input.len());

    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "tool stdin unavailable"))?;
    let input = input.to_vec();
    // Written concurrently with reading stdout, so large images cannot deadlock on full pipes
    let writer = tokio::spawn(async move { stdin.write_all(&input).await });

    let output = child.wait_with_output().await?;

    match writer.await {
        Ok(Ok(())) => {}
        // The tool may exit without draining stdin, its exit status tells the story
        Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
        Ok(Err(e)) => return Err(e),
        Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
    }

    Ok(output)
}

/// Write `input` to a temporary file, run the tool on it, and read back the
/// file it produced. On success the returned `Output::stdout` holds the
/// produced file's contents.
pub async fn run_with_files<F>(
    tool: &Path,
    input: &[u8],
    input_extension: &str,
    output_extension: &str,
    build_args: F,
) -> io::Result<Output>
where
    F: FnOnce(&str, &str) -> Vec<String>,
{
    let temp_dir = TempDir::new()?;
    let input_path = temp_dir.path().join(format!("input.{}", input_extension));
    let output_path = temp_dir.path().join(format!("output.{}", output_extension));
    tokio::fs::write(&input_path, input).await?;

    let input_arg = input_path.to_string_lossy().into_owned();
    let output_arg = output_path.to_string_lossy().into_owned();
    let args = build_args(input_arg.as_str(), output_arg.as_str());
    debug!("Running {:?} {:?}", tool, args);

    let mut output = Command::new(tool)
        .args(&args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    if output.status.success() {
        output.stdout = tokio::fs::read(&output_path).await?;
    }

    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_piped_roundtrips_through_cat() {
        let output = run_piped(Path::new("cat"), &[], b"image bytes").await.unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout, b"image bytes");
    }

    #[tokio::test]
    async fn test_run_with_files_reads_produced_file() {
        let output = run_with_files(Path::new("cp"), b"payload", "png", "png", |input, output| {
            vec![input.to_string(), output.to_string()]
        })
        .await
        .unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout, b"payload");
    }

    #[tokio::test]
    async fn test_failed_tool_keeps_status() {
        let output = run_piped(Path::new("false"), &[], b"").await.unwrap();
        assert!(!output.status.success());
    }
}
