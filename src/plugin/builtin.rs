//! # Built-in Plugins
//!
//! Questo modulo definisce i plugin built-in, ognuno dei quali incapsula un
//! tool esterno di ottimizzazione.
//!
//! ## Plugin disponibili:
//!
//! | Plugin     | Tool      | Formati         | Trasporto       |
//! |------------|-----------|-----------------|-----------------|
//! | `gifsicle` | gifsicle  | GIF             | stdin → stdout  |
//! | `jpegtran` | jpegtran  | JPEG            | stdin → stdout  |
//! | `optipng`  | optipng   | PNG             | file temporanei |
//! | `svgo`     | svgo      | SVG             | stdin → stdout  |
//! | `pngquant` | pngquant  | PNG             | stdin → stdout  |
//! | `mozjpeg`  | cjpeg     | JPEG            | stdin → stdout  |
//! | `webp`     | cwebp     | PNG, JPEG, WebP | file temporanei |
//!
//! ## Comportamento:
//! - Un buffer in un formato che il plugin non gestisce passa invariato
//! - Il tool viene risolto al caricamento: se manca, il plugin non si carica
//!   e l'errore riporta il comando di installazione
//! - Exit code non-zero → `OptimizeError::PluginFailed` con lo stderr del tool
//!
//! Le opzioni seguono i nomi dei plugin imagemin (`optimizationLevel`,
//! `interlaced`, `quality`, ...); le chiavi sconosciute vengono ignorate.

use super::registry::PluginRegistry;
use super::{exec, Plugin, PluginOptions};
use crate::error::{OptimizeError, Result};
use crate::format::{self, ImageKind};
use crate::tool_resolver::ToolPathResolver;
use crate::utils::to_string_vec;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use std::time::Instant;
use tracing::{debug, warn};

/// Plugins used when none are selected
pub const DEFAULT_PLUGINS: &[&str] = &["gifsicle", "jpegtran", "optipng", "svgo"];

/// Builds the tool arguments from the plugin options and the input/output
/// locations (`-` for piped tools)
pub type ArgsBuilder = fn(&PluginOptions, &str, &str) -> Vec<String>;

/// How image bytes reach the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Pipe,
    Files,
}

/// Static description of a tool-backed plugin
pub struct ToolSpec {
    pub name: &'static str,
    pub binary: &'static str,
    pub formats: &'static [ImageKind],
    /// Format the tool always produces, `None` when it keeps the input format
    pub output: Option<ImageKind>,
    pub transport: Transport,
    pub args: ArgsBuilder,
    /// Exit codes meaning "nothing better was produced, keep the input"
    pub keep_input_codes: &'static [i32],
}

pub static BUILTINS: &[ToolSpec] = &[
    ToolSpec {
        name: "gifsicle",
        binary: "gifsicle",
        formats: &[ImageKind::Gif],
        output: None,
        transport: Transport::Pipe,
        args: gifsicle_args,
        keep_input_codes: &[],
    },
    ToolSpec {
        name: "jpegtran",
        binary: "jpegtran",
        formats: &[ImageKind::Jpeg],
        output: None,
        transport: Transport::Pipe,
        args: jpegtran_args,
        keep_input_codes: &[],
    },
    ToolSpec {
        name: "optipng",
        binary: "optipng",
        formats: &[ImageKind::Png],
        output: None,
        transport: Transport::Files,
        args: optipng_args,
        keep_input_codes: &[],
    },
    ToolSpec {
        name: "svgo",
        binary: "svgo",
        formats: &[ImageKind::Svg],
        output: None,
        transport: Transport::Pipe,
        args: svgo_args,
        keep_input_codes: &[],
    },
    ToolSpec {
        name: "pngquant",
        binary: "pngquant",
        formats: &[ImageKind::Png],
        output: None,
        transport: Transport::Pipe,
        args: pngquant_args,
        // 98: result larger than input, 99: quality target not reachable
        keep_input_codes: &[98, 99],
    },
    ToolSpec {
        name: "mozjpeg",
        binary: "cjpeg",
        formats: &[ImageKind::Jpeg],
        output: None,
        transport: Transport::Pipe,
        args: mozjpeg_args,
        keep_input_codes: &[],
    },
    ToolSpec {
        name: "webp",
        binary: "cwebp",
        formats: &[ImageKind::Png, ImageKind::Jpeg, ImageKind::WebP],
        output: Some(ImageKind::WebP),
        transport: Transport::Files,
        args: webp_args,
        keep_input_codes: &[],
    },
];

/// Register every built-in plugin
pub fn register_all(registry: &mut PluginRegistry) {
    for spec in BUILTINS {
        let resolver = registry.resolver().clone();
        registry.register(spec.name, move |options: &PluginOptions| {
            ToolPlugin::load(spec, &resolver, options)
        });
    }
}

/// A plugin backed by an external optimizer binary
pub struct ToolPlugin {
    spec: &'static ToolSpec,
    tool: PathBuf,
    options: PluginOptions,
}

impl ToolPlugin {
    /// Resolve the tool binary and bind the options
    pub fn load(
        spec: &'static ToolSpec,
        resolver: &ToolPathResolver,
        options: &PluginOptions,
    ) -> Result<Box<dyn Plugin>> {
        let tool = resolver
            .check_tool_with_instructions(spec.binary)
            .map_err(|install| OptimizeError::PluginNotInstalled {
                name: spec.name.to_string(),
                install,
            })?;

        Ok(Box::new(Self {
            spec,
            tool,
            options: options.clone(),
        }))
    }

    async fn run(&self, kind: ImageKind, data: &[u8]) -> Result<Output> {
        let output = match self.spec.transport {
            Transport::Pipe => {
                let args = (self.spec.args)(&self.options, "-", "-");
                exec::run_piped(&self.tool, &args, data).await?
            }
            Transport::Files => {
                let output_kind = self.spec.output.unwrap_or(kind);
                exec::run_with_files(
                    &self.tool,
                    data,
                    kind.extension(),
                    output_kind.extension(),
                    |input, output| (self.spec.args)(&self.options, input, output),
                )
                .await?
            }
        };
        Ok(output)
    }
}

#[async_trait]
impl Plugin for ToolPlugin {
    fn name(&self) -> &str {
        self.spec.name
    }

    async fn process(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let Some(kind) = format::detect(&data).filter(|kind| self.spec.formats.contains(kind)) else {
            debug!("{} skips a buffer it does not handle", self.spec.name);
            return Ok(data);
        };

        let start_time = Instant::now();
        let output = self.run(kind, &data).await?;
        let elapsed = start_time.elapsed();

        if output.status.success() {
            if output.stdout.is_empty() {
                warn!("{} produced no output, keeping the input", self.spec.name);
                return Ok(data);
            }
            debug!(
                "{} optimized {:?} in {:?}: {} -> {} bytes",
                self.spec.name,
                kind,
                elapsed,
                data.len(),
                output.stdout.len()
            );
            return Ok(output.stdout);
        }

        if let Some(code) = output.status.code().filter(|code| self.spec.keep_input_codes.contains(code)) {
            debug!("{} exited with {}, keeping the input", self.spec.name, code);
            return Ok(data);
        }

        Err(tool_failure(self.spec.name, self.spec.binary, &output))
    }
}

/// A discovered `image2min-<name>` executable: image on stdin, optimized image
/// on stdout, options JSON as the only argument
pub struct ExtensionPlugin {
    name: String,
    tool: PathBuf,
    options_json: String,
}

impl ExtensionPlugin {
    pub fn new(name: String, tool: PathBuf, options: &PluginOptions) -> Self {
        Self {
            name,
            tool,
            options_json: options.as_value().to_string(),
        }
    }
}

#[async_trait]
impl Plugin for ExtensionPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let args = vec![self.options_json.clone()];
        let output = exec::run_piped(&self.tool, &args, &data).await?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(tool_failure(&self.name, &self.tool.to_string_lossy(), &output))
        }
    }
}

fn tool_failure(plugin: &str, binary: &str, output: &Output) -> OptimizeError {
    OptimizeError::PluginFailed {
        plugin: plugin.to_string(),
        message: format!(
            "{} exited with {}: {}",
            binary,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    }
}

fn gifsicle_args(options: &PluginOptions, _input: &str, _output: &str) -> Vec<String> {
    let mut args = to_string_vec(["--no-warnings", "--no-app-extensions"]);
    if options.bool("interlaced") == Some(true) {
        args.push("--interlace".to_string());
    }
    let level = options.u64("optimizationLevel").unwrap_or(1).clamp(1, 3);
    args.push(format!("--optimize={}", level));
    if let Some(colors) = options.u64("colors") {
        args.push(format!("--colors={}", colors.clamp(2, 256)));
    }
    args
}

fn jpegtran_args(options: &PluginOptions, _input: &str, _output: &str) -> Vec<String> {
    let mut args = to_string_vec(["-copy", "none", "-optimize"]);
    if options.bool("progressive") == Some(true) {
        args.push("-progressive".to_string());
    }
    if options.bool("arithmetic") == Some(true) {
        args.push("-arithmetic".to_string());
    }
    args
}

fn optipng_args(options: &PluginOptions, input: &str, output: &str) -> Vec<String> {
    let level = options.u64("optimizationLevel").unwrap_or(3).min(7);
    let mut args = to_string_vec([format!("-o{}", level).as_str(), "-strip", "all", "-quiet"]);
    for (key, flag) in [
        ("bitDepthReduction", "-nb"),
        ("colorTypeReduction", "-nc"),
        ("paletteReduction", "-np"),
    ] {
        if options.bool(key) == Some(false) {
            args.push(flag.to_string());
        }
    }
    if let Some(interlaced) = options.bool("interlaced") {
        args.extend(to_string_vec(["-i", if interlaced { "1" } else { "0" }]));
    }
    args.extend(to_string_vec(["-out", output, input]));
    args
}

fn svgo_args(options: &PluginOptions, input: &str, output: &str) -> Vec<String> {
    let mut args = to_string_vec(["--input", input, "--output", output]);
    if options.bool("multipass") == Some(true) {
        args.push("--multipass".to_string());
    }
    if let Some(precision) = options.u64("precision") {
        args.extend(to_string_vec(["--precision".to_string(), precision.to_string()]));
    }
    args
}

fn pngquant_args(options: &PluginOptions, input: &str, _output: &str) -> Vec<String> {
    let mut args = Vec::new();
    if let Some((min, max)) = options.fraction_range("quality") {
        args.push(format!(
            "--quality={}-{}",
            (min * 100.0).round() as u8,
            (max * 100.0).round() as u8
        ));
    }
    if let Some(speed) = options.u64("speed") {
        args.push(format!("--speed={}", speed.clamp(1, 11)));
    }
    match options.bool("dithering") {
        Some(false) => args.push("--nofs".to_string()),
        _ => {
            if let Some(level) = options.f64("dithering") {
                args.push(format!("--floyd={}", level.clamp(0.0, 1.0)));
            }
        }
    }
    if options.bool("strip") == Some(true) {
        args.push("--strip".to_string());
    }
    args.push(input.to_string());
    args
}

fn mozjpeg_args(options: &PluginOptions, _input: &str, _output: &str) -> Vec<String> {
    let quality = options.percent("quality").unwrap_or(75);
    let mut args = to_string_vec(["-quality".to_string(), quality.to_string()]);
    if options.bool("progressive") == Some(false) {
        args.push("-baseline".to_string());
    }
    args
}

fn webp_args(options: &PluginOptions, input: &str, output: &str) -> Vec<String> {
    let mut args = Vec::new();
    // cwebp wants -preset before every other option
    if let Some(preset) = options.str("preset") {
        args.extend(to_string_vec(["-preset", preset]));
    }
    args.push("-quiet".to_string());
    if options.bool("lossless") == Some(true) {
        args.push("-lossless".to_string());
    }
    if let Some(quality) = options.percent("quality") {
        args.extend(to_string_vec(["-q".to_string(), quality.to_string()]));
    }
    if let Some(method) = options.u64("method") {
        args.extend(to_string_vec(["-m".to_string(), method.min(6).to_string()]));
    }
    args.extend(to_string_vec([input, "-o", output]));
    args
}
