//! # Tool Path Resolver
//!
//! This module finds the external optimizer binaries the built-in plugins wrap,
//! and the `image2min-<name>` extension executables:
//! - A bundled tools directory (`IMAGE2MIN_TOOLS_DIR`, or `tools/` next to the executable)
//! - System-installed tools on `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a directory of bundled tools
pub const TOOLS_DIR_ENV: &str = "IMAGE2MIN_TOOLS_DIR";

/// Tool path resolver for bundled and system-installed tools
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    /// Base directory where tools are bundled
    tools_dir: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a new path resolver
    pub fn new() -> Self {
        Self {
            tools_dir: Self::detect_bundled_tools_dir(),
        }
    }

    /// Create a resolver with an explicit bundled tools directory
    pub fn with_tools_dir(tools_dir: Option<PathBuf>) -> Self {
        Self { tools_dir }
    }

    /// Detect the bundled tools directory
    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        // Strategy 1: explicit override
        if let Some(tools_dir) = env::var_os(TOOLS_DIR_ENV) {
            let tools_path = PathBuf::from(tools_dir);
            debug!("Checking {}: {:?}", TOOLS_DIR_ENV, tools_path);
            if tools_path.is_dir() {
                return Some(tools_path);
            }
        }

        // Strategy 2: `tools/` shipped next to the executable
        let exe_path = env::current_exe().ok()?;
        let tools_path = exe_path.parent()?.join("tools");
        debug!("Checking tools next to executable: {:?}", tools_path);
        if tools_path.is_dir() {
            return Some(tools_path);
        }

        None
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled_path) = self.find_bundled_tool(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled_path);
                return Some(bundled_path);
            }
        }

        if let Some(system_path) = self.find_in_system_path(tool_name) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        debug!("Tool not found: {}", tool_name);
        None
    }

    /// Look for a tool in the bundled directory
    fn find_bundled_tool(&self, tools_dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let file_name = executable_name(tool_name);

        // 1. Directly in the tools directory: tools/{tool_name}
        // 2. In a tool-specific subfolder: tools/{tool_name}/{tool_name}
        [
            tools_dir.join(&file_name),
            tools_dir.join(tool_name).join(&file_name),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let file_name = executable_name(tool_name);

        env::split_paths(&env::var_os("PATH")?)
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    /// Get installation instructions for a tool on the current platform
    pub fn install_instructions(&self, tool_name: &str) -> String {
        if tool_name == "svgo" {
            return "npm install -g svgo".to_string();
        }

        if cfg!(target_os = "macos") {
            let formula = match tool_name {
                "cjpeg" => "mozjpeg",
                "cwebp" => "webp",
                "jpegtran" => "jpeg-turbo",
                other => other,
            };
            return format!("brew install {}", formula);
        }

        match tool_name {
            "cwebp" => "sudo apt-get install webp".to_string(),
            "jpegtran" => "sudo apt-get install libjpeg-turbo-progs".to_string(),
            "cjpeg" => "sudo apt-get install libjpeg-progs  # or build mozjpeg: https://github.com/mozilla/mozjpeg".to_string(),
            _ => format!("sudo apt-get install {}", tool_name),
        }
    }

    /// Resolve a tool, or return the command that installs it
    pub fn check_tool_with_instructions(&self, tool_name: &str) -> Result<PathBuf, String> {
        self.resolve_tool(tool_name)
            .ok_or_else(|| self.install_instructions(tool_name))
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn executable_name(tool_name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", tool_name)
    } else {
        tool_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_bundled_tool() {
        let temp_dir = TempDir::new().unwrap();
        let tool_path = temp_dir.path().join(executable_name("image2min-test-tool"));
        std::fs::write(&tool_path, b"#!/bin/sh\n").unwrap();

        let resolver = ToolPathResolver::with_tools_dir(Some(temp_dir.path().to_path_buf()));

        assert_eq!(resolver.resolve_tool("image2min-test-tool"), Some(tool_path));
        assert!(resolver.resolve_tool("image2min-other-tool").is_none());
    }

    #[test]
    fn test_resolve_bundled_tool_in_subfolder() {
        let temp_dir = TempDir::new().unwrap();
        let subfolder = temp_dir.path().join("image2min-nested-tool");
        std::fs::create_dir(&subfolder).unwrap();
        let tool_path = subfolder.join(executable_name("image2min-nested-tool"));
        std::fs::write(&tool_path, b"").unwrap();

        let resolver = ToolPathResolver::with_tools_dir(Some(temp_dir.path().to_path_buf()));

        assert_eq!(resolver.resolve_tool("image2min-nested-tool"), Some(tool_path));
    }

    #[test]
    fn test_missing_tool_reports_install_command() {
        let resolver = ToolPathResolver::with_tools_dir(None);
        let result = resolver.check_tool_with_instructions("image2min-definitely-missing");

        assert!(result.unwrap_err().contains("image2min-definitely-missing"));
        assert_eq!(resolver.install_instructions("svgo"), "npm install -g svgo");
    }
}
