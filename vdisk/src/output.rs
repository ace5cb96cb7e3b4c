//! Output formatting for one-shot CLI commands.
//!
//! Provides abstraction layer for outputting results in text or JSON format.

use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};
use vdisk_core::AppRecord;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Write output using the configured format.
    ///
    /// The `data` parameter must be a serializable struct that includes
    /// `success: bool` and `result_code: u8` fields.
    ///
    /// The `text_fn` closure is called only in text mode to generate the
    /// human-readable output.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(&self.stdout, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(&self.stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

/// Output for `ls` command.
#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

/// Output for `cat` command.
#[derive(Debug, Serialize)]
pub struct CatOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub content: String,
}

/// Output for `write` command.
#[derive(Debug, Serialize)]
pub struct WriteOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub bytes: usize,
}

/// Output for `mkdir` command.
#[derive(Debug, Serialize)]
pub struct MkdirOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
}

/// Output for `rm` command.
#[derive(Debug, Serialize)]
pub struct RmOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
}

/// Output for `rmdir` command.
#[derive(Debug, Serialize)]
pub struct RmdirOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
}

/// Output for `apps` command.
#[derive(Debug, Serialize)]
pub struct AppsOutput {
    pub success: bool,
    pub result_code: u8,
    pub apps: Vec<AppRecord>,
}

/// Output for `appinfo` command.
#[derive(Debug, Serialize)]
pub struct AppinfoOutput {
    pub success: bool,
    pub result_code: u8,
    pub app: AppRecord,
}

/// Output for `dump` command.
#[derive(Debug, Serialize)]
pub struct DumpOutput {
    pub success: bool,
    pub result_code: u8,
    pub image: String,
}
