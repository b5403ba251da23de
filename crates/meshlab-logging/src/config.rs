//! Logging configuration
//!
//! Plain builder-style structs. A simulation run decides its logging from
//! CLI flags, so nothing here is loaded from files.

use std::path::PathBuf;

/// What the subscriber writes, and where
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset
    pub default_level: String,
    pub console: ConsoleConfig,
    /// JSONL file output, off when `None`
    pub file: Option<FileConfig>,
    /// Shape of JSONL lines, console and file alike
    pub jsonl: JsonlConfig,
}

impl Default for LogConfig {
    /// JSONL on stdout at `info`
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig::jsonl(),
            file: None,
            jsonl: JsonlConfig::default(),
        }
    }
}

impl LogConfig {
    /// Pretty, colored console output at `debug`
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            console: ConsoleConfig::pretty(true),
            ..Default::default()
        }
    }

    /// Quiet console, every `debug` line of the run in `<log_dir>/meshlab.log`
    pub fn recording(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_level: "debug".to_string(),
            console: ConsoleConfig::disabled(),
            file: Some(FileConfig::single_file(log_dir, "meshlab")),
            jsonl: JsonlConfig::default(),
        }
    }

    /// Warnings only, so test output stays readable
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            ..Default::default()
        }
    }
}

/// Console output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Human-readable lines instead of JSONL
    pub pretty: bool,
    /// ANSI colors; only used for pretty output
    pub ansi: bool,
}

impl ConsoleConfig {
    pub fn jsonl() -> Self {
        Self {
            enabled: true,
            pretty: false,
            ansi: false,
        }
    }

    pub fn pretty(ansi: bool) -> Self {
        Self {
            enabled: true,
            pretty: true,
            ansi,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::jsonl()
        }
    }
}

/// JSONL file output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name is `<prefix>.log`, or `<prefix>.<date>.log` when rotating
    pub prefix: String,
    pub rotation: RotationStrategy,
}

impl FileConfig {
    /// One file per run, truncated when logging starts
    pub fn single_file(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self::rolling(directory, prefix, RotationStrategy::Never)
    }

    pub fn rolling(
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        rotation: RotationStrategy,
    ) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            rotation,
        }
    }
}

/// When a new log file is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// Single file, truncated on start
    Never,
}

/// Extra data attached to each JSONL line
///
/// Event fields are always flattened to the top level of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonlConfig {
    /// The full span stack, not only the innermost span
    pub span_list: bool,
    /// Source file and line
    pub source_location: bool,
    /// Worker thread id and name; nodes migrate between tokio workers
    pub thread_ids: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            span_list: true,
            source_location: true,
            thread_ids: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_jsonl_console() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, "info");
        assert_eq!(config.console, ConsoleConfig::jsonl());
        assert!(config.file.is_none());
    }

    #[test]
    fn test_development_is_pretty() {
        let config = LogConfig::development();
        assert_eq!(config.default_level, "debug");
        assert!(config.console.pretty && config.console.ansi);
    }

    #[test]
    fn test_recording_writes_single_file_only() {
        let config = LogConfig::recording("/tmp/meshlab-logs");
        assert!(!config.console.enabled);
        assert_eq!(
            config.file,
            Some(FileConfig {
                directory: PathBuf::from("/tmp/meshlab-logs"),
                prefix: "meshlab".to_string(),
                rotation: RotationStrategy::Never,
            })
        );
    }

    #[test]
    fn test_testing_keeps_console() {
        let config = LogConfig::testing();
        assert_eq!(config.default_level, "warn");
        assert!(config.console.enabled);
    }
}
