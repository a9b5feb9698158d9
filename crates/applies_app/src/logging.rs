//! Logging initialization for the applies binary.
//!
//! Writes logs to `./applies.log` in the current working directory. Each
//! execution context (page, content, ui) gets its own logger so its level can
//! be tuned separately; untagged lines (dependencies, setup) share a fourth.

use std::fs::File;
use std::path::PathBuf;

use applies_logging::{applies_info, ExecContext};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./applies.log";

const CONTEXTS: [ExecContext; 3] = [ExecContext::Page, ExecContext::Content, ExecContext::Ui];

/// Destination for log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogDestination {
    /// Write to ./applies.log in current directory.
    #[default]
    File,
    /// Write to terminal (stderr for warnings and errors).
    Terminal,
    /// Write to both file and terminal.
    Both,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    fn filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Warn,
            Verbosity::Normal => LevelFilter::Info,
            Verbosity::Verbose => LevelFilter::Debug,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
        }
    }
}

/// Verbosity per execution context, as read from `applies.ron`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextLevels {
    pub page: Verbosity,
    pub content: Verbosity,
    pub ui: Verbosity,
    /// Lines logged without a context.
    pub other: Verbosity,
}

impl ContextLevels {
    pub fn for_context(&self, context: ExecContext) -> Verbosity {
        match context {
            ExecContext::Page => self.page,
            ExecContext::Content => self.content,
            ExecContext::Ui => self.ui,
        }
    }

    pub fn raise(&mut self, context: ExecContext) {
        match context {
            ExecContext::Page => self.page = Verbosity::Verbose,
            ExecContext::Content => self.content = Verbosity::Verbose,
            ExecContext::Ui => self.ui = Verbosity::Verbose,
        }
    }

    /// e.g. `page=normal content=verbose ui=normal other=normal`
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = CONTEXTS
            .iter()
            .map(|context| format!("{}={}", context.label(), self.for_context(*context).label()))
            .collect();
        parts.push(format!("other={}", self.other.label()));
        parts.join(" ")
    }

    /// One (level, config) pair per logger: a target filter for every context,
    /// then the untagged catch-all.
    fn sinks(&self) -> Vec<(LevelFilter, Config)> {
        let mut sinks: Vec<(LevelFilter, Config)> = CONTEXTS
            .iter()
            .map(|context| {
                let config = base_config()
                    .add_filter_allow_str(context.target())
                    .build();
                (self.for_context(*context).filter(), config)
            })
            .collect();

        let mut other = base_config();
        for context in CONTEXTS {
            other.add_filter_ignore_str(context.target());
        }
        sinks.push((self.other.filter(), other.build()));
        sinks
    }
}

/// Initialize the logger with the specified destination and per-context levels.
///
/// For `LogDestination::File` or `Both`, creates `./applies.log` in the
/// current working directory.
pub fn initialize(destination: LogDestination, levels: ContextLevels) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if matches!(destination, LogDestination::Terminal | LogDestination::Both) {
        for (level, config) in levels.sinks() {
            loggers.push(TermLogger::new(
                level,
                config,
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ));
        }
    }
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        if let Some(file) = create_log_file() {
            for (level, config) in levels.sinks() {
                match file.try_clone() {
                    Ok(handle) => loggers.push(WriteLogger::new(level, config, handle)),
                    Err(err) => eprintln!("Warning: Could not share log file handle: {}", err),
                }
            }
        }
    }
    if loggers.is_empty() {
        return;
    }

    if CombinedLogger::init(loggers).is_ok() {
        applies_info!("log levels: {}", levels.summary());
    }
}

fn base_config() -> ConfigBuilder {
    let mut builder = ConfigBuilder::new();
    builder
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Trace);
    builder
}

fn create_log_file() -> Option<File> {
    let log_path = PathBuf::from(LOG_FILE);
    match File::create(&log_path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}
