use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use applies_logging::ExecContext;

use crate::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "applies", version, about = "Applicant counts and insights for job postings")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        default_value = "applies.ron",
        help = "Configuration file (missing file means defaults)"
    )]
    pub config: PathBuf,
    #[arg(long, global = true, value_enum, help = "Where log lines go")]
    pub log: Option<LogTarget>,
    #[arg(long, global = true, value_enum, help = "Debug-level logging for a context (repeatable)")]
    pub verbose: Vec<ContextArg>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the page for the current posting and print its insights.
    Inspect {
        /// Page the relay is attached to, e.g. a /jobs/ URL with currentJobId.
        #[arg(long)]
        page_url: Option<String>,
        #[arg(long, help = "Page cookie string carrying JSESSIONID")]
        cookie: Option<String>,
        #[arg(long)]
        locale: Option<String>,
        #[arg(long, help = "HTML file standing in for the page markup")]
        html: Option<PathBuf>,
    },
    /// Run the applicant-count extractor over a captured JSON body.
    Extract { file: PathBuf },
    /// List persisted applicant counts.
    Cache {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Badge state for a tab URL.
    Badge { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContextArg {
    Page,
    Content,
    Ui,
}

impl From<ContextArg> for ExecContext {
    fn from(context: ContextArg) -> Self {
        match context {
            ContextArg::Page => ExecContext::Page,
            ContextArg::Content => ExecContext::Content,
            ContextArg::Ui => ExecContext::Ui,
        }
    }
}
