//! Command-line argument parsing for the headless `aqlexec` binary.

use clap::Parser;
use std::path::PathBuf;

use crate::host::Selection;
use crate::session::RunMode;

/// Run AQL queries from a file against an ArangoDB server.
#[derive(Parser, Debug)]
#[command(name = "aqlexec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Query file (.aql) to run
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Select (and remember) a named connection from the config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH", env = "AQLEXEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fetch execution plans instead of running the queries
    #[arg(long, conflicts_with = "append")]
    pub explain: bool,

    /// Append to previous results instead of replacing them
    #[arg(long)]
    pub append: bool,

    /// Byte range START:END of FILE to run (repeatable)
    #[arg(long = "selection", value_name = "START:END", value_parser = parse_selection)]
    pub selections: Vec<Selection>,

    /// List configured connections
    #[arg(long)]
    pub list: bool,

    /// List collections of the active connection
    #[arg(long)]
    pub collections: bool,

    /// Write logs to PATH instead of stderr (default: the state directory)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub log_file: Option<Option<PathBuf>>,
}

/// Parses `START:END` into a selection.
fn parse_selection(s: &str) -> std::result::Result<Selection, String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("Invalid selection: '{s}'. Expected START:END (e.g., 0:120)"))?;
    let start = start
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid selection start: '{start}'"))?;
    let end = end
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid selection end: '{end}'"))?;
    Ok((start, end))
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Log file to use, if logging should not go to stderr.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .map(|path| path.unwrap_or_else(crate::logging::get_log_path))
    }

    /// The run mode selected by the flags.
    pub fn run_mode(&self) -> RunMode {
        if self.explain {
            RunMode::Explain
        } else if self.append {
            RunMode::ExecuteAppend
        } else {
            RunMode::Execute
        }
    }
}
