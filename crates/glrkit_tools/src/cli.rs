//! CLI interface for glrkit tools

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glrkit")]
#[command(about = "Inspect and run compiled glrkit parse tables")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a summary of a compiled table
    Inspect {
        /// Compiled table file
        table: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export the automaton of a compiled table as Graphviz DOT
    Dot {
        /// Compiled table file
        table: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a tokens file and print the syntax tree
    Parse {
        /// Compiled table file
        table: PathBuf,

        /// Tokens file, one `kind<TAB>text` per line
        tokens: PathBuf,

        /// Keep temporary nonterminals in the printed tree
        #[arg(long)]
        raw: bool,

        /// Omit byte ranges from the printed tree
        #[arg(long)]
        no_ranges: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Supported: text, json")),
        }
    }
}
