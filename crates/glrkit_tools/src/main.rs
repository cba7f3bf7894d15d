//! glrkit CLI
//!
//! Command-line tools for working with compiled glrkit tables.

use clap::Parser;
use glrkit::CompiledTable;
use glrkit::backend::glr::{GlrConfig, GlrParser};
use glrkit::syntax::{PrettyConfig, render_tagged};
use glrkit_tools::cli::{Cli, Commands, OutputFormat};
use glrkit_tools::tokens::read_tokens;
use glrkit_tools::{TableReport, ToolError, generate_dot};
use std::fs;
use std::process::ExitCode;

fn run(cli: Cli) -> Result<(), ToolError> {
    match cli.command {
        Commands::Inspect { table, format } => {
            let table = CompiledTable::load(&table)?;
            let report = TableReport::from_table(&table);
            match format {
                OutputFormat::Text => print!("{}", report.render_text()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Dot { table, output } => {
            let dot = generate_dot(&CompiledTable::load(&table)?);
            match output {
                Some(path) => fs::write(path, dot)?,
                None => print!("{dot}"),
            }
        }
        Commands::Parse {
            table,
            tokens,
            raw,
            no_ranges,
        } => {
            let table = CompiledTable::load(&table)?;
            let tokens = read_tokens(&fs::read_to_string(tokens)?)?;
            let config = GlrConfig {
                clean_tree: !raw,
                ..GlrConfig::default()
            };
            let outcome = GlrParser::new(&table, config).parse(tokens)?;
            let pretty = PrettyConfig {
                show_ranges: !no_ranges,
                ..PrettyConfig::default()
            };
            print!("{}", render_tagged(&outcome.root, &pretty));
            eprintln!(
                "parsed {} tokens: {} reductions, {} forks, peak {} branches, {:?}",
                outcome.metrics.tokens_consumed,
                outcome.metrics.reductions,
                outcome.metrics.forks,
                outcome.metrics.peak_branches,
                outcome.metrics.parse_time
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
