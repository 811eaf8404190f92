//! CLI entry point for the crossword generator.
//!
//! Usage:
//!   generate <structure> <words> [output]
//!
//! Options:
//!   --timeout <seconds>   Stop searching after this long
//!   --max-states <n>      Stop searching after visiting this many states
//!   --json                Print a JSON result instead of the grid
//!
//! Set `RUST_LOG=debug` (or `trace`) to see what the solver is doing.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use serde::Serialize;

use crossword_fill::grid_config::Direction;
use crossword_fill::{
    find_fill, render_grid, save_svg, FillFailure, FillSuccess, GridConfig, SearchConfig,
    WordList,
};

#[derive(Parser)]
#[command(name = "generate")]
#[command(about = "Fill a crossword structure with words from a word list")]
#[command(version)]
struct Cli {
    /// Structure file: `_` or a space marks a fillable cell, anything else is a block
    #[arg(value_name = "STRUCTURE")]
    structure: PathBuf,

    /// Word file: one word per line
    #[arg(value_name = "WORDS")]
    words: PathBuf,

    /// Where to write an SVG image of the solved grid
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Maximum search time in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum number of search states to visit
    #[arg(long)]
    max_states: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

/// Output format for `--json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FillOutput {
    solved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    entries: Vec<EntryOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<StatisticsOutput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryOutput {
    row: usize,
    col: usize,
    direction: Direction,
    length: usize,
    word: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatisticsOutput {
    states: u64,
    backtracks: u64,
    forced_assignments: u64,
    time_elapsed_ms: u64,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GridConfig::from_structure_file(&cli.structure)
        .context("Failed to load structure")?;
    let word_list = WordList::from_file(&cli.words).context("Failed to load words")?;

    let search_config = SearchConfig {
        timeout: cli.timeout.map(Duration::from_secs),
        max_states: cli.max_states,
    };

    let result = find_fill(&config, &word_list, &search_config);

    if cli.json {
        let output = format_result(&config, &word_list, &result);
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    match result {
        Ok(success) => {
            log::info!("solved: {:?}", success.statistics);

            if !cli.json {
                println!("{}", render_grid(&config, &word_list, &success.assignment));
            }

            if let Some(output) = &cli.output {
                if output.extension().map_or(true, |ext| ext != "svg") {
                    log::warn!("{} will contain SVG data", output.display());
                }
                save_svg(&config, &word_list, &success.assignment, output)
                    .context("Failed to save image")?;
            }

            Ok(())
        }
        Err(FillFailure::HardFailure) => {
            if !cli.json {
                println!("No solution.");
            }
            Ok(())
        }
        Err(failure) => Err(failure).context("Search stopped before it finished"),
    }
}

fn elapsed_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn format_result(
    config: &GridConfig,
    word_list: &WordList,
    result: &Result<FillSuccess, FillFailure>,
) -> FillOutput {
    match result {
        Ok(success) => FillOutput {
            solved: true,
            reason: None,
            entries: success
                .assignment
                .iter()
                .map(|(&slot_id, &word_id)| {
                    let (row, col) = config.start(slot_id);
                    EntryOutput {
                        row,
                        col,
                        direction: config.direction(slot_id),
                        length: config.length(slot_id),
                        word: word_list.word(word_id).string.clone(),
                    }
                })
                .collect(),
            statistics: Some(StatisticsOutput {
                states: success.statistics.states,
                backtracks: success.statistics.backtracks,
                forced_assignments: success.statistics.forced_assignments,
                time_elapsed_ms: elapsed_ms(success.statistics.duration),
            }),
        },
        Err(failure) => FillOutput {
            solved: false,
            reason: Some(failure.to_string()),
            entries: vec![],
            statistics: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::elapsed_ms;

    #[test]
    fn test_elapsed_ms_saturates() {
        assert_eq!(elapsed_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(elapsed_ms(Duration::MAX), u64::MAX);
    }
}
