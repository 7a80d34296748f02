pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod fetch;
pub mod io_utils;
pub mod render;
pub mod schema;
pub mod server;
pub mod stats;
pub mod summary;
pub mod table;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    config::ServiceConfig,
    summary::SummaryOptions,
};

pub use crate::{
    error::{AnalyzeError, FetchError, ParseError},
    summary::{Summarizer, Summary, summarize},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_summary", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => handle_serve(&args),
        Commands::Summarize(args) => handle_summarize(&args),
    }
}

fn handle_serve(args: &cli::ServeArgs) -> Result<()> {
    let config = ServiceConfig::from_args(args)?;
    let runtime = tokio::runtime::Runtime::new().context("Starting async runtime")?;
    runtime.block_on(server::serve(config))
}

fn handle_summarize(args: &cli::SummarizeArgs) -> Result<()> {
    config::check_sample_rows(args.sample_rows)?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Summarizing '{}' with delimiter '{}'",
        args.input.display(),
        io_utils::printable_delimiter(delimiter)
    );
    let text = io_utils::read_input(&args.input, encoding)?;
    let options = SummaryOptions {
        include_full_data: args.full_data,
        full_data_row_ceiling: args.full_data_row_ceiling,
        sample_rows: args.sample_rows,
        delimiter,
    };
    let summary = summarize(&text, &options)
        .with_context(|| format!("Summarizing {:?}", args.input))?;

    let rendered = if args.table {
        render::render_profile(&summary)
    } else if args.pretty {
        serde_json::to_string_pretty(&summary).context("Serializing summary")? + "\n"
    } else {
        summary.to_json().context("Serializing summary")? + "\n"
    };
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("Writing summary to stdout")?;
    info!(
        "Summarized {} row(s) across {} column(s)",
        summary.rows, summary.columns
    );
    Ok(())
}
