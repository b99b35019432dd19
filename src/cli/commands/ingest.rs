//! Record ingestion CLI command

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::{load_initialized_config, open_store, runtime};
use crate::cli::error::CliError;
use crate::cli::output::{OutputFormat, format_report};
use crate::import::{discover_files, load_all};
use crate::ingest::{IngestConfigBuilder, IngestionPipeline};
use crate::models::Record;

/// `ingest` arguments
#[derive(Debug, Clone)]
pub struct IngestArgs {
    /// Input files or glob patterns
    pub inputs: Vec<String>,
    /// Workspace directory holding the config file
    pub workspace: PathBuf,
    /// Collection override
    pub collection: Option<String>,
    /// Natural key field override
    pub key_field: Option<String>,
    /// Display field override
    pub display_field: Option<String>,
    /// Tag stamped onto accepted records (defaults to the run id)
    pub tag: Option<String>,
    /// Batch size override
    pub batch_size: Option<usize>,
    /// Required fields override
    pub required_fields: Vec<String>,
    /// Output format ("text" or "json")
    pub format: String,
    /// Suppress the progress bar
    pub quiet: bool,
}

/// Load the input files and run one ingestion
pub fn handle_ingest(args: &IngestArgs) -> Result<(), CliError> {
    let output_format: OutputFormat = args
        .format
        .parse()
        .map_err(|e: String| CliError::InvalidArgument(e))?;

    let config = load_initialized_config(&args.workspace)?;

    let mut builder = IngestConfigBuilder::from(&config.ingest);
    if let Some(collection) = &args.collection {
        builder = builder.collection(collection.as_str());
    }
    if let Some(key_field) = &args.key_field {
        builder = builder.key_field(key_field.as_str());
    }
    if let Some(display_field) = &args.display_field {
        builder = builder.display_field(display_field.as_str());
    }
    if let Some(batch_size) = args.batch_size {
        builder = builder.batch_size(batch_size);
    }
    if !args.required_fields.is_empty() {
        builder = builder.required_fields(args.required_fields.iter().cloned());
    }
    let ingest_config = builder
        .build()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    let records = load_inputs(&args.inputs, &args.workspace)?;
    let total = records.len() as u64;

    let store = open_store(&config, &args.workspace)?;
    let mut pipeline = IngestionPipeline::new(store, ingest_config);

    let bar = (!args.quiet).then(|| progress_bar(total));
    if let Some(bar) = &bar {
        let bar = bar.clone();
        pipeline = pipeline.with_progress(move |progress| {
            bar.set_position(progress.processed as u64);
            bar.set_message(format!(
                "batch {}/{}",
                progress.batches_done, progress.batches_total
            ));
        });
    }

    let result = runtime()?.block_on(pipeline.run(records, args.tag.as_deref()));
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    let report = result?;

    println!("{}", format_report(&report, output_format)?);
    Ok(())
}

/// Resolve inputs (paths or glob patterns) and load their records in order
fn load_inputs(inputs: &[String], workspace: &Path) -> Result<Vec<Record>, CliError> {
    let mut paths = Vec::new();
    for input in inputs {
        if is_pattern(input) {
            let matched = discover_files(workspace, input)?;
            if matched.is_empty() {
                return Err(CliError::NoFilesMatched(input.clone()));
            }
            paths.extend(matched);
        } else {
            let path = PathBuf::from(input);
            if !path.exists() {
                return Err(CliError::FileNotFound(path));
            }
            paths.push(path);
        }
    }

    Ok(load_all(&paths)?)
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30}] {pos}/{len} records {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
