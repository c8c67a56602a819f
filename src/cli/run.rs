use crate::config::parse::load_config;
use crate::config::Config;
use crate::sequence::window::WindowError;
use crate::sequence::{aggregate, write_sequence_file, EventVocabulary, WindowWidth, WriteError};
use crate::source::reader::{Dataset, DatasetReader, ReaderError};
use crate::template::{self, TemplateError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("template parser error: {0}")]
    Template(#[from] TemplateError),

    #[error("window error: {0}")]
    Window(#[from] WindowError),

    #[error("{0}")]
    Reader(#[from] ReaderError),

    #[error("{0}")]
    Write(#[from] WriteError),

    #[error("output directory '{}' is unavailable: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub name: String,
    pub output: PathBuf,
    pub records: usize,
    pub windows: usize,
    pub empty_windows: usize,
    pub unknown_events: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub vocabulary_size: usize,
    pub datasets: Vec<DatasetSummary>,
}

pub fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(config_path) = config_path else {
        return Err("config not found\n\
                    Searched locations:\n  \
                      ~/.config/eventseq/config.yml\n  \
                      /etc/eventseq/config.yml\n\
                    Use --config <path> to specify a config file, or run 'eventseq config init' to generate one."
            .into());
    };

    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(&config_path)?;

    run_pipeline(&config)?;
    Ok(())
}

/// Parse every dataset, number the templates across all of them, then write
/// one window sequence file per dataset.
pub fn run_pipeline(config: &Config) -> Result<RunSummary, RunError> {
    let width = WindowWidth::try_from(config.window)?;
    prepare_output_dir(&config.output_dir, config.create_output_dir)?;

    let reader = DatasetReader::from_config(config)?;
    let mut parser = template::from_config(&config.parser)?;

    // Templates keep evolving until the last dataset is read, so keys are
    // resolved only afterwards.
    let mut parsed = Vec::with_capacity(config.datasets.len());
    for dataset in &config.datasets {
        let path = config.input_path(dataset);
        parsed.push(reader.read_file(&dataset.name, &path, &mut *parser)?);
    }
    let datasets: Vec<Dataset> = parsed
        .into_iter()
        .map(|p| p.resolve(&*parser))
        .collect();

    let vocabulary = EventVocabulary::build(&datasets);
    info!(size = vocabulary.len(), "Event vocabulary built");

    let mut summaries = Vec::with_capacity(datasets.len());
    for (dataset, dataset_config) in datasets.iter().zip(&config.datasets) {
        let output = config.output_path(dataset_config);
        let windows = aggregate(&dataset.records, &vocabulary, width);

        if dataset.records.is_empty() {
            warn!(dataset = %dataset.name, "Dataset has no records, writing empty sequence file");
        }
        write_sequence_file(&output, &windows)?;

        let summary = DatasetSummary {
            name: dataset.name.clone(),
            output,
            records: dataset.records.len(),
            windows: windows.len(),
            empty_windows: windows.iter().filter(|w| w.is_empty()).count(),
            unknown_events: windows
                .iter()
                .flat_map(|w| &w.events)
                .filter(|id| id.is_unknown())
                .count(),
        };
        info!(
            dataset = %summary.name,
            output = %summary.output.display(),
            records = summary.records,
            windows = summary.windows,
            empty_windows = summary.empty_windows,
            "Sequences written"
        );
        summaries.push(summary);
    }

    Ok(RunSummary {
        vocabulary_size: vocabulary.len(),
        datasets: summaries,
    })
}

fn prepare_output_dir(path: &Path, create: bool) -> Result<(), RunError> {
    if path.is_dir() {
        return Ok(());
    }
    if create {
        info!(path = %path.display(), "Creating output directory");
        return std::fs::create_dir_all(path).map_err(|source| RunError::OutputDir {
            path: path.to_path_buf(),
            source,
        });
    }
    Err(RunError::OutputDir {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "directory does not exist and create_output_dir is false",
        ),
    })
}
