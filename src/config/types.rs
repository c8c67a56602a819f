use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_create_output_dir")]
    pub create_output_dir: bool,
    pub log_format: String,
    pub message_field: String,
    pub timestamp: TimestampConfig,
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,
    #[serde(default)]
    pub parser: ParserConfig,
    pub datasets: Vec<DatasetConfig>,
}

fn default_create_output_dir() -> bool {
    true
}

fn default_window() -> Duration {
    Duration::from_secs(60)
}

impl Config {
    pub fn input_path(&self, dataset: &DatasetConfig) -> PathBuf {
        self.input_dir.join(&dataset.file)
    }

    pub fn output_path(&self, dataset: &DatasetConfig) -> PathBuf {
        self.output_dir.join(dataset.output_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampConfig {
    /// Log format fields joined into one timestamp, e.g. `<Date>:<Time> <Timezone>`
    pub template: String,
    /// strptime format string, 'iso8601', 'epoch', or 'epoch_ms'
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParserConfig {
    Spell {
        #[serde(default = "default_tau")]
        tau: f64,
        #[serde(default)]
        preprocess: Vec<String>,
    },
    Raw,
}

fn default_tau() -> f64 {
    0.5
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig::Spell {
            tau: default_tau(),
            preprocess: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    /// Log file, relative to `input_dir`
    pub file: PathBuf,
    /// Output file name under `output_dir`; defaults to `name`
    #[serde(default)]
    pub output: Option<String>,
}

impl DatasetConfig {
    pub fn output_name(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.name)
    }
}
