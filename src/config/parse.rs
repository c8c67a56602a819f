use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars, expand_tilde};
use crate::sequence::window::WindowWidth;
use crate::source::format::LogFormat;
use crate::source::timestamp::TimestampExtractor;
use crate::template::SpellParser;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parse and validate config text. Environment variables are expanded
/// before parsing and `~` in paths afterwards.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;
    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut unexpanded_vars: Vec<String> = env_var_pattern()
        .captures_iter(yaml_string)
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}\n\
         \n\
         To fix this, either:\n\
         1. Set the environment variables (e.g., export DATA_DIR=/path/to/logs)\n\
         2. Replace the variables in the config file with actual paths",
        unexpanded_vars.join(", ")
    )))
}

fn expand_paths(config: &mut Config) {
    config.input_dir = expand_tilde(&config.input_dir);
    config.output_dir = expand_tilde(&config.output_dir);
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_datasets(config, &mut errors);
    validate_structure(config, &mut errors);

    if let ParserConfig::Spell { tau, preprocess } = &config.parser {
        if let Err(e) = SpellParser::new(*tau, preprocess) {
            errors.push(format!("parser: {}", e));
        }
    }

    if let Err(e) = WindowWidth::try_from(config.window) {
        errors.push(format!("window: {}", e));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_datasets(config: &Config, errors: &mut Vec<String>) {
    if config.datasets.is_empty() {
        errors.push("config must list at least one dataset".to_string());
    }

    let mut names = HashSet::new();
    let mut outputs = HashSet::new();
    for (i, dataset) in config.datasets.iter().enumerate() {
        if dataset.name.is_empty() {
            errors.push(format!("datasets[{}]: name cannot be empty", i));
        } else if !names.insert(dataset.name.as_str()) {
            errors.push(format!("datasets[{}]: duplicate dataset name '{}'", i, dataset.name));
        }

        if dataset.file.as_os_str().is_empty() {
            errors.push(format!("dataset '{}': file cannot be empty", dataset.name));
        }

        let output = dataset.output_name();
        if output.is_empty() {
            errors.push(format!("dataset '{}': output cannot be empty", dataset.name));
        } else if output.contains('/') || output.contains('\\') {
            errors.push(format!(
                "dataset '{}': output '{}' must be a file name, not a path",
                dataset.name, output
            ));
        } else if !outputs.insert(output) {
            errors.push(format!(
                "dataset '{}': output '{}' is already used by another dataset",
                dataset.name, output
            ));
        }
    }
}

/// The message field and the timestamp template must refer to fields of the
/// log format.
fn validate_structure(config: &Config, errors: &mut Vec<String>) {
    let format = match LogFormat::new(&config.log_format) {
        Ok(format) => format,
        Err(e) => {
            errors.push(format!("log_format: {}", e));
            return;
        }
    };

    if !format.has_field(&config.message_field) {
        errors.push(format!(
            "message_field '{}' is not a field of log_format (fields: {})",
            config.message_field,
            format.fields().join(", ")
        ));
    }

    if let Err(e) =
        TimestampExtractor::new(&config.timestamp.template, &config.timestamp.format, &format)
    {
        errors.push(format!("timestamp: {}", e));
    }
}
