pub mod raw;
pub mod spell;

pub use raw::RawFieldParser;
pub use spell::SpellParser;

use crate::config::types::ParserConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid preprocessing regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("tau must be in (0, 1], got {0}")]
    InvalidTau(f64),
}

/// Opaque reference to the template a message was assigned to.
///
/// Resolve it with [`TemplateParser::template_key`] only after every message
/// of the corpus has been observed: mining may still generalize a template
/// when later messages arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateHandle(pub(crate) usize);

/// Turns a log line's message field into a structural template.
pub trait TemplateParser {
    /// Feed one message and return the template it currently belongs to.
    fn observe(&mut self, message: &str) -> TemplateHandle;

    /// Current key of a template.
    fn template_key(&self, handle: TemplateHandle) -> &str;

    /// Number of distinct templates seen so far.
    fn template_count(&self) -> usize;
}

pub fn from_config(config: &ParserConfig) -> Result<Box<dyn TemplateParser>, TemplateError> {
    match config {
        ParserConfig::Spell { tau, preprocess } => {
            Ok(Box::new(SpellParser::new(*tau, preprocess)?))
        }
        ParserConfig::Raw => Ok(Box::new(RawFieldParser::default())),
    }
}
