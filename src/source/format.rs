use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("log format '{0}' contains no <field> placeholders")]
    NoFields(String),

    #[error("log format field '{0}' appears more than once")]
    DuplicateField(String),

    #[error("log format field '{0}' is not a valid name (letters, digits and '_' only)")]
    InvalidField(String),

    #[error("regex compilation failed: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// Structural description of a log line, e.g.
/// `<IP> - - [<Date>:<Time> <Timezone>] "<Request>" <Status> <Size>`.
///
/// Each `<Name>` placeholder becomes a named capture group; literal text in
/// between must appear verbatim, except that runs of spaces match any
/// whitespace.
#[derive(Debug, Clone)]
pub struct LogFormat {
    source: String,
    fields: Vec<String>,
    regex: Regex,
}

/// Field values captured from one line, in format order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    values: Vec<(String, String)>,
}

impl Fields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl LogFormat {
    pub fn new(format: &str) -> Result<Self, FormatError> {
        let placeholder = placeholder_regex();
        let spaces = Regex::new(" +").expect("static regex");

        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        let mut pattern = String::from("^");
        let mut last_end = 0;

        for caps in placeholder.captures_iter(format) {
            let whole = caps.get(0).expect("group 0 always present");
            let name = &caps[1];

            if !is_valid_field_name(name) {
                return Err(FormatError::InvalidField(name.to_string()));
            }
            if !seen.insert(name.to_string()) {
                return Err(FormatError::DuplicateField(name.to_string()));
            }

            push_literal(&mut pattern, &format[last_end..whole.start()], &spaces);
            pattern.push_str(&format!("(?P<{}>.*?)", name));
            fields.push(name.to_string());
            last_end = whole.end();
        }

        if fields.is_empty() {
            return Err(FormatError::NoFields(format.to_string()));
        }

        push_literal(&mut pattern, &format[last_end..], &spaces);
        pattern.push('$');

        Ok(Self {
            source: format.to_string(),
            fields,
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Split a raw line into its named fields.
    ///
    /// Returns None if the line does not have the expected structure.
    pub fn parse(&self, line: &str) -> Option<Fields> {
        let caps = self.regex.captures(line.trim())?;
        let values = self
            .fields
            .iter()
            .map(|name| {
                let value = caps.name(name).map_or("", |m| m.as_str());
                (name.clone(), value.to_string())
            })
            .collect();
        Some(Fields { values })
    }
}

/// Matches `<Name>` placeholders. Shared with timestamp templates.
pub(crate) fn placeholder_regex() -> Regex {
    Regex::new(r"<([^<>]+)>").expect("static regex")
}

fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn push_literal(pattern: &mut String, literal: &str, spaces: &Regex) {
    let mut last = 0;
    for m in spaces.find_iter(literal) {
        pattern.push_str(&regex::escape(&literal[last..m.start()]));
        pattern.push_str(r"\s+");
        last = m.end();
    }
    pattern.push_str(&regex::escape(&literal[last..]));
}
