use crate::source::format::{placeholder_regex, Fields, LogFormat};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("timestamp template '{0}' contains no <field> placeholders")]
    NoFields(String),

    #[error("timestamp template references field '{0}' which is not in the log format")]
    UnknownField(String),

    #[error("format '{0}' uses %Z, which names a zone without giving an offset; use %z instead")]
    ZoneName(String),

    #[error("failed to parse timestamp '{value}' with format '{format}': {source}")]
    ParseError {
        value: String,
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone)]
pub enum TimestampFormat {
    Strptime(String),
    Iso8601,
    Epoch,
    EpochMs,
}

impl TimestampFormat {
    pub fn from_config(format: &str) -> Self {
        match format {
            "iso8601" => TimestampFormat::Iso8601,
            "epoch" => TimestampFormat::Epoch,
            "epoch_ms" => TimestampFormat::EpochMs,
            other => TimestampFormat::Strptime(other.to_string()),
        }
    }

    fn name(&self) -> &str {
        match self {
            TimestampFormat::Strptime(fmt) => fmt,
            TimestampFormat::Iso8601 => "iso8601",
            TimestampFormat::Epoch => "epoch",
            TimestampFormat::EpochMs => "epoch_ms",
        }
    }
}

/// A piece of a timestamp template: literal text or a log format field.
#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Field(String),
}

/// Assembles a timestamp from one or more log format fields and parses it,
/// keeping the offset written in the log.
#[derive(Debug, Clone)]
pub struct TimestampExtractor {
    segments: Vec<Segment>,
    format: TimestampFormat,
}

impl TimestampExtractor {
    /// Create a new TimestampExtractor
    ///
    /// # Arguments
    /// * `template` - Field template such as `<Date>:<Time> <Timezone>`
    /// * `format` - One of: strptime format string, 'iso8601', 'epoch', 'epoch_ms'
    /// * `log_format` - The format whose fields the template refers to
    pub fn new(template: &str, format: &str, log_format: &LogFormat) -> Result<Self, TimestampError> {
        let placeholder = placeholder_regex();
        let mut segments = Vec::new();
        let mut last_end = 0;

        for caps in placeholder.captures_iter(template) {
            let whole = caps.get(0).expect("group 0 always present");
            let name = &caps[1];
            if !log_format.has_field(name) {
                return Err(TimestampError::UnknownField(name.to_string()));
            }
            if whole.start() > last_end {
                segments.push(Segment::Literal(template[last_end..whole.start()].to_string()));
            }
            segments.push(Segment::Field(name.to_string()));
            last_end = whole.end();
        }

        if !segments.iter().any(|s| matches!(s, Segment::Field(_))) {
            return Err(TimestampError::NoFields(template.to_string()));
        }
        if last_end < template.len() {
            segments.push(Segment::Literal(template[last_end..].to_string()));
        }

        let format = TimestampFormat::from_config(format);
        if let TimestampFormat::Strptime(fmt) = &format {
            if has_directive(fmt, 'Z') {
                return Err(TimestampError::ZoneName(fmt.clone()));
            }
        }

        Ok(Self { segments, format })
    }

    /// Render the template from a line's fields and parse the result.
    pub fn extract(&self, fields: &Fields) -> Result<DateTime<FixedOffset>, TimestampError> {
        let mut value = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => value.push_str(text),
                Segment::Field(name) => value.push_str(fields.get(name).unwrap_or_default()),
            }
        }
        self.parse(&value)
    }

    pub fn parse(&self, value: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
        match &self.format {
            TimestampFormat::Iso8601 => DateTime::parse_from_rfc3339(value)
                .map_err(|e| self.parse_error(value, Box::new(e))),
            TimestampFormat::Epoch => {
                let seconds: i64 = value
                    .parse()
                    .map_err(|e: std::num::ParseIntError| self.parse_error(value, Box::new(e)))?;
                self.epoch_to_datetime(value, seconds, 0)
            }
            TimestampFormat::EpochMs => {
                let millis: i64 = value
                    .parse()
                    .map_err(|e: std::num::ParseIntError| self.parse_error(value, Box::new(e)))?;
                let nanos = (millis.rem_euclid(1000) * 1_000_000) as u32;
                self.epoch_to_datetime(value, millis.div_euclid(1000), nanos)
            }
            TimestampFormat::Strptime(fmt) => {
                if has_directive(fmt, 'z') || fmt.contains("%:z") {
                    DateTime::parse_from_str(value, fmt)
                        .map_err(|e| self.parse_error(value, Box::new(e)))
                } else {
                    // No offset in the log, treat as UTC
                    NaiveDateTime::parse_from_str(value, fmt)
                        .map(|ndt| Utc.from_utc_datetime(&ndt).fixed_offset())
                        .map_err(|e| self.parse_error(value, Box::new(e)))
                }
            }
        }
    }

    fn epoch_to_datetime(
        &self,
        value: &str,
        seconds: i64,
        nanos: u32,
    ) -> Result<DateTime<FixedOffset>, TimestampError> {
        Utc.timestamp_opt(seconds, nanos)
            .single()
            .map(|dt| dt.fixed_offset())
            .ok_or_else(|| {
                self.parse_error(
                    value,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "timestamp out of range",
                    )),
                )
            })
    }

    fn parse_error(
        &self,
        value: &str,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> TimestampError {
        TimestampError::ParseError {
            value: value.to_string(),
            format: self.format.name().to_string(),
            source,
        }
    }
}

/// Whether `fmt` contains the directive `%<spec>`, skipping `%%` escapes.
fn has_directive(fmt: &str, spec: char) -> bool {
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c == '%' && chars.next() == Some(spec) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access_format() -> LogFormat {
        LogFormat::new(r#"<IP> - - [<Date>:<Time> <Timezone>] "<Request>""#).unwrap()
    }

    #[test]
    fn test_access_log_timestamp_keeps_offset() {
        let format = access_format();
        let extractor =
            TimestampExtractor::new("<Date>:<Time> <Timezone>", "%d/%b/%Y:%H:%M:%S %z", &format)
                .unwrap();

        let fields = format
            .parse(r#"1.2.3.4 - - [04/Dec/2025:02:42:11 +0530] "GET / HTTP/1.1""#)
            .unwrap();
        let ts = extractor.extract(&fields).unwrap();

        assert_eq!(ts.to_rfc3339(), "2025-12-04T02:42:11+05:30");
        assert_eq!(ts.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn test_timezone_naive_assumes_utc() {
        let format = LogFormat::new("<Date> <Time> <Content>").unwrap();
        let extractor =
            TimestampExtractor::new("<Date> <Time>", "%Y-%m-%d %H:%M:%S", &format).unwrap();

        let fields = format.parse("2025-12-04 02:42:11 service started").unwrap();
        let ts = extractor.extract(&fields).unwrap();

        assert_eq!(ts.to_rfc3339(), "2025-12-04T02:42:11+00:00");
    }

    #[test]
    fn test_iso8601_single_field() {
        let format = LogFormat::new("<Ts> <Content>").unwrap();
        let extractor = TimestampExtractor::new("<Ts>", "iso8601", &format).unwrap();

        let fields = format.parse("2025-12-04T02:42:11.011Z started").unwrap();
        let ts = extractor.extract(&fields).unwrap();

        assert_eq!(ts.to_rfc3339(), "2025-12-04T02:42:11.011+00:00");
    }

    #[test]
    fn test_epoch_milliseconds() {
        let format = LogFormat::new("<Ts> <Content>").unwrap();
        let extractor = TimestampExtractor::new("<Ts>", "epoch_ms", &format).unwrap();

        let fields = format.parse("1733280131011 started").unwrap();
        let ts = extractor.extract(&fields).unwrap();

        assert_eq!(ts.timestamp(), 1733280131);
        assert_eq!(ts.timestamp_subsec_millis(), 11);
    }

    #[test]
    fn test_unknown_field_error() {
        let format = access_format();
        let result = TimestampExtractor::new("<Day> <Time>", "%d %H:%M:%S", &format);

        assert!(matches!(result, Err(TimestampError::UnknownField(name)) if name == "Day"));
    }

    #[test]
    fn test_template_without_fields_error() {
        let format = access_format();
        let result = TimestampExtractor::new("2025-01-01", "%Y-%m-%d", &format);

        assert!(matches!(result, Err(TimestampError::NoFields(_))));
    }

    #[test]
    fn test_zone_name_directive_rejected() {
        let format = access_format();
        let result =
            TimestampExtractor::new("<Date>:<Time> <Timezone>", "%d/%b/%Y:%H:%M:%S %Z", &format);

        assert!(matches!(result, Err(TimestampError::ZoneName(_))));
    }

    #[test]
    fn test_escaped_percent_is_not_a_directive() {
        assert!(!has_directive("%Y-%m-%d %%Z", 'Z'));
        assert!(has_directive("%H:%M:%S %z", 'z'));
    }

    #[test]
    fn test_unparseable_timestamp() {
        let format = LogFormat::new("<Ts> <Content>").unwrap();
        let extractor = TimestampExtractor::new("<Ts>", "epoch", &format).unwrap();

        let fields = format.parse("not_a_number started").unwrap();
        let result = extractor.extract(&fields);

        assert!(matches!(result, Err(TimestampError::ParseError { .. })));
    }
}
