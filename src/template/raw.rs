use super::{TemplateHandle, TemplateParser};
use std::collections::HashMap;

/// Uses the message field verbatim as its template key.
#[derive(Debug, Default)]
pub struct RawFieldParser {
    index: HashMap<String, usize>,
    keys: Vec<String>,
}

impl TemplateParser for RawFieldParser {
    fn observe(&mut self, message: &str) -> TemplateHandle {
        if let Some(&idx) = self.index.get(message) {
            return TemplateHandle(idx);
        }
        let idx = self.keys.len();
        self.keys.push(message.to_string());
        self.index.insert(message.to_string(), idx);
        TemplateHandle(idx)
    }

    fn template_key(&self, handle: TemplateHandle) -> &str {
        &self.keys[handle.0]
    }

    fn template_count(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_messages_share_handle() {
        let mut parser = RawFieldParser::default();
        let a = parser.observe("GET /a HTTP/1.1");
        let b = parser.observe("GET /b HTTP/1.1");
        let again = parser.observe("GET /a HTTP/1.1");

        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(parser.template_key(b), "GET /b HTTP/1.1");
        assert_eq!(parser.template_count(), 2);
    }
}
