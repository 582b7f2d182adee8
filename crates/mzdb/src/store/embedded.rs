use std::ops::Range;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddedRegionError {
    #[error("no assignment matching `{pattern}` was found")]
    NotFound { pattern: String },
    #[error("assignment matching `{pattern}` appears {count} times; refusing to guess which one")]
    Ambiguous { pattern: String, count: usize },
    #[error("data literal after the assignment is not valid json: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },
    #[error("data literal does not have the expected shape: {source}")]
    Shape {
        #[source]
        source: serde_json::Error,
    },
}

/// A text document that carries exactly one JSON literal inside otherwise
/// opaque script text.
///
/// The region starts where `anchor` stops matching and ends where the JSON
/// value ends. Everything outside the region is preserved byte for byte.
#[derive(Debug, Clone)]
pub struct EmbeddedDataDocument {
    text: String,
    region: Range<usize>,
}

impl EmbeddedDataDocument {
    pub fn locate(text: String, anchor: &Regex) -> Result<Self, EmbeddedRegionError> {
        let mut matches = anchor.find_iter(&text);
        let Some(first) = matches.next() else {
            return Err(EmbeddedRegionError::NotFound {
                pattern: anchor.as_str().to_string(),
            });
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(EmbeddedRegionError::Ambiguous {
                pattern: anchor.as_str().to_string(),
                count: extra + 1,
            });
        }

        let start = first.end();
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(_)) => {}
            Some(Err(source)) => return Err(EmbeddedRegionError::Malformed { source }),
            None => {
                return Err(EmbeddedRegionError::Malformed {
                    source: serde::de::Error::custom("assignment has no value"),
                })
            }
        }
        // The stream offset includes any whitespace consumed before the value.
        let consumed = stream.byte_offset();
        let leading_ws = text[start..start + consumed].len()
            - text[start..start + consumed].trim_start().len();
        let region = (start + leading_ws)..(start + consumed);
        Ok(Self { text, region })
    }

    pub fn data_text(&self) -> &str {
        &self.text[self.region.clone()]
    }

    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, EmbeddedRegionError> {
        serde_json::from_str(self.data_text())
            .map_err(|source| EmbeddedRegionError::Shape { source })
    }

    pub fn replace_data(&mut self, replacement: &str) {
        self.text.replace_range(self.region.clone(), replacement);
        self.region = self.region.start..self.region.start + replacement.len();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> Regex {
        Regex::new(r"var\s+\$plugins\s*=").expect("anchor regex")
    }

    const REGISTRY: &str = "// Generated by RPG Maker.\n// Do not edit this file directly.\nvar $plugins =\n[\n{\"name\":\"A\",\"status\":true,\"description\":\"has ] bracket\",\"parameters\":{}}\n];\n// trailing note\n";

    #[test]
    fn locates_literal_and_ignores_brackets_inside_strings() {
        let document =
            EmbeddedDataDocument::locate(REGISTRY.to_string(), &anchor()).expect("locate");
        assert!(document.data_text().starts_with('['));
        assert!(document.data_text().ends_with(']'));
        let parsed: Vec<Value> = document.parse_data().expect("parse");
        assert_eq!(parsed[0]["description"], "has ] bracket");
    }

    #[test]
    fn replacement_preserves_surrounding_text() {
        let mut document =
            EmbeddedDataDocument::locate(REGISTRY.to_string(), &anchor()).expect("locate");
        document.replace_data("[]");
        let text = document.into_text();
        assert_eq!(
            text,
            "// Generated by RPG Maker.\n// Do not edit this file directly.\nvar $plugins =\n[];\n// trailing note\n"
        );
    }

    #[test]
    fn missing_or_duplicate_assignment_is_rejected() {
        let missing = EmbeddedDataDocument::locate("let x = 1;".to_string(), &anchor());
        assert!(matches!(missing, Err(EmbeddedRegionError::NotFound { .. })));

        let doubled = format!("{REGISTRY}var $plugins = [];\n");
        let duplicate = EmbeddedDataDocument::locate(doubled, &anchor());
        assert!(matches!(
            duplicate,
            Err(EmbeddedRegionError::Ambiguous { count: 2, .. })
        ));
    }

    #[test]
    fn malformed_literal_is_reported() {
        let broken = "var $plugins = [ {\"name\": };".to_string();
        let error = EmbeddedDataDocument::locate(broken, &anchor()).expect_err("malformed");
        assert!(matches!(error, EmbeddedRegionError::Malformed { .. }));
    }
}
