//! JSON message documents.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use mimemail::{Composer, Part, PartConfig, Settings};
use rand::RngCore;
use serde::Deserialize;
use tracing::debug;

/// A message described as JSON.
///
/// ```json
/// {
///   "settings": { "line_ending": "crlf" },
///   "date": "Fri, 18 Jun 2004 10:00:00 -0700",
///   "headers": { "from": "me@example.com", "subject": "Hello" },
///   "part": {
///     "content_type": "multipart/alternative",
///     "children": [
///       { "content_type": "text/plain", "data": "Hi" },
///       { "content_type": "text/html", "data": "<p>Hi</p>", "encoding": "quoted-printable" }
///     ]
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Document {
    /// Rendering settings for the whole tree.
    #[serde(default)]
    pub settings: Settings,
    /// Fixed `Date` header (RFC 2822); the current time when absent.
    #[serde(default)]
    pub date: Option<String>,
    /// Message headers such as `From` and `Subject`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// The top-level part.
    pub part: PartNode,
}

/// One part of a [`Document`].
#[derive(Debug, Default, Deserialize)]
pub struct PartNode {
    /// Construction snapshot for this part.
    #[serde(flatten)]
    pub config: PartConfig,
    /// Extra non-MIME headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Extra `Content-*` attributes keyed by dotted path, applied in key order.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Child parts, for `multipart/*` types.
    #[serde(default)]
    pub children: Vec<PartNode>,
}

impl Document {
    /// Parses a document from JSON text.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Failed to parse message document")
    }

    /// Returns the fixed date, if one was given.
    pub fn date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.date
            .as_deref()
            .map(|date| {
                DateTime::parse_from_rfc2822(date.trim())
                    .with_context(|| format!("Invalid RFC 2822 date: {date}"))
            })
            .transpose()
    }

    /// Builds the message tree, drawing boundaries from the thread-local RNG.
    pub fn build(&self) -> Result<Part> {
        let composer = Composer::with_settings(self.settings.clone());
        self.build_with(composer)
    }

    /// Builds the message tree with the given composer.
    ///
    /// The composer's settings apply; a document date replaces its date.
    pub fn build_with<R: RngCore>(&self, composer: Composer<R>) -> Result<Part> {
        let date = self.date()?;
        let mut composer = match date {
            Some(date) => composer.date(date),
            None => composer,
        };

        let mut message = composer.message(&self.part.config);
        self.part.apply(&mut message);
        for (name, value) in &self.headers {
            message.set_header(name, value);
        }
        add_children(&mut composer, &mut message, &self.part.children);

        debug!(headers = self.headers.len(), "built message from document");
        Ok(message)
    }
}

impl PartNode {
    fn apply(&self, part: &mut Part) {
        for (name, value) in &self.headers {
            part.set_header(name, value);
        }
        for (path, value) in &self.attributes {
            part.set_attribute(path, value);
        }
    }
}

fn add_children<R: RngCore>(composer: &mut Composer<R>, parent: &mut Part, nodes: &[PartNode]) {
    for node in nodes {
        let child = composer.add_child(parent, &node.config);
        node.apply(child);
        add_children(composer, child, &node.children);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mimemail::LineEnding;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn composer() -> Composer<StdRng> {
        Composer::with_rng(Settings::default(), StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_minimal_document() {
        let document = Document::from_json(r#"{"part": {"content_type": "text/plain", "data": "hi"}}"#).unwrap();
        let message = document.build().unwrap();

        assert_eq!(message.content_type(), Some("text/plain"));
        assert_eq!(message.body(), Some("hi"));
        assert!(message.header("date").is_some());
    }

    #[test]
    fn test_full_document() {
        let document = Document::from_json(
            r#"{
                "date": "Fri, 18 Jun 2004 10:00:00 -0700",
                "headers": {"from": "me@example.com", "subject": "Report"},
                "part": {
                    "content_type": "multipart/mixed",
                    "boundary": "XYZ",
                    "children": [
                        {"content_type": "text/plain", "data": "see attached", "charset": "utf-8"},
                        {
                            "content_type": "application/pdf",
                            "data": "JVBERi0=",
                            "encoding": "base64",
                            "disposition": "attachment",
                            "filename": "report.pdf",
                            "headers": {"x-note": "scanned"},
                            "attributes": {"content-type.format": "fixed"}
                        }
                    ]
                }
            }"#,
        )
        .unwrap();
        let message = document.build_with(composer()).unwrap();

        assert_eq!(message.header("date"), Some("Fri, 18 Jun 2004 10:00:00 -0700"));
        assert_eq!(message.header("subject"), Some("Report"));
        assert_eq!(message.boundary(), Some("XYZ"));
        assert_eq!(message.children().len(), 2);

        let attachment = &message.children()[1];
        assert_eq!(attachment.header("x-note"), Some("scanned"));
        assert_eq!(attachment.attribute("content-type.format"), Some("fixed"));
        assert_eq!(attachment.attribute("content-disposition.filename"), Some("report.pdf"));

        let rendered = message.render().unwrap();
        assert!(rendered.contains("\n--XYZ\nContent-Type: text/plain;\n charset=\"utf-8\"\n"));
        assert!(rendered.contains("X-Note: scanned\n"));
        assert!(rendered.ends_with("\n--XYZ--\n\n"));
    }

    #[test]
    fn test_settings_applied() {
        let document = Document::from_json(
            r#"{"settings": {"line_ending": "crlf"}, "part": {"content_type": "text/plain", "data": "x"}}"#,
        )
        .unwrap();
        assert_eq!(document.settings.line_ending, LineEnding::CrLf);

        let rendered = document.build().unwrap().render().unwrap();
        assert!(rendered.ends_with("\r\n\r\nx"));
    }

    #[test]
    fn test_nested_children() {
        let document = Document::from_json(
            r#"{"part": {"content_type": "multipart/mixed", "children": [
                {"content_type": "multipart/alternative", "children": [
                    {"content_type": "text/plain", "data": "a"},
                    {"content_type": "text/html", "data": "<p>a</p>"}
                ]}
            ]}}"#,
        )
        .unwrap();
        let message = document.build_with(composer()).unwrap();

        assert_eq!(message.children()[0].children().len(), 2);
        assert_ne!(message.boundary(), message.children()[0].boundary());
    }

    #[test]
    fn test_invalid_date() {
        let document = Document::from_json(r#"{"date": "yesterday", "part": {}}"#).unwrap();
        let err = document.build().unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_missing_part() {
        assert!(Document::from_json(r#"{"headers": {}}"#).is_err());
    }
}
