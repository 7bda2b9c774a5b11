//! Message tree serialization.
//!
//! A multipart body is laid out as:
//!
//! ```text
//! This is a multi-part message in MIME format.
//!
//! --boundary
//! Content-Type: text/plain
//!
//! first body
//! --boundary
//! Content-Type: text/html
//!
//! second body
//! --boundary--
//!
//! ```
//!
//! Nested multipart children are rendered recursively in place of a body.

use crate::config::{LineEnding, Settings};
use crate::error::{Error, Result};
use crate::header::{format_attributes, format_headers};
use crate::part::Part;
use std::collections::HashSet;
use tracing::{trace, warn};

/// Renders the header block of a part: plain headers followed by the
/// `Content-*` headers.
#[must_use]
pub fn render_headers(part: &Part) -> String {
    headers_block(part, part.settings().line_ending)
}

/// Renders the body of a part.
///
/// # Errors
///
/// Returns [`Error::MissingBoundary`] if a multipart part in the tree has
/// no boundary.
pub fn render_body(part: &Part) -> Result<String> {
    let mut out = String::new();
    Renderer::new(part.settings()).body(part, &mut out)?;
    Ok(out)
}

/// Renders a complete message: header block, blank line, body.
///
/// # Errors
///
/// Returns [`Error::MissingBoundary`] if a multipart part in the tree has
/// no boundary.
pub fn render_message(part: &Part) -> Result<String> {
    let settings = part.settings();
    let mut out = render_headers(part);
    // End of headers
    out.push_str(settings.line_ending.as_str());
    Renderer::new(settings).body(part, &mut out)?;
    Ok(out)
}

fn headers_block(part: &Part, line_ending: LineEnding) -> String {
    let mut out = format_headers(part.headers().iter(), line_ending);
    let content = format_attributes(part.attributes(), line_ending);
    out.push_str(&format_headers(
        content.iter().map(|(name, value)| (name.as_str(), value.as_str())),
        line_ending,
    ));
    out
}

/// Walks a part tree; the root's settings apply to every level.
struct Renderer<'a> {
    settings: &'a Settings,
    seen: HashSet<&'a str>,
}

impl<'a> Renderer<'a> {
    fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            seen: HashSet::new(),
        }
    }

    fn body(&mut self, part: &'a Part, out: &mut String) -> Result<()> {
        if !part.is_multipart() {
            out.push_str(part.body().unwrap_or_default());
            return Ok(());
        }

        let boundary = part
            .boundary()
            .ok_or_else(|| Error::missing_boundary(part.content_type().unwrap_or_default()))?;
        if !self.seen.insert(boundary) {
            warn!(boundary, "multipart boundary reused within message tree");
        }
        trace!(boundary, children = part.children().len(), "rendering multipart body");

        let line_ending = self.settings.line_ending;
        let eol = line_ending.as_str();

        out.push_str(&self.settings.prologue);
        out.push_str(eol);

        for child in part.children() {
            out.push_str(eol);
            out.push_str("--");
            out.push_str(boundary);
            out.push_str(eol);
            out.push_str(&headers_block(child, line_ending));
            out.push_str(eol);
            self.body(child, out)?;
        }

        out.push_str(eol);
        out.push_str("--");
        out.push_str(boundary);
        out.push_str("--");
        out.push_str(eol);
        out.push_str(eol);

        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::Composer;
    use crate::config::PartConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn composer(settings: Settings) -> Composer<StdRng> {
        Composer::with_rng(settings, StdRng::seed_from_u64(0))
    }

    fn message(config: &PartConfig) -> Part {
        let mut part = composer(Settings::default()).message(config);
        part.remove_header("date");
        part.remove_header("mime-version");
        part
    }

    #[test]
    fn test_render_single_part() {
        let part = message(&PartConfig::text("hello"));
        let rendered = render_message(&part).unwrap();

        assert_eq!(
            rendered,
            "Content-Type: text/plain\nContent-Length: 5\n\nhello"
        );
    }

    #[test]
    fn test_render_headers_order() {
        let mut part = composer(Settings::default()).message(&PartConfig::text("hi").charset("utf-8"));
        part.set_header("x-mailer", "mimemail");
        part.set_header("from", "me@example.com");
        part.remove_header("date");

        assert_eq!(
            render_headers(&part),
            concat!(
                "From: me@example.com\n",
                "MIME-Version: 1.0\n",
                "X-Mailer: mimemail\n",
                "Content-Type: text/plain;\n",
                " charset=\"utf-8\"\n",
                "Content-Length: 2\n",
            )
        );
    }

    #[test]
    fn test_render_multipart_exact() {
        let part = {
            let mut root = message(&PartConfig::with_type("multipart/alternative").boundary("XYZ"));
            root.add_child(&PartConfig::text("plain").track_length(false));
            root.add_child(&PartConfig::html("<b>html</b>").track_length(false));
            root
        };

        assert_eq!(
            render_body(&part).unwrap(),
            concat!(
                "This is a multi-part message in MIME format.\n",
                "\n--XYZ\n",
                "Content-Type: text/plain\n",
                "\n",
                "plain",
                "\n--XYZ\n",
                "Content-Type: text/html\n",
                "\n",
                "<b>html</b>",
                "\n--XYZ--\n\n",
            )
        );
    }

    #[test]
    fn test_render_nested_multipart() {
        let mut root = message(&PartConfig::with_type("multipart/mixed").boundary("outer"));
        let inner = root.add_child(&PartConfig::with_type("multipart/alternative").boundary("inner"));
        inner.add_child(&PartConfig::text("a").track_length(false));
        root.add_child(&PartConfig::text("b").track_length(false));

        let body = render_body(&root).unwrap();
        assert_eq!(
            body,
            concat!(
                "This is a multi-part message in MIME format.\n",
                "\n--outer\n",
                "Content-Type: multipart/alternative;\n",
                " boundary=\"inner\"\n",
                "\n",
                "This is a multi-part message in MIME format.\n",
                "\n--inner\n",
                "Content-Type: text/plain\n",
                "\n",
                "a",
                "\n--inner--\n\n",
                "\n--outer\n",
                "Content-Type: text/plain\n",
                "\n",
                "b",
                "\n--outer--\n\n",
            )
        );
    }

    #[test]
    fn test_render_crlf() {
        let settings = Settings::builder().line_ending(LineEnding::CrLf).build();
        let mut root = composer(settings).message(&PartConfig::with_type("multipart/mixed").boundary("B"));
        root.remove_header("date");
        root.add_child(&PartConfig::text("x").track_length(false));

        let rendered = render_message(&root).unwrap();
        assert!(rendered.starts_with("MIME-Version: 1.0\r\nContent-Type: multipart/mixed;\r\n boundary=\"B\"\r\n\r\n"));
        assert!(rendered.ends_with("\r\n--B\r\nContent-Type: text/plain\r\n\r\nx\r\n--B--\r\n\r\n"));
        assert!(!rendered.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_missing_boundary() {
        let mut part = message(&PartConfig::with_type("multipart/mixed"));
        part.remove_attribute("content-type.boundary");

        assert_eq!(
            render_message(&part),
            Err(Error::missing_boundary("multipart/mixed"))
        );
    }

    #[test]
    fn test_missing_boundary_in_child() {
        let mut root = message(&PartConfig::with_type("multipart/mixed"));
        let child = root.add_child(&PartConfig::with_type("multipart/related"));
        child.remove_attribute("content-type.boundary");

        assert!(matches!(
            render_body(&root),
            Err(Error::MissingBoundary { content_type }) if content_type == "multipart/related"
        ));
    }

    #[test]
    fn test_container_body_ignored() {
        let mut root = message(&PartConfig::with_type("multipart/mixed").boundary("B").data("ignored"));
        root.add_child(&PartConfig::text("kept").track_length(false));

        let body = render_body(&root).unwrap();
        assert!(!body.contains("ignored"));
        assert!(body.contains("kept"));
    }

    #[test]
    fn test_leaf_children_ignored() {
        let mut leaf = message(&PartConfig::text("body"));
        leaf.add_child(&PartConfig::text("hidden"));

        assert_eq!(render_body(&leaf).unwrap(), "body");
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut root = message(&PartConfig::with_type("multipart/mixed"));
        root.add_child(&PartConfig::text("one"));
        root.add_child(&PartConfig::text("two"));

        let first = render_message(&root).unwrap();
        let second = render_message(&root).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_prologue() {
        let settings = Settings::builder().prologue("MIME only.").build();
        let mut root = composer(settings).message(&PartConfig::with_type("multipart/mixed").boundary("B"));
        root.add_child(&PartConfig::text("x"));

        assert!(render_body(&root).unwrap().starts_with("MIME only.\n\n--B\n"));
    }

    #[test]
    fn test_empty_body() {
        let part = message(&PartConfig::with_type("text/plain"));
        assert_eq!(render_message(&part).unwrap(), "Content-Type: text/plain\n\n");
    }
}
