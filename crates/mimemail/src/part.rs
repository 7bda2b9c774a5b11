//! MIME message part tree.

use crate::boundary::{generate_boundary, is_valid_boundary};
use crate::config::{PartConfig, Settings, present};
use crate::encoding::encode_quoted_printable_with;
use crate::error::Result;
use crate::header::{Attributes, Headers};
use crate::render;
use rand::Rng;
use tracing::{debug, warn};

/// Transfer encoding whose body is encoded at construction time.
pub const QUOTED_PRINTABLE: &str = "quoted-printable";

/// Returns true if `content_type` names a `multipart/*` type.
#[must_use]
pub fn is_multipart_type(content_type: &str) -> bool {
    content_type
        .get(..10)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"))
}

/// One node of a MIME message tree.
///
/// A part is either a leaf carrying a body or a `multipart/*` container
/// carrying children; a container's body is never rendered. The top-level
/// part owns the whole tree.
///
/// Non-MIME headers (`From`, `Subject`...) live in [`Headers`]; `Content-*`
/// headers live in [`Attributes`] and are addressed with dotted paths such
/// as `content-type.charset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    headers: Headers,
    attributes: Attributes,
    body: Option<String>,
    children: Vec<Part>,
    settings: Settings,
}

impl Part {
    /// Creates a top-level message part with default settings.
    ///
    /// Adds `MIME-Version` and `Date` headers and draws multipart
    /// boundaries from the thread-local RNG. Use a
    /// [`Composer`](crate::Composer) to control settings, randomness or
    /// the date.
    #[must_use]
    pub fn new(config: &PartConfig) -> Self {
        let date = chrono::Local::now().to_rfc2822();
        Self::build(
            config,
            &Settings::default(),
            &mut rand::thread_rng(),
            Some(&date),
            None,
        )
    }

    /// Builds a part from its configuration snapshot.
    ///
    /// `date` is set only for top-level parts, which also receive the
    /// `MIME-Version` header. A supplied boundary that is invalid or equal to
    /// `parent_boundary` is replaced by a generated one.
    pub(crate) fn build<R: Rng + ?Sized>(
        config: &PartConfig,
        settings: &Settings,
        rng: &mut R,
        date: Option<&str>,
        parent_boundary: Option<&str>,
    ) -> Self {
        let mut part = Self {
            headers: Headers::new(),
            attributes: Attributes::new(),
            body: None,
            children: Vec::new(),
            settings: settings.clone(),
        };

        if let Some(content_type) = present(config.content_type.as_deref()) {
            part.set_attribute("content-type", content_type);

            if is_multipart_type(content_type) {
                let boundary = present(config.boundary.as_deref())
                    .filter(|&supplied| {
                        let usable = is_valid_boundary(supplied) && Some(supplied) != parent_boundary;
                        if !usable {
                            warn!(boundary = supplied, "ignoring unusable multipart boundary");
                        }
                        usable
                    })
                    .map_or_else(|| generate_boundary(rng), str::to_string);
                debug!(content_type, boundary = %boundary, "assigned multipart boundary");
                part.set_attribute("content-type.boundary", &boundary);
            }
        }

        if let Some(date) = date {
            part.set_header("mime-version", &settings.mime_version);
            part.set_header("date", date);
        }

        if let Some(charset) = present(config.charset.as_deref()) {
            part.set_attribute("content-type.charset", charset);
        }

        if let Some(id) = present(config.id.as_deref()) {
            part.set_attribute("content-id", id);
        }

        // Body must be stored before the encoding and length are resolved
        part.body = present(config.data.as_deref()).map(str::to_string);

        let encoding = present(config.encoding.as_deref()).map(str::to_ascii_lowercase);
        if let Some(encoding) = &encoding {
            part.set_attribute("content-transfer-encoding", encoding);
        }

        if let Some(disposition) = present(config.disposition.as_deref()) {
            part.set_attribute("content-disposition", disposition);
        }

        if config.track_length {
            if let Some(body) = part.body.take() {
                let (body, length) = if encoding.as_deref() == Some(QUOTED_PRINTABLE) {
                    // The encoded length always wins over a user override
                    let encoded = encode_quoted_printable_with(
                        body.as_bytes(),
                        settings.qp_line_length,
                        settings.line_ending,
                    );
                    let length = encoded.len().to_string();
                    (encoded, length)
                } else {
                    let length = present(config.length.as_deref())
                        .map_or_else(|| body.len().to_string(), str::to_string);
                    (body, length)
                };
                part.set_attribute("content-length", &length);
                part.body = Some(body);
            }
        }

        if let Some(filename) = present(config.filename.as_deref()) {
            part.set_attribute("content-type.name", filename);
            part.set_attribute("content-disposition.filename", filename);
        }

        part
    }

    /// Gets a non-MIME header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Sets a non-MIME header such as `From` or `X-Mailer`.
    ///
    /// A blank value removes the header. A value containing CR or LF is
    /// ignored, so it can never inject extra header lines.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    /// Removes a non-MIME header, returning its value.
    ///
    /// Also used to drop the automatic `Date` and `MIME-Version` headers.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(name)
    }

    /// Gets a `Content-*` attribute (`content-type` or `content-type.charset`).
    #[must_use]
    pub fn attribute(&self, path: &str) -> Option<&str> {
        self.attributes.get(path)
    }

    /// Sets a `Content-*` attribute. A blank value removes it; a value
    /// containing CR or LF is ignored.
    pub fn set_attribute(&mut self, path: &str, value: &str) {
        self.attributes.set(path, value);
    }

    /// Removes a `Content-*` attribute, returning its value.
    pub fn remove_attribute(&mut self, path: &str) -> Option<String> {
        self.attributes.remove(path)
    }

    /// Returns the non-MIME headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the `Content-*` attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the body, already transfer-encoded.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the child parts in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns the settings this part was built with.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the primary content type (e.g., "text/plain").
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.attributes.get("content-type")
    }

    /// Returns the multipart boundary, if set.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.attributes.get("content-type.boundary")
    }

    /// Checks if this is a multipart container.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.content_type().is_some_and(is_multipart_type)
    }

    /// Builds a child part from `config` and appends it.
    ///
    /// The child inherits this part's settings and gets no `MIME-Version`
    /// or `Date` header. Boundaries come from the thread-local RNG; see
    /// [`Composer::add_child`](crate::Composer::add_child) to supply one.
    pub fn add_child(&mut self, config: &PartConfig) -> &mut Self {
        self.add_child_with(config, &mut rand::thread_rng())
    }

    /// Builds a child part from `config` using `rng` for its boundary, and
    /// appends it.
    ///
    /// A supplied boundary equal to this part's boundary is replaced.
    pub fn add_child_with<R: Rng + ?Sized>(&mut self, config: &PartConfig, rng: &mut R) -> &mut Self {
        let child = Self::build(config, &self.settings, rng, None, self.boundary());
        self.children.push(child);
        let index = self.children.len() - 1;
        &mut self.children[index]
    }

    /// Renders the header block of this part.
    #[must_use]
    pub fn render_headers(&self) -> String {
        render::render_headers(self)
    }

    /// Renders the body of this part, including nested children.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart part in the tree has no boundary.
    pub fn render_body(&self) -> Result<String> {
        render::render_body(self)
    }

    /// Renders the complete message: headers, blank line, body.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart part in the tree has no boundary.
    pub fn render(&self) -> Result<String> {
        render::render_message(self)
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
    use crate::boundary::MAX_BOUNDARY_LENGTH;
    use crate::config::LineEnding;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn leaf(config: &PartConfig) -> Part {
        Part::build(config, &Settings::default(), &mut StdRng::seed_from_u64(0), None, None)
    }

    #[test]
    fn test_is_multipart_type() {
        assert!(is_multipart_type("multipart/mixed"));
        assert!(is_multipart_type("Multipart/Alternative"));
        assert!(!is_multipart_type("text/plain"));
        assert!(!is_multipart_type("multipart"));
    }

    #[test]
    fn test_top_level_headers() {
        let part = Part::new(&PartConfig::text("hello"));
        assert_eq!(part.header("mime-version"), Some("1.0"));
        assert!(part.header("date").is_some());
    }

    #[test]
    fn test_child_has_no_top_level_headers() {
        let mut root = Part::new(&PartConfig::with_type("multipart/mixed"));
        let child = root.add_child(&PartConfig::text("hi"));
        assert!(child.header("mime-version").is_none());
        assert!(child.header("date").is_none());
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_text_part_attributes() {
        let part = leaf(&PartConfig::text("  hello \n").charset("utf-8").id("<a@b>"));
        assert_eq!(part.content_type(), Some("text/plain"));
        assert_eq!(part.attribute("content-type.charset"), Some("utf-8"));
        assert_eq!(part.attribute("content-id"), Some("<a@b>"));
        assert_eq!(part.body(), Some("hello"));
        assert_eq!(part.attribute("content-length"), Some("5"));
        assert!(part.boundary().is_none());
    }

    #[test]
    fn test_multipart_generates_boundary() {
        let part = leaf(&PartConfig::with_type("multipart/mixed"));
        let boundary = part.boundary().unwrap();
        assert!(boundary.starts_with("_----=_Part_"));
        assert!(part.is_multipart());
    }

    #[test]
    fn test_multipart_explicit_boundary() {
        let part = leaf(&PartConfig::with_type("multipart/mixed").boundary(" b1 "));
        assert_eq!(part.boundary(), Some("b1"));

        let part = leaf(&PartConfig::with_type("multipart/mixed").boundary(""));
        assert!(part.boundary().is_some_and(|b| b.starts_with("_----=_Part_")));
    }

    #[test]
    fn test_multipart_oversized_boundary_replaced() {
        let mut root = Part::new(&PartConfig::with_type("multipart/mixed").boundary("b".repeat(100)));
        root.add_child(&PartConfig::text("x"));

        let boundary = root.boundary().unwrap();
        assert!(boundary.len() <= MAX_BOUNDARY_LENGTH);
        assert!(boundary.starts_with("_----=_Part_"));
        assert!(root.render().is_ok());

        let part = leaf(&PartConfig::with_type("multipart/mixed").boundary("b".repeat(MAX_BOUNDARY_LENGTH)));
        assert_eq!(part.boundary().map(str::len), Some(MAX_BOUNDARY_LENGTH));
    }

    #[test]
    fn test_multipart_invalid_boundary_characters_replaced() {
        for supplied in ["quo\"ted", "semi;colon", "line\nbreak", "caf\u{e9}"] {
            let part = leaf(&PartConfig::with_type("multipart/mixed").boundary(supplied));
            assert!(
                part.boundary().is_some_and(|b| b.starts_with("_----=_Part_")),
                "kept {supplied:?}"
            );
        }
    }

    #[test]
    fn test_child_boundary_equal_to_parent_replaced() {
        let mut root = Part::new(&PartConfig::with_type("multipart/mixed").boundary("SAME"));
        let inner = root.add_child(&PartConfig::with_type("multipart/alternative").boundary("SAME"));
        inner.add_child(&PartConfig::text("a"));

        assert_eq!(root.boundary(), Some("SAME"));
        let inner_boundary = root.children()[0].boundary().unwrap();
        assert_ne!(inner_boundary, "SAME");
        assert!(inner_boundary.starts_with("_----=_Part_"));

        let body = root.render_body().unwrap();
        assert_eq!(body.matches("--SAME\n").count(), 1);
        assert_eq!(body.matches("--SAME--\n").count(), 1);
    }

    #[test]
    fn test_boundary_only_for_multipart() {
        let part = leaf(&PartConfig::text("x").boundary("ignored"));
        assert!(part.boundary().is_none());
    }

    #[test]
    fn test_encoding_lowercased() {
        let part = leaf(&PartConfig::text("x").encoding(" 7BIT "));
        assert_eq!(part.attribute("content-transfer-encoding"), Some("7bit"));
    }

    #[test]
    fn test_quoted_printable_body_and_length() {
        let part = leaf(&PartConfig::html("a=b ").encoding("Quoted-Printable").length("999"));
        // Trimmed before encoding, so the space is gone
        assert_eq!(part.body(), Some("a=3Db"));
        assert_eq!(part.attribute("content-length"), Some("5"));
    }

    #[test]
    fn test_quoted_printable_uses_settings() {
        let settings = Settings::builder()
            .line_ending(LineEnding::CrLf)
            .qp_line_length(10)
            .build();
        let config = PartConfig::text("abcdefghijkl\nz").encoding(QUOTED_PRINTABLE);
        let part = Part::build(&config, &settings, &mut StdRng::seed_from_u64(0), None, None);

        assert_eq!(part.body(), Some("abcdefghi=\r\njkl\r\nz"));
        assert_eq!(part.attribute("content-length"), Some("18"));
    }

    #[test]
    fn test_length_override() {
        let part = leaf(&PartConfig::text("hello").length(" 42 "));
        assert_eq!(part.attribute("content-length"), Some("42"));

        let part = leaf(&PartConfig::text("hello").encoding("base64").length("42"));
        assert_eq!(part.attribute("content-length"), Some("42"));
    }

    #[test]
    fn test_length_tracking_disabled() {
        let part = leaf(
            &PartConfig::text("a=b")
                .encoding(QUOTED_PRINTABLE)
                .track_length(false),
        );
        assert!(part.attribute("content-length").is_none());
        // Encoding is tied to length tracking
        assert_eq!(part.body(), Some("a=b"));
    }

    #[test]
    fn test_no_length_without_body() {
        let part = leaf(&PartConfig::text("   "));
        assert!(part.body().is_none());
        assert!(part.attribute("content-length").is_none());
    }

    #[test]
    fn test_filename_and_disposition() {
        let part = leaf(
            &PartConfig::with_type("application/pdf")
                .disposition("attachment")
                .filename(" report.pdf "),
        );
        assert_eq!(part.attribute("content-type.name"), Some("report.pdf"));
        assert_eq!(part.attribute("content-disposition"), Some("attachment"));
        assert_eq!(
            part.attribute("content-disposition.filename"),
            Some("report.pdf")
        );
    }

    #[test]
    fn test_empty_config() {
        let part = leaf(&PartConfig::new());
        assert!(part.headers().is_empty());
        assert!(part.attributes().is_empty());
        assert!(part.body().is_none());
        assert!(!part.is_multipart());
    }

    #[test]
    fn test_header_set_remove() {
        let mut part = leaf(&PartConfig::new());
        part.set_header("From", "me@example.com");
        assert_eq!(part.header("FROM"), Some("me@example.com"));

        assert_eq!(part.remove_header("from").as_deref(), Some("me@example.com"));
        assert!(part.header("from").is_none());
    }

    #[test]
    fn test_attribute_set_remove() {
        let mut part = leaf(&PartConfig::text("x"));
        part.set_attribute("Content-Type.Format", "flowed");
        assert_eq!(part.attribute("content-type.format"), Some("flowed"));

        assert_eq!(part.remove_attribute("content-type.format").as_deref(), Some("flowed"));
        assert!(part.attribute("content-type.format").is_none());
        assert_eq!(part.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_nested_children() {
        let mut root = Part::new(&PartConfig::with_type("multipart/mixed"));
        let alternative = root.add_child(&PartConfig::with_type("multipart/alternative"));
        alternative.add_child(&PartConfig::text("plain"));
        alternative.add_child(&PartConfig::html("<p>html</p>"));

        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].children().len(), 2);
        assert_ne!(root.boundary(), root.children()[0].boundary());
    }
}
