//! Header and content attribute storage and formatting.

use crate::config::LineEnding;
use std::collections::BTreeMap;
use tracing::warn;

/// Normalizes a header or attribute name for storage and lookup.
fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Returns true if `value` contains a CR or LF, which would start a new
/// header line when rendered.
fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// Collection of non-MIME message headers (`From`, `Subject`, `X-Mailer`...).
///
/// Names are case-insensitive and unique; setting a header replaces any
/// previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: BTreeMap<String, String>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header value, replacing any existing value.
    ///
    /// The value is trimmed; a blank value removes the header. Names or
    /// values containing a line break are ignored.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = normalize(name);
        let value = value.trim();
        if name.is_empty() {
            return;
        }
        if has_line_break(&name) || has_line_break(value) {
            warn!(header = %name, "ignoring header with embedded line break");
            return;
        }
        if value.is_empty() {
            self.headers.remove(&name);
        } else {
            self.headers.insert(name, value.to_string());
        }
    }

    /// Gets the value of a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(&normalize(name)).map(String::as_str)
    }

    /// Removes a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&normalize(name))
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns an iterator over `(name, value)` pairs, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Splits a dotted attribute path into `(header, sub-attribute)`.
///
/// `content-type` addresses the primary value (empty sub-attribute),
/// `content-type.charset` addresses a named one. Empty segments are skipped
/// and anything past the second segment is ignored.
fn split_path(path: &str) -> Option<(String, String)> {
    let path = normalize(path);
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let name = segments.next()?.to_string();
    let sub = segments.next().unwrap_or_default().to_string();
    Some((name, sub))
}

/// Sub-attributes of a single content header, in the order they were set.
///
/// The entry with an empty name is the primary value (e.g. `text/plain`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeGroup {
    entries: Vec<(String, String)>,
}

impl AttributeGroup {
    /// Returns the primary value of the header.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.get("")
    }

    /// Gets a sub-attribute by name.
    #[must_use]
    pub fn get(&self, sub: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == sub)
            .map(|(_, value)| value.as_str())
    }

    /// Returns an iterator over named sub-attributes, excluding the primary value.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn set(&mut self, sub: String, value: String) {
        // Re-setting moves the entry to the end
        self.remove(&sub);
        self.entries.push((sub, value));
    }

    fn remove(&mut self, sub: &str) -> Option<String> {
        let index = self.entries.iter().position(|(name, _)| name == sub)?;
        Some(self.entries.remove(index).1)
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// MIME `Content-*` headers and their attributes.
///
/// Groups keep the order in which they were created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    groups: Vec<(String, AttributeGroup)>,
}

impl Attributes {
    /// Creates an empty attribute collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute addressed by `path` (`content-type` or
    /// `content-type.charset`).
    ///
    /// The value is trimmed; a blank value removes the attribute. Paths or
    /// values containing a line break are ignored.
    pub fn set(&mut self, path: &str, value: &str) {
        let Some((name, sub)) = split_path(path) else {
            return;
        };
        let value = value.trim();
        if has_line_break(&name) || has_line_break(&sub) || has_line_break(value) {
            warn!(attribute = %name, "ignoring attribute with embedded line break");
            return;
        }
        if value.is_empty() {
            self.remove_entry(&name, &sub);
            return;
        }

        match self.groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, group)) => group.set(sub, value.to_string()),
            None => {
                let mut group = AttributeGroup::default();
                group.set(sub, value.to_string());
                self.groups.push((name, group));
            }
        }
    }

    /// Gets an attribute addressed by `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        let (name, sub) = split_path(path)?;
        self.group(&name)?.get(&sub)
    }

    /// Removes an attribute addressed by `path`, returning its value.
    pub fn remove(&mut self, path: &str) -> Option<String> {
        let (name, sub) = split_path(path)?;
        self.remove_entry(&name, &sub)
    }

    /// Gets the whole attribute group of a content header.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&AttributeGroup> {
        let name = normalize(name);
        self.groups
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, group)| group)
    }

    /// Returns an iterator over `(header, group)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// Returns true if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn remove_entry(&mut self, name: &str, sub: &str) -> Option<String> {
        let index = self.groups.iter().position(|(n, _)| n == name)?;
        let removed = self.groups[index].1.remove(sub);
        if self.groups[index].1.is_empty() {
            self.groups.remove(index);
        }
        removed
    }
}

/// Capitalizes a header name (e.g., "content-type" -> "Content-Type").
///
/// Every letter that starts a word is uppercased; a leading `mime-` is
/// rendered as `MIME-`.
#[must_use]
pub fn capitalize_name(name: &str) -> String {
    let mut capitalized = String::with_capacity(name.len());
    let mut prev_is_word = false;

    for c in name.chars() {
        if prev_is_word {
            capitalized.push(c);
        } else {
            capitalized.push(c.to_ascii_uppercase());
        }
        prev_is_word = c.is_ascii_alphanumeric() || c == '_';
    }

    if capitalized
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("mime-"))
    {
        capitalized.replace_range(..5, "MIME-");
    }

    capitalized
}

/// Formats header fields as `Name: value` lines.
///
/// Fields with an empty value are skipped.
#[must_use]
pub fn format_headers<'a, I>(fields: I, line_ending: LineEnding) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let eol = line_ending.as_str();
    let mut out = String::new();

    for (name, value) in fields {
        if value.is_empty() {
            continue;
        }
        out.push_str(&capitalize_name(name));
        out.push_str(": ");
        out.push_str(value);
        out.push_str(eol);
    }

    out
}

/// Collapses each attribute group into a single header value.
///
/// The primary value comes first, followed by one continuation line per
/// named attribute:
///
/// ```text
/// text/plain;
///  charset="utf-8"
/// ```
#[must_use]
pub fn format_attributes(attributes: &Attributes, line_ending: LineEnding) -> Vec<(String, String)> {
    let eol = line_ending.as_str();

    attributes
        .iter()
        .map(|(name, group)| {
            let mut value = group.primary().unwrap_or_default().to_string();
            for (sub, sub_value) in group.params() {
                value.push(';');
                value.push_str(eol);
                value.push(' ');
                value.push_str(sub);
                value.push_str("=\"");
                value.push_str(sub_value);
                value.push('"');
            }
            (name.to_string(), value)
        })
        .collect()
}

/// Formats an address with an optional display comment, as used in `From`
/// and `To` headers.
///
/// ```
/// use mimemail::format_address;
///
/// assert_eq!(format_address("me@example.com", Some("Me")), "\"Me\" <me@example.com>");
/// assert_eq!(format_address(" me@example.com ", None), "me@example.com");
/// ```
#[must_use]
pub fn format_address(address: &str, comment: Option<&str>) -> String {
    let address = address.trim();
    match comment.map(str::trim).filter(|c| !c.is_empty()) {
        Some(comment) => format!("\"{comment}\" <{address}>"),
        None => address.to_string(),
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

    #[test]
    fn test_headers_set_get() {
        let mut headers = Headers::new();
        headers.set("X-Mailer", "  My Mailer 1.0 ");
        assert_eq!(headers.get("x-mailer"), Some("My Mailer 1.0"));
        assert_eq!(headers.get(" X-MAILER "), Some("My Mailer 1.0")); // Case insensitive
    }

    #[test]
    fn test_headers_reject_line_breaks() {
        let mut headers = Headers::new();
        headers.set("subject", "hello");
        headers.set("subject", "hi\nBcc: victim@example.com");
        headers.set("to", "a@example.com\r\nCc: b@example.com");
        headers.set("x-bad\nname", "value");

        assert_eq!(headers.get("subject"), Some("hello"));
        assert!(headers.get("to").is_none());
        assert_eq!(headers.len(), 1);
        assert_eq!(
            format_headers(headers.iter(), LineEnding::Lf),
            "Subject: hello\n"
        );
    }

    #[test]
    fn test_attributes_reject_line_breaks() {
        let mut attributes = Attributes::new();
        attributes.set("content-type", "text/plain");
        attributes.set("content-type.charset", "utf-8\r\nX-Injected: yes");
        attributes.set("content-type", "text/html\nX-Injected: yes");

        assert_eq!(attributes.get("content-type"), Some("text/plain"));
        assert!(attributes.get("content-type.charset").is_none());
    }

    #[test]
    fn test_headers_set_replaces() {
        let mut headers = Headers::new();
        headers.set("To", "alice@example.com");
        headers.set("to", "bob@example.com");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("To"), Some("bob@example.com"));
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.set("Subject", "Test");
        assert_eq!(headers.remove("SUBJECT").as_deref(), Some("Test"));
        assert!(headers.get("Subject").is_none());
        assert!(headers.remove("Subject").is_none());
    }

    #[test]
    fn test_headers_blank_value_removes() {
        let mut headers = Headers::new();
        headers.set("Subject", "Test");
        headers.set("Subject", "   ");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_iter_sorted() {
        let mut headers = Headers::new();
        headers.set("to", "b@example.com");
        headers.set("from", "a@example.com");
        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["from", "to"]);
    }

    #[test]
    fn test_attributes_dotted_paths() {
        let mut attrs = Attributes::new();
        attrs.set("Content-Type", "text/plain");
        attrs.set("content-type.CHARSET", "utf-8");

        assert_eq!(attrs.get("content-type"), Some("text/plain"));
        assert_eq!(attrs.get("content-type.charset"), Some("utf-8"));
        assert_eq!(attrs.get("content-type.name"), None);
        assert_eq!(attrs.get("content-type..charset"), Some("utf-8"));
        assert_eq!(attrs.get("content-type.charset.extra"), Some("utf-8"));
    }

    #[test]
    fn test_attributes_remove() {
        let mut attrs = Attributes::new();
        attrs.set("content-type", "text/plain");
        attrs.set("content-type.charset", "utf-8");

        assert_eq!(attrs.remove("content-type.charset").as_deref(), Some("utf-8"));
        assert_eq!(attrs.get("content-type"), Some("text/plain"));

        attrs.set("content-type", "");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_attributes_empty_path_ignored() {
        let mut attrs = Attributes::new();
        attrs.set("", "text/plain");
        attrs.set(".", "text/plain");
        assert!(attrs.is_empty());
        assert_eq!(attrs.get(""), None);
    }

    #[test]
    fn test_capitalize_name() {
        assert_eq!(capitalize_name("content-type"), "Content-Type");
        assert_eq!(capitalize_name("x-mailer"), "X-Mailer");
        assert_eq!(capitalize_name("mime-version"), "MIME-Version");
        assert_eq!(capitalize_name("content-id"), "Content-Id");
        assert_eq!(capitalize_name("x-mime-thing"), "X-Mime-Thing");
        assert_eq!(capitalize_name("x_custom"), "X_custom");
        assert_eq!(capitalize_name("mime"), "Mime");
    }

    #[test]
    fn test_format_headers() {
        let formatted = format_headers(
            [("from", "me@example.com"), ("subject", ""), ("mime-version", "1.0")],
            LineEnding::Lf,
        );
        assert_eq!(formatted, "From: me@example.com\nMIME-Version: 1.0\n");

        let formatted = format_headers([("to", "you@example.com")], LineEnding::CrLf);
        assert_eq!(formatted, "To: you@example.com\r\n");
    }

    #[test]
    fn test_format_headers_empty() {
        assert_eq!(format_headers(std::iter::empty(), LineEnding::Lf), "");
    }

    #[test]
    fn test_format_attributes() {
        let mut attrs = Attributes::new();
        attrs.set("content-type", "text/plain");
        attrs.set("content-type.charset", "utf-8");
        attrs.set("content-type.name", "notes.txt");
        attrs.set("content-length", "12");

        let formatted = format_attributes(&attrs, LineEnding::Lf);
        assert_eq!(
            formatted,
            vec![
                (
                    "content-type".to_string(),
                    "text/plain;\n charset=\"utf-8\";\n name=\"notes.txt\"".to_string()
                ),
                ("content-length".to_string(), "12".to_string()),
            ]
        );
    }

    #[test]
    fn test_format_attributes_primary_first() {
        let mut attrs = Attributes::new();
        attrs.set("content-type.charset", "utf-8");
        attrs.set("content-type", "text/html");

        let formatted = format_attributes(&attrs, LineEnding::CrLf);
        assert_eq!(formatted[0].1, "text/html;\r\n charset=\"utf-8\"");
    }

    #[test]
    fn test_format_attributes_reset_moves_to_end() {
        let mut attrs = Attributes::new();
        attrs.set("content-type", "text/plain");
        attrs.set("content-type.charset", "us-ascii");
        attrs.set("content-type.format", "flowed");
        attrs.set("content-type.charset", "utf-8");

        let formatted = format_attributes(&attrs, LineEnding::Lf);
        assert_eq!(
            formatted[0].1,
            "text/plain;\n format=\"flowed\";\n charset=\"utf-8\""
        );
    }

    #[test]
    fn test_format_address() {
        assert_eq!(
            format_address("me@example.com", Some(" Me ")),
            "\"Me\" <me@example.com>"
        );
        assert_eq!(format_address("me@example.com", Some("")), "me@example.com");
    }
}
