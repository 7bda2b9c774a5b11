//! Message configuration types.

use crate::encoding::MAX_LINE_LENGTH;

/// Default MIME version written to top-level messages.
pub const MIME_VERSION: &str = "1.0";

/// Text emitted before the first boundary of a multipart body.
///
/// MIME-aware readers ignore it.
pub const PROLOGUE: &str = "This is a multi-part message in MIME format.";

/// Line terminator used for headers, boundaries and encoded bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineEnding {
    /// Bare line feed, what local MTAs such as sendmail expect.
    #[default]
    Lf,
    /// CRLF, required on the wire by SMTP.
    CrLf,
}

impl LineEnding {
    /// Returns the terminator as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Settings shared by every part of a message tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    /// Line terminator.
    pub line_ending: LineEnding,
    /// Maximum quoted-printable line length, excluding the terminator.
    pub qp_line_length: usize,
    /// Value of the top-level `MIME-Version` header.
    pub mime_version: String,
    /// Text written before the first boundary of multipart bodies.
    pub prologue: String,
}

impl Settings {
    /// Creates a settings builder.
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Lf,
            qp_line_length: MAX_LINE_LENGTH,
            mime_version: MIME_VERSION.to_string(),
            prologue: PROLOGUE.to_string(),
        }
    }
}

/// Builder for message settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the line terminator.
    #[must_use]
    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.settings.line_ending = line_ending;
        self
    }

    /// Sets the quoted-printable line length.
    #[must_use]
    pub fn qp_line_length(mut self, length: usize) -> Self {
        self.settings.qp_line_length = length;
        self
    }

    /// Sets the `MIME-Version` header value.
    #[must_use]
    pub fn mime_version(mut self, version: impl Into<String>) -> Self {
        self.settings.mime_version = version.into();
        self
    }

    /// Sets the multipart prologue.
    #[must_use]
    pub fn prologue(mut self, prologue: impl Into<String>) -> Self {
        self.settings.prologue = prologue.into();
        self
    }

    /// Builds the settings.
    #[must_use]
    pub fn build(self) -> Settings {
        self.settings
    }
}

/// Configuration snapshot a [`Part`](crate::Part) is constructed from.
///
/// Every field is optional. Missing or empty values leave the
/// corresponding header unset instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PartConfig {
    /// Content type, e.g. `text/plain` or `multipart/mixed`.
    pub content_type: Option<String>,
    /// `charset` attribute of the content type.
    pub charset: Option<String>,
    /// `Content-ID` value.
    pub id: Option<String>,
    /// Body of the part.
    pub data: Option<String>,
    /// Content transfer encoding, e.g. `7bit` or `quoted-printable`.
    pub encoding: Option<String>,
    /// Content disposition (`inline` or `attachment`).
    pub disposition: Option<String>,
    /// Body length override, used unless the body is quoted-printable encoded.
    pub length: Option<String>,
    /// Whether `Content-Length` is set at all.
    pub track_length: bool,
    /// File name, written to both content type and disposition.
    pub filename: Option<String>,
    /// Multipart boundary; generated when absent.
    pub boundary: Option<String>,
}

impl Default for PartConfig {
    fn default() -> Self {
        Self {
            content_type: None,
            charset: None,
            id: None,
            data: None,
            encoding: None,
            disposition: None,
            length: None,
            track_length: true,
            filename: None,
            boundary: None,
        }
    }
}

impl PartConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with the given content type.
    #[must_use]
    pub fn with_type(content_type: impl Into<String>) -> Self {
        Self::new().content_type(content_type)
    }

    /// Creates a `text/plain` part with the given body.
    #[must_use]
    pub fn text(data: impl Into<String>) -> Self {
        Self::with_type("text/plain").data(data)
    }

    /// Creates a `text/html` part with the given body.
    #[must_use]
    pub fn html(data: impl Into<String>) -> Self {
        Self::with_type("text/html").data(data)
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the charset.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the content ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the transfer encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Sets the content disposition.
    #[must_use]
    pub fn disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = Some(disposition.into());
        self
    }

    /// Overrides the computed content length.
    #[must_use]
    pub fn length(mut self, length: impl Into<String>) -> Self {
        self.length = Some(length.into());
        self
    }

    /// Enables or disables the `Content-Length` header.
    #[must_use]
    pub fn track_length(mut self, track: bool) -> Self {
        self.track_length = track;
        self
    }

    /// Sets the attachment file name.
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets an explicit multipart boundary.
    #[must_use]
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }
}

/// Returns the trimmed value, or `None` when it is absent or blank.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_ending() {
        assert_eq!(LineEnding::default(), LineEnding::Lf);
        assert_eq!(LineEnding::Lf.as_str(), "\n");
        assert_eq!(LineEnding::CrLf.as_str(), "\r\n");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.qp_line_length, 76);
        assert_eq!(settings.mime_version, "1.0");
        assert_eq!(settings.prologue, PROLOGUE);
    }

    #[test]
    fn test_settings_builder() {
        let settings = Settings::builder()
            .line_ending(LineEnding::CrLf)
            .qp_line_length(72)
            .prologue("MIME only")
            .build();

        assert_eq!(settings.line_ending, LineEnding::CrLf);
        assert_eq!(settings.qp_line_length, 72);
        assert_eq!(settings.prologue, "MIME only");
        assert_eq!(settings.mime_version, "1.0");
    }

    #[test]
    fn test_part_config_builders() {
        let config = PartConfig::text("hello").charset("utf-8");
        assert_eq!(config.content_type.as_deref(), Some("text/plain"));
        assert_eq!(config.data.as_deref(), Some("hello"));
        assert_eq!(config.charset.as_deref(), Some("utf-8"));
        assert!(config.track_length);

        let config = PartConfig::html("<p>hi</p>").track_length(false);
        assert_eq!(config.content_type.as_deref(), Some("text/html"));
        assert!(!config.track_length);
    }

    #[test]
    fn test_present() {
        assert_eq!(present(Some("  x ")), Some("x"));
        assert_eq!(present(Some("   ")), None);
        assert_eq!(present(None), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_part_config_deserialize() {
        let config: PartConfig =
            serde_json::from_str(r#"{"content_type": "text/plain", "data": "hi"}"#).unwrap();
        assert_eq!(config.content_type.as_deref(), Some("text/plain"));
        assert!(config.track_length);

        let settings: Settings = serde_json::from_str(r#"{"line_ending": "crlf"}"#).unwrap();
        assert_eq!(settings.line_ending, LineEnding::CrLf);
        assert_eq!(settings.qp_line_length, 76);
    }
}
