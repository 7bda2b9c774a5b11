//! Error types for message rendering.

/// Result type alias for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message rendering errors.
///
/// Construction never fails: absent or malformed configuration simply
/// leaves the corresponding header unset. Only output that would violate
/// RFC 2046 is reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A multipart part has no boundary to delimit its children.
    #[error("Missing boundary in multipart part ({content_type})")]
    MissingBoundary {
        /// Content type of the offending part (e.g., "multipart/mixed").
        content_type: String,
    },
}

impl Error {
    /// Creates a missing boundary error for the given content type.
    #[must_use]
    pub fn missing_boundary(content_type: impl Into<String>) -> Self {
        Self::MissingBoundary {
            content_type: content_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_boundary_display() {
        let err = Error::missing_boundary("multipart/mixed");
        assert_eq!(
            err.to_string(),
            "Missing boundary in multipart part (multipart/mixed)"
        );
    }
}
