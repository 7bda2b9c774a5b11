//! Message construction context.

use crate::config::{PartConfig, Settings};
use crate::part::Part;
use chrono::{DateTime, FixedOffset};
use rand::RngCore;
use rand::rngs::ThreadRng;
use tracing::debug;

/// Builds message trees from [`PartConfig`] snapshots.
///
/// A composer carries the [`Settings`] for new messages, the randomness
/// source used for multipart boundaries, and optionally a fixed `Date`.
///
/// ```
/// use mimemail::{Composer, PartConfig};
///
/// let mut composer = Composer::new();
/// let mut message = composer.message(&PartConfig::with_type("multipart/alternative"));
/// message.set_header("subject", "Hello");
/// composer.add_child(&mut message, &PartConfig::text("Hi there"));
/// composer.add_child(&mut message, &PartConfig::html("<p>Hi there</p>").encoding("quoted-printable"));
///
/// let rendered = message.render().unwrap();
/// assert!(rendered.contains("Subject: Hello\n"));
/// ```
#[derive(Debug, Clone)]
pub struct Composer<R = ThreadRng> {
    settings: Settings,
    rng: R,
    date: Option<DateTime<FixedOffset>>,
}

impl Composer {
    /// Creates a composer with default settings and the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Creates a composer with the given settings and the thread-local RNG.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self::with_rng(settings, rand::thread_rng())
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> Composer<R> {
    /// Creates a composer drawing boundaries from `rng`.
    ///
    /// Seeding the RNG makes generated boundaries reproducible.
    #[must_use]
    pub const fn with_rng(settings: Settings, rng: R) -> Self {
        Self {
            settings,
            rng,
            date: None,
        }
    }

    /// Uses a fixed `Date` header value instead of the current local time.
    #[must_use]
    pub fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Returns the settings used for new messages.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Creates a top-level message part with `MIME-Version` and `Date`
    /// headers.
    pub fn message(&mut self, config: &PartConfig) -> Part {
        let date = self
            .date
            .map_or_else(|| chrono::Local::now().to_rfc2822(), |date| date.to_rfc2822());
        debug!(content_type = ?config.content_type, "composing message");
        Part::build(config, &self.settings, &mut self.rng, Some(&date), None)
    }

    /// Builds a child part from `config`, appends it to `parent` and
    /// returns it.
    ///
    /// The child inherits the parent's settings.
    pub fn add_child<'p>(&mut self, parent: &'p mut Part, config: &PartConfig) -> &'p mut Part {
        parent.add_child_with(config, &mut self.rng)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::LineEnding;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded(seed: u64) -> Composer<StdRng> {
        Composer::with_rng(Settings::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_fixed_date() {
        let date = DateTime::parse_from_rfc2822("Fri, 18 Jun 2004 10:00:00 -0700").unwrap();
        let mut composer = seeded(0).date(date);
        let message = composer.message(&PartConfig::text("hi"));
        assert_eq!(message.header("date"), Some("Fri, 18 Jun 2004 10:00:00 -0700"));
        assert_eq!(message.header("mime-version"), Some("1.0"));
    }

    #[test]
    fn test_seeded_boundaries_repeat() {
        let config = PartConfig::with_type("multipart/mixed");
        let a = seeded(42).message(&config);
        let b = seeded(42).message(&config);
        assert_eq!(a.boundary(), b.boundary());

        let c = seeded(43).message(&config);
        assert_ne!(a.boundary(), c.boundary());
    }

    #[test]
    fn test_children_draw_fresh_boundaries() {
        let mut composer = seeded(1);
        let mut root = composer.message(&PartConfig::with_type("multipart/mixed"));
        composer.add_child(&mut root, &PartConfig::with_type("multipart/alternative"));
        composer.add_child(&mut root, &PartConfig::with_type("multipart/related"));

        let boundaries = [
            root.boundary().unwrap(),
            root.children()[0].boundary().unwrap(),
            root.children()[1].boundary().unwrap(),
        ];
        assert_ne!(boundaries[0], boundaries[1]);
        assert_ne!(boundaries[1], boundaries[2]);
        assert_ne!(boundaries[0], boundaries[2]);
    }

    #[test]
    fn test_settings_inherited() {
        let settings = Settings::builder().line_ending(LineEnding::CrLf).build();
        let mut composer = Composer::with_rng(settings, StdRng::seed_from_u64(0));
        let mut root = composer.message(&PartConfig::with_type("multipart/mixed"));
        let child = composer.add_child(&mut root, &PartConfig::text("x"));

        assert_eq!(child.settings().line_ending, LineEnding::CrLf);
        assert_eq!(composer.settings().line_ending, LineEnding::CrLf);
    }
}
