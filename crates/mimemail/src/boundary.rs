//! Multipart boundary generation.
//!
//! Boundaries carry 128 random bits, so siblings in the same tree (or in
//! any two messages) never collide in practice. The randomness source is
//! supplied by the caller, which keeps tests deterministic.

use rand::Rng;

/// Maximum boundary length allowed by RFC 2046 section 5.1.1.
pub const MAX_BOUNDARY_LENGTH: usize = 70;

const PREFIX: &str = "_----=_Part_";

/// Generates a new boundary from `rng`.
///
/// The result looks like `_----=_Part_0123456789abcdef0123456789abcdef_`
/// (45 characters). Quoted-printable text never contains `=_`, so the
/// boundary cannot occur inside an encoded body.
#[must_use]
pub fn generate_boundary<R: Rng + ?Sized>(rng: &mut R) -> String {
    let id: u128 = rng.r#gen();
    format!("{PREFIX}{id:032x}_")
}

/// Returns true if `boundary` can delimit multipart bodies: 1 to
/// [`MAX_BOUNDARY_LENGTH`] characters from the RFC 2046 `bchars` set, not
/// ending in a space.
#[must_use]
pub fn is_valid_boundary(boundary: &str) -> bool {
    (1..=MAX_BOUNDARY_LENGTH).contains(&boundary.len())
        && !boundary.ends_with(' ')
        && boundary.bytes().all(is_boundary_char)
}

const fn is_boundary_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?' | b' '
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_boundary_format() {
        let boundary = generate_boundary(&mut rand::thread_rng());
        assert!(boundary.starts_with(PREFIX));
        assert!(boundary.ends_with('_'));
        assert_eq!(boundary.len(), PREFIX.len() + 32 + 1);
        assert!(boundary.len() <= MAX_BOUNDARY_LENGTH);
    }

    #[test]
    fn test_generated_boundary_is_valid() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(is_valid_boundary(&generate_boundary(&mut rng)));
        }
    }

    #[test]
    fn test_is_valid_boundary() {
        assert!(is_valid_boundary("XYZ"));
        assert!(is_valid_boundary("simple boundary"));
        assert!(is_valid_boundary("'()+_,-./:=?"));
        assert!(is_valid_boundary(&"b".repeat(MAX_BOUNDARY_LENGTH)));

        assert!(!is_valid_boundary(""));
        assert!(!is_valid_boundary(&"b".repeat(MAX_BOUNDARY_LENGTH + 1)));
        assert!(!is_valid_boundary("trailing "));
        assert!(!is_valid_boundary("quote\"d"));
        assert!(!is_valid_boundary("line\nbreak"));
        assert!(!is_valid_boundary("caf\u{e9}"));
    }

    #[test]
    fn test_seeded_boundaries_are_deterministic() {
        let a = generate_boundary(&mut StdRng::seed_from_u64(7));
        let b = generate_boundary(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_uniqueness() {
        let mut rng = rand::thread_rng();
        let mut seen = HashSet::new();

        for _ in 0..10000 {
            let boundary = generate_boundary(&mut rng);
            assert!(seen.insert(boundary), "duplicate boundary generated");
        }
    }
}
