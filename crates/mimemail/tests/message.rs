//! End-to-end tests for message composition and rendering.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;

use chrono::DateTime;
use mimemail::{Composer, Error, LineEnding, Part, PartConfig, Settings, encoding};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn composer() -> Composer<StdRng> {
    let date = DateTime::parse_from_rfc2822("Fri, 18 Jun 2004 10:00:00 -0700").unwrap();
    Composer::with_rng(Settings::default(), StdRng::seed_from_u64(2004)).date(date)
}

/// Splits a rendered message at the first blank line.
fn split_message(rendered: &str) -> (&str, &str) {
    rendered.split_once("\n\n").expect("blank line after headers")
}

#[test]
fn test_plain_text_message() {
    let message = composer().message(&PartConfig::text("hello"));
    let rendered = message.render().unwrap();
    let (headers, body) = split_message(&rendered);

    assert_eq!(
        headers,
        concat!(
            "Date: Fri, 18 Jun 2004 10:00:00 -0700\n",
            "MIME-Version: 1.0\n",
            "Content-Type: text/plain\n",
            "Content-Length: 5",
        )
    );
    assert_eq!(body, "hello");
}

#[test]
fn test_two_part_multipart() {
    let mut composer = composer();
    let mut message = composer.message(&PartConfig::with_type("multipart/mixed"));
    composer.add_child(&mut message, &PartConfig::text("first").charset("us-ascii"));
    composer.add_child(
        &mut message,
        &PartConfig::with_type("application/octet-stream")
            .data("second")
            .disposition("attachment")
            .filename("second.bin"),
    );

    let boundary = message.boundary().unwrap().to_string();
    let delimiter = format!("--{boundary}\n");
    let closing = format!("--{boundary}--\n");
    let body = message.render_body().unwrap();

    assert_eq!(body.matches(&delimiter).count(), 2);
    assert_eq!(body.matches(&closing).count(), 1);

    let first = body.find("first").unwrap();
    let second = body.find("second\n--").unwrap();
    assert!(first < second);

    let sections: Vec<&str> = body.split(&delimiter).collect();
    assert_eq!(sections.len(), 3);
    assert!(sections[0].starts_with("This is a multi-part message in MIME format.\n"));
    assert_eq!(
        sections[1],
        "Content-Type: text/plain;\n charset=\"us-ascii\"\nContent-Length: 5\n\nfirst\n"
    );
    assert!(sections[2].starts_with(concat!(
        "Content-Type: application/octet-stream;\n",
        " name=\"second.bin\"\n",
        "Content-Disposition: attachment;\n",
        " filename=\"second.bin\"\n",
        "Content-Length: 6\n",
        "\n",
        "second\n",
    )));

    let rendered = message.render().unwrap();
    assert!(rendered.contains(&format!(
        "Content-Type: multipart/mixed;\n boundary=\"{boundary}\"\n"
    )));
}

#[test]
fn test_quoted_printable_part() {
    let html = format!("<p style=\"color: red\">{}</p>", "x".repeat(100));
    let message = composer().message(&PartConfig::html(&html).encoding("quoted-printable"));

    let body = message.body().unwrap();
    assert!(body.starts_with("<p style=3D\"color: red\">"));
    assert!(body.lines().all(|line| line.len() <= 76));
    assert_eq!(
        message.attribute("content-length"),
        Some(body.len().to_string().as_str())
    );
    assert_eq!(
        message.attribute("content-transfer-encoding"),
        Some("quoted-printable")
    );

    // Bodies are encoded once, never at render time
    let rendered = message.render().unwrap();
    assert!(rendered.ends_with(body));
}

#[test]
fn test_header_set_then_delete() {
    let mut message = composer().message(&PartConfig::text("x"));
    message.set_header("X-Mailer", "mimemail");
    assert_eq!(message.header("x-mailer"), Some("mimemail"));

    message.remove_header("x-MAILER");
    assert!(message.header("x-mailer").is_none());
    assert!(!message.render().unwrap().contains("X-Mailer"));
}

#[test]
fn test_automatic_headers_removable() {
    let mut message = composer().message(&PartConfig::text("x"));
    message.remove_header("date");
    message.remove_header("mime-version");

    let rendered = message.render().unwrap();
    assert!(!rendered.contains("Date:"));
    assert!(!rendered.contains("MIME-Version:"));
}

#[test]
fn test_boundaries_unique_across_parts() {
    let mut seen = HashSet::new();
    for _ in 0..2000 {
        let part = Part::new(&PartConfig::with_type("multipart/mixed"));
        let boundary = part.boundary().unwrap().to_string();
        assert!(boundary.len() <= mimemail::MAX_BOUNDARY_LENGTH);
        assert!(seen.insert(boundary), "duplicate boundary generated");
    }
}

#[test]
fn test_seeded_rendering_is_reproducible() {
    let build = || {
        let mut composer = composer();
        let mut message = composer.message(&PartConfig::with_type("multipart/related"));
        composer.add_child(&mut message, &PartConfig::html("<img src=\"cid:logo\">"));
        composer.add_child(
            &mut message,
            &PartConfig::with_type("image/png")
                .id("<logo>")
                .encoding("base64")
                .data("iVBORw0KGgo="),
        );
        message.render().unwrap()
    };

    assert_eq!(build(), build());
}

#[test]
fn test_crlf_message() {
    let settings = Settings::builder().line_ending(LineEnding::CrLf).build();
    let mut composer = Composer::with_rng(settings, StdRng::seed_from_u64(1));
    let mut message = composer.message(&PartConfig::with_type("multipart/alternative"));
    composer.add_child(&mut message, &PartConfig::text("line one\nline two").encoding("quoted-printable"));

    let rendered = message.render().unwrap();
    assert!(rendered.contains("line one\r\nline two"));
    assert!(!rendered.replace("\r\n", "").contains('\n'));
}

#[test]
fn test_missing_boundary_is_reported() {
    let mut message = composer().message(&PartConfig::with_type("multipart/mixed"));
    message.add_child(&PartConfig::text("x"));
    message.remove_attribute("content-type.boundary");

    let err = message.render().unwrap_err();
    assert!(matches!(err, Error::MissingBoundary { .. }));
}

#[test]
fn test_encoder_matches_part_encoding() {
    let text = "caf\u{e9} = coffee ";
    let message = composer().message(&PartConfig::text(text).encoding("quoted-printable"));
    assert_eq!(
        message.body(),
        Some(encoding::encode_quoted_printable(text.trim().as_bytes()).as_str())
    );
    assert_eq!(message.body(), Some("caf=C3=A9 =3D coffee"));
}

#[test]
fn test_part_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Part>();
    assert_send_sync::<Composer<StdRng>>();
}

#[test]
fn test_header_line_breaks_not_rendered() {
    let mut message = composer().message(&PartConfig::text("x"));
    message.set_header("subject", "hi\nBcc: victim@example.com");

    let rendered = message.render().unwrap();
    assert!(message.header("subject").is_none());
    assert!(!rendered.contains("Bcc:"));
}

#[test]
fn test_supplied_boundaries_stay_usable() {
    let mut composer = composer();
    let mut message = composer.message(&PartConfig::with_type("multipart/mixed").boundary("SAME"));
    let inner = composer.add_child(
        &mut message,
        &PartConfig::with_type("multipart/alternative").boundary("SAME"),
    );
    inner.add_child(&PartConfig::text("a"));
    composer.add_child(
        &mut message,
        &PartConfig::with_type("multipart/related").boundary("x".repeat(100)),
    );

    let boundaries = [
        message.boundary().unwrap(),
        message.children()[0].boundary().unwrap(),
        message.children()[1].boundary().unwrap(),
    ];
    assert_eq!(boundaries[0], "SAME");
    assert_ne!(boundaries[1], "SAME");
    assert!(boundaries.iter().all(|b| mimemail::is_valid_boundary(b)));
}
