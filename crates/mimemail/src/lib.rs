//! # mimemail
//!
//! RFC 2822 / MIME message composition.
//!
//! ## Features
//!
//! - **Part trees**: plain, HTML and nested multipart messages
//! - **Quoted-Printable**: body encoding with soft line wrapping (RFC 2045)
//! - **Header formatting**: `Content-*` attributes with continuation lines
//! - **Deterministic output**: injectable RNG for multipart boundaries
//!
//! The rendered message is a plain string; handing it to sendmail, an SMTP
//! client or a file is left to the caller.
//!
//! ## Quick Start
//!
//! ```
//! use mimemail::{Part, PartConfig};
//!
//! let mut message = Part::new(&PartConfig::text("Hello, World!").charset("utf-8"));
//! message.set_header("from", "sender@example.com");
//! message.set_header("to", "recipient@example.com");
//! message.set_header("subject", "Test");
//!
//! let rendered = message.render().unwrap();
//! assert!(rendered.contains("Content-Length: 13\n"));
//! assert!(rendered.ends_with("\n\nHello, World!"));
//! ```
//!
//! ### Multipart Messages
//!
//! ```
//! use mimemail::{Part, PartConfig};
//!
//! let mut message = Part::new(&PartConfig::with_type("multipart/alternative"));
//! message.add_child(&PartConfig::text("Plain text version"));
//! message.add_child(
//!     &PartConfig::html("<html><body><h1>HTML version</h1></body></html>")
//!         .encoding("quoted-printable"),
//! );
//!
//! let body = message.render_body().unwrap();
//! assert_eq!(body.matches("--_----=_Part_").count(), 3);
//! ```
//!
//! ### Wire Format
//!
//! ```
//! use mimemail::{Composer, LineEnding, PartConfig, Settings};
//!
//! let settings = Settings::builder().line_ending(LineEnding::CrLf).build();
//! let mut composer = Composer::with_settings(settings);
//! let message = composer.message(&PartConfig::text("over SMTP"));
//!
//! assert!(message.render().unwrap().contains("\r\n\r\nover SMTP"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod composer;
mod config;
mod error;
mod header;
mod part;

pub mod encoding;
pub mod render;

pub use boundary::{MAX_BOUNDARY_LENGTH, generate_boundary, is_valid_boundary};
pub use composer::Composer;
pub use config::{LineEnding, MIME_VERSION, PROLOGUE, PartConfig, Settings, SettingsBuilder};
pub use error::{Error, Result};
pub use header::{
    AttributeGroup, Attributes, Headers, capitalize_name, format_address, format_attributes,
    format_headers,
};
pub use part::{Part, QUOTED_PRINTABLE, is_multipart_type};
