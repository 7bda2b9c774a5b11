//! `mimemail-render` - render a JSON message document as RFC 2822 text
//!
//! Reads the document from the file given as the first argument, or from
//! stdin, and writes the rendered message to stdout.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod document;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use document::Document;

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the message
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mimemail=info,mimemail_render=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let input = read_input(path.as_deref())?;

    let document = Document::from_json(&input)?;
    let message = document.build()?;
    let rendered = message.render().context("Failed to render message")?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("Failed to write message")?;
    stdout.flush().context("Failed to write message")?;

    info!(bytes = rendered.len(), "Rendered message");
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}
