//! xbfdump - Command-line tool for dumping binary XAML files.
//!
//! Reads an XBF file and prints its object tree as XAML-like markup.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use xbf::{DumpOptions, XbfDocument};
use xbf_common::utf16;

/// xbfdump - binary XAML (XBF) dumper
#[derive(Parser, Debug)]
#[command(name = "xbfdump")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input XBF file
    input: PathBuf,

    /// List the header and metadata tables before the tree
    #[arg(long)]
    verbose: bool,

    /// Write UTF-8 instead of UTF-16LE with a byte order mark
    #[arg(long)]
    no_unicode: bool,

    /// Print booleans by their stored meaning
    #[arg(long)]
    canonical_booleans: bool,
}

impl Cli {
    fn dump_options(&self) -> DumpOptions {
        DumpOptions {
            verbose: self.verbose,
            canonical_booleans: self.canonical_booleans,
        }
    }
}

/// Rewrite `/verbose` and `/nounicode` to their long-option spellings.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(s) if s.eq_ignore_ascii_case("/verbose") => OsString::from("--verbose"),
            Some(s) if s.eq_ignore_ascii_case("/nounicode") => OsString::from("--no-unicode"),
            _ => arg,
        })
        .collect()
}

/// Encode the dump as UTF-8, or as UTF-16LE with a byte order mark.
fn encode_output(text: String, no_unicode: bool) -> Vec<u8> {
    if no_unicode {
        return text.into_bytes();
    }
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(utf16::encode_le(&text));
    bytes
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    debug!(?cli, "parsed arguments");

    let document = XbfDocument::open(&cli.input)
        .with_context(|| format!("Failed to parse XBF file: {}", cli.input.display()))?;
    let text = document
        .dump(cli.dump_options())
        .context("Failed to render XBF document")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(&encode_output(text, cli.no_unicode)).context("Failed to write output")?;
    out.flush().context("Failed to write output")?;

    Ok(())
}
