//! Command line arguments

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

/// Prompt shown when `--text2search` is not given
const QUERY_PROMPT: &str = "Ingrese el texto a buscar";

/// Scrape the Rama Judicial "Consulta de Procesos" portal
#[derive(Parser, Debug)]
#[command(name = "rjco-scraping", version, about)]
pub struct Args {
    /// Party name to search for, or the docket number with --code
    #[arg(long = "text2search", value_name = "TEXT")]
    pub text2search: Option<String>,

    /// Base name of the output files; the extension is added per mode
    #[arg(long = "output_file", value_name = "NAME", default_value = "output")]
    pub output_file: String,

    /// Look up one process by docket number
    #[arg(long = "code", overrides_with = "no_code")]
    code: bool,

    /// Search a party name across every city and entity (default)
    #[arg(long = "no-code", overrides_with = "code")]
    no_code: bool,

    /// Run Chromium without a window
    #[arg(long = "headless", overrides_with = "no_headless")]
    headless: bool,

    /// Show the Chromium window
    #[arg(long = "no-headless", overrides_with = "headless")]
    no_headless: bool,

    /// Configuration file (defaults to ./rjco-scraping.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Whether the run is a docket-number lookup
    pub fn case_mode(&self) -> bool {
        self.code && !self.no_code
    }

    /// Headless override, if either flag was given
    pub fn headless(&self) -> Option<bool> {
        match (self.headless, self.no_headless) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// The search text, asking on stdin when it was not passed
    pub fn query(&self) -> io::Result<String> {
        match &self.text2search {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => prompt_query(&mut io::stdin().lock(), &mut io::stdout()),
        }
    }
}

/// Ask until a non-empty line is entered
fn prompt_query<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<String> {
    loop {
        write!(output, "{}: ", QUERY_PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no search text given",
            ));
        }

        let text = line.trim();
        if !text.is_empty() {
            return Ok(text.to_string());
        }
    }
}
