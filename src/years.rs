use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Parse a whitespace-separated year list. Parsing stops at the first token
/// that is not an integer; everything after it is ignored.
pub fn parse_years(input: &str) -> Vec<i32> {
    input
        .split_whitespace()
        .map_while(|tok| tok.parse::<i32>().ok())
        .collect()
}

/// Ask for the years on `out` and read a single line from `input`.
pub fn prompt_years<R: BufRead, W: Write>(mut input: R, mut out: W) -> Result<Vec<i32>> {
    writeln!(out, "Enter the years to analyse, separated by spaces")?;
    write!(out, "Years: ")?;
    out.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read years from stdin")?;
    Ok(parse_years(&line))
}
