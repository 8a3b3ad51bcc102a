use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::process::tally::Tally;

const COLUMN_WIDTH: usize = 10;

/// How the growth delta is signed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignStyle {
    /// `+2`, `+0`, `-1`.
    #[default]
    Signed,
    /// Always a literal `+` in front of the number, so a drop reads `+-1`.
    LiteralPlus,
}

impl SignStyle {
    pub fn render(self, delta: i64) -> String {
        match self {
            SignStyle::Signed if delta < 0 => delta.to_string(),
            SignStyle::Signed | SignStyle::LiteralPlus => format!("+{}", delta),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub novelty_threshold: f64,
    pub observed_limit: usize,
    pub sign_style: SignStyle,
}

/// Write the full report: diagnostics, observed codes, matrix, growth.
pub fn write_report<W: Write>(out: &mut W, tally: &Tally, opts: &ReportOptions) -> Result<()> {
    write_diagnostics(out, tally, opts)?;
    write_matrix(out, tally)?;
    write_growth(out, tally, opts.sign_style)?;
    Ok(())
}

fn write_diagnostics<W: Write>(out: &mut W, tally: &Tally, opts: &ReportOptions) -> Result<()> {
    let stats = tally.stats();
    writeln!(out, "\n========== Diagnostics ==========")?;
    writeln!(out, "Total lines: {}", stats.total_lines)?;
    writeln!(out, "Records in requested years: {}", stats.year_matches)?;
    writeln!(
        out,
        "Records with novelty > {}: {}",
        opts.novelty_threshold, stats.novelty_matches
    )?;
    writeln!(out, "Valid records: {}", stats.valid_records)?;
    writeln!(out, "Short rows skipped: {}", stats.short_rows)?;
    writeln!(out, "Malformed rows skipped: {}", stats.malformed_rows)?;

    writeln!(out, "\nObserved codes (first {}):", opts.observed_limit)?;
    for (code, count) in tally.observed().iter().take(opts.observed_limit) {
        writeln!(out, "{}: {} times", code, count)?;
    }
    Ok(())
}

fn write_matrix<W: Write>(out: &mut W, tally: &Tally) -> Result<()> {
    writeln!(out, "\n========== Technology Heat Matrix ==========")?;
    write!(out, "{:<w$}", "Year", w = COLUMN_WIDTH)?;
    for code in tally.codes() {
        write!(out, "{:<w$}", code, w = COLUMN_WIDTH)?;
    }
    writeln!(out)?;

    for &year in tally.years() {
        write!(out, "{:<w$}", year, w = COLUMN_WIDTH)?;
        for code in tally.codes() {
            write!(out, "{:<w$}", tally.count(year, code), w = COLUMN_WIDTH)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_growth<W: Write>(out: &mut W, tally: &Tally, style: SignStyle) -> Result<()> {
    writeln!(out, "\n========== Growth ==========")?;
    let Some(growth) = tally.growth() else {
        writeln!(out, "no years requested")?;
        return Ok(());
    };
    for (code, first, last) in growth {
        let delta = last as i64 - first as i64;
        writeln!(
            out,
            "{}: {} -> {} ({})",
            code,
            first,
            last,
            style.render(delta)
        )?;
    }
    Ok(())
}
