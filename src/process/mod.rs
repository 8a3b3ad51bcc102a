// src/process/mod.rs
pub mod extract;
pub mod tally;
pub mod tokenize;

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::process::{
    extract::RowError,
    tally::{RowOutcome, Tally},
};

/// Open `path` and stream every data row into `tally`.
///
/// The file handle is dropped before returning, so the caller can report
/// without holding it open.
#[tracing::instrument(level = "info", skip(path, tally), fields(path = %path.as_ref().display()))]
pub fn run_file<P: AsRef<Path>>(path: P, tally: &mut Tally, progress_every: u64) -> Result<()> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open input file {}", path.as_ref().display()))?;
    run_reader(BufReader::new(file), tally, progress_every)
}

/// Stream rows from any buffered reader. The first line is a header and is
/// always skipped.
///
/// Lines are read as bytes and decoded lossily: stray non-UTF-8 bytes sit in
/// free-text columns and must not end the pass.
pub fn run_reader<R: BufRead>(mut reader: R, tally: &mut Tally, progress_every: u64) -> Result<()> {
    let start = Instant::now();
    let mut buf = Vec::new();

    if !read_line_lossy(&mut reader, &mut buf).context("failed to read header line")? {
        warn!("input is empty, nothing to tally");
        return Ok(());
    }
    debug!(
        columns = String::from_utf8_lossy(&buf).split(',').count(),
        "skipped header"
    );

    // line 1 is the header
    let mut line_no = 1;
    while read_line_lossy(&mut reader, &mut buf)
        .with_context(|| format!("failed to read line {}", line_no + 1))?
    {
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);

        let outcome = tally.record_line(&line);
        if let Err(err) = &outcome {
            if err.is_malformed() {
                warn!(line = line_no, %err, "skipping malformed row");
            }
        }

        let total = tally.stats().total_lines;
        if progress_due(&outcome, total, progress_every) {
            info!(lines = total, elapsed = ?start.elapsed(), "processed");
        }
    }

    let stats = tally.stats();
    info!(
        lines = stats.total_lines,
        valid = stats.valid_records,
        malformed = stats.malformed_rows,
        elapsed = ?start.elapsed(),
        "pass complete"
    );
    Ok(())
}

/// Read one line into `buf` without its `\n` or `\r\n` terminator.
/// Returns `false` at end of input.
fn read_line_lossy<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}

/// Progress is only checked for rows that made it through the year filter
/// and parsed cleanly; skipped rows still advance the line total.
fn progress_due(outcome: &Result<RowOutcome, RowError>, total: u64, every: u64) -> bool {
    let reached_end = matches!(
        outcome,
        Ok(RowOutcome::YearMatched | RowOutcome::NoveltyMatched | RowOutcome::Counted)
    );
    reached_end && every > 0 && total % every == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::tally::TallyRules;
    use anyhow::Result;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,patent_heat::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn codes() -> Vec<String> {
        vec!["G06K".into(), "F41G".into(), "G10F".into()]
    }

    const SAMPLE: &str = r#"patent_id,title,abstract,ipc,assignee,country,year,cited_by,novelty
US1,"Reader, optical",text,"[G06K 9/00, G06F 3/01]",Acme,US,2018,3,0.95
US2,Reader,text,[G06K 7/10],Acme,US,2020,1,0.5
US3,"Sight, rifle",text,[F41G 1/00],Bolt,DE,2020,0,0.99
US4,Piano,text,[G10F 1/02],Keys,JP,2019,2,0.97
US5,short,row
"#;

    #[test]
    fn test_run_file_end_to_end() -> Result<()> {
        init_test_logging();
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(SAMPLE.as_bytes())?;

        let mut tally = Tally::new(vec![2018, 2020], codes(), TallyRules::default());
        run_file(tmp.path(), &mut tally, 10_000)?;

        assert_eq!(tally.count(2018, "G06K"), 1);
        assert_eq!(tally.count(2020, "G06K"), 0);
        assert_eq!(tally.count(2020, "F41G"), 1);
        assert_eq!(tally.count(2020, "G10F"), 0);

        let stats = tally.stats();
        assert_eq!(stats.total_lines, 5);
        assert_eq!(stats.short_rows, 1);
        assert_eq!(stats.year_matches, 3);
        assert_eq!(stats.novelty_matches, 2);
        assert_eq!(stats.valid_records, 2);
        // 2019 is not requested, so G10F never reaches the log
        assert!(!tally.observed().contains_key("G10F"));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_open_error() {
        let mut tally = Tally::new(vec![2018], codes(), TallyRules::default());
        let err = run_file("/definitely/not/here.csv", &mut tally, 10).unwrap_err();
        assert!(err.to_string().starts_with("failed to open input file"));
    }

    #[test]
    fn test_header_only_and_empty_inputs() -> Result<()> {
        let mut tally = Tally::new(vec![2018], codes(), TallyRules::default());
        run_reader(Cursor::new(""), &mut tally, 10)?;
        run_reader(Cursor::new("a,b,c\n"), &mut tally, 10)?;
        assert_eq!(tally.stats().total_lines, 0);
        Ok(())
    }

    #[test]
    fn test_malformed_row_does_not_abort_pass() -> Result<()> {
        init_test_logging();
        let input = "h\n\
                     a,b,c,[G06K 1],d,e,twenty,f,0.9\n\
                     a,b,c,[G06K 1],d,e,2018,f,0.9\n";
        let mut tally = Tally::new(vec![2018], codes(), TallyRules::default());
        run_reader(Cursor::new(input), &mut tally, 1)?;
        assert_eq!(tally.stats().malformed_rows, 1);
        assert_eq!(tally.count(2018, "G06K"), 1);
        Ok(())
    }

    #[test]
    fn test_crlf_line_endings() -> Result<()> {
        let input = "h\r\na,b,c,[G06K 1],d,e,2018,f,0.9\r\n";
        let mut tally = Tally::new(vec![2018], codes(), TallyRules::default());
        run_reader(Cursor::new(input), &mut tally, 10)?;
        assert_eq!(tally.count(2018, "G06K"), 1);
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_in_free_text_does_not_abort_pass() -> Result<()> {
        init_test_logging();
        let mut input = b"h\nUS1,T".to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"itle,abs,[G06K 1],a,b,2018,c,0.9\n");
        input.extend_from_slice(b"US2,Title,abs,[G06K 1],a,b,2018,c,0.9\n");

        let mut tally = Tally::new(vec![2018], codes(), TallyRules::default());
        run_reader(Cursor::new(input), &mut tally, 10)?;
        assert_eq!(tally.stats().total_lines, 2);
        assert_eq!(tally.stats().malformed_rows, 0);
        assert_eq!(tally.count(2018, "G06K"), 2);
        Ok(())
    }

    #[test]
    fn test_last_line_without_newline_is_read() -> Result<()> {
        let input = "h\na,b,c,[G06K 1],d,e,2018,f,0.9";
        let mut tally = Tally::new(vec![2018], codes(), TallyRules::default());
        run_reader(Cursor::new(input), &mut tally, 10)?;
        assert_eq!(tally.count(2018, "G06K"), 1);
        Ok(())
    }

    #[test]
    fn test_progress_only_on_rows_that_pass_the_year_filter() {
        let counted = Ok(RowOutcome::Counted);
        let matched = Ok(RowOutcome::YearMatched);
        let other_year = Ok(RowOutcome::OtherYear);
        let short = Err(RowError::ShortRow {
            found: 3,
            required: 9,
        });
        let bad_novelty = Err(RowError::Novelty { value: "x".into() });

        assert!(progress_due(&counted, 10_000, 10_000));
        assert!(progress_due(&matched, 20_000, 10_000));
        assert!(!progress_due(&counted, 10_001, 10_000));
        assert!(!progress_due(&other_year, 10_000, 10_000));
        assert!(!progress_due(&short, 10_000, 10_000));
        assert!(!progress_due(&bad_novelty, 10_000, 10_000));
        // zero disables progress entirely
        assert!(!progress_due(&counted, 10_000, 0));
    }
}
