use std::collections::BTreeMap;

use crate::process::{
    extract::{self, CodeWindow, RowError, CODE_FIELD},
    tokenize::split_line,
};

/// Filtering knobs for one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TallyRules {
    /// Rows need a novelty strictly above this to be counted.
    pub novelty_threshold: f64,
    pub min_fields: usize,
    pub code_window: CodeWindow,
}

impl Default for TallyRules {
    fn default() -> Self {
        Self {
            novelty_threshold: 0.8,
            min_fields: 9,
            code_window: CodeWindow::default(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    /// Every data line read, header excluded.
    pub total_lines: u64,
    pub year_matches: u64,
    pub novelty_matches: u64,
    pub valid_records: u64,
    pub short_rows: u64,
    pub malformed_rows: u64,
}

/// How far a row got through the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    OtherYear,
    YearMatched,
    NoveltyMatched,
    Counted,
}

/// Accumulator for a single pass over the dataset.
///
/// The matrix holds exactly `years × codes`, all zero at construction; codes
/// outside the set only ever land in `observed`.
#[derive(Debug, Clone)]
pub struct Tally {
    years: Vec<i32>,
    codes: Vec<String>,
    rules: TallyRules,
    matrix: BTreeMap<i32, BTreeMap<String, u64>>,
    observed: BTreeMap<String, u64>,
    stats: Diagnostics,
}

impl Tally {
    pub fn new(years: Vec<i32>, codes: Vec<String>, rules: TallyRules) -> Self {
        let mut matrix: BTreeMap<i32, BTreeMap<String, u64>> = BTreeMap::new();
        for &year in &years {
            let row = matrix.entry(year).or_default();
            for code in &codes {
                row.insert(code.clone(), 0);
            }
        }
        Self {
            years,
            codes,
            rules,
            matrix,
            observed: BTreeMap::new(),
            stats: Diagnostics::default(),
        }
    }

    /// Tokenize and account for one data line.
    ///
    /// A parse failure is counted in `malformed_rows` before it is returned;
    /// the caller only decides how loudly to report it.
    pub fn record_line(&mut self, line: &str) -> Result<RowOutcome, RowError> {
        self.stats.total_lines += 1;
        let fields = split_line(line);
        self.record_fields(&fields).inspect_err(|err| {
            if err.is_malformed() {
                self.stats.malformed_rows += 1;
            } else {
                self.stats.short_rows += 1;
            }
        })
    }

    fn record_fields(&mut self, fields: &[String]) -> Result<RowOutcome, RowError> {
        extract::check_field_count(fields, self.rules.min_fields)?;

        let year = extract::extract_year(fields)?;
        if !self.years.contains(&year) {
            return Ok(RowOutcome::OtherYear);
        }
        self.stats.year_matches += 1;

        let code = extract::extract_code(&fields[CODE_FIELD], self.rules.code_window);
        *self.observed.entry(code.clone()).or_insert(0) += 1;

        let novelty = extract::extract_novelty(fields)?;
        if novelty <= self.rules.novelty_threshold {
            return Ok(RowOutcome::YearMatched);
        }
        self.stats.novelty_matches += 1;

        match self
            .matrix
            .get_mut(&year)
            .and_then(|row| row.get_mut(&code))
        {
            Some(count) => {
                *count += 1;
                self.stats.valid_records += 1;
                Ok(RowOutcome::Counted)
            }
            None => Ok(RowOutcome::NoveltyMatched),
        }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn stats(&self) -> &Diagnostics {
        &self.stats
    }

    /// Every code seen on a year-matching row, in string order.
    pub fn observed(&self) -> &BTreeMap<String, u64> {
        &self.observed
    }

    /// Count for a (year, code) pair; zero for pairs outside the matrix.
    pub fn count(&self, year: i32, code: &str) -> u64 {
        self.matrix
            .get(&year)
            .and_then(|row| row.get(code))
            .copied()
            .unwrap_or(0)
    }

    /// `(code, first, last)` between the first and last requested year, or
    /// `None` when no years were requested.
    pub fn growth(&self) -> Option<Vec<(&str, u64, u64)>> {
        let first = *self.years.first()?;
        let last = *self.years.last()?;
        Some(
            self.codes
                .iter()
                .map(|code| (code.as_str(), self.count(first, code), self.count(last, code)))
                .collect(),
        )
    }
}
