use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column holding the classification code list.
pub const CODE_FIELD: usize = 3;
/// Column holding the publication year.
pub const YEAR_FIELD: usize = 6;
/// Column holding the novelty score.
pub const NOVELTY_FIELD: usize = 8;

/// Why a single row could not be used.
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    /// Fewer fields than the configured minimum.
    #[error("row has {found} fields, need at least {required}")]
    ShortRow { found: usize, required: usize },
    #[error("invalid year {value:?}")]
    Year { value: String },
    #[error("invalid novelty score {value:?}")]
    Novelty { value: String },
}

impl RowError {
    /// Short rows are dropped without a diagnostic; parse failures are not.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, RowError::ShortRow { .. })
    }
}

/// Character window cut out of the code field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeWindow {
    pub offset: usize,
    pub len: usize,
}

impl Default for CodeWindow {
    fn default() -> Self {
        Self { offset: 1, len: 4 }
    }
}

impl CodeWindow {
    /// Fields shorter than this yield an empty code.
    pub fn min_field_len(&self) -> usize {
        self.offset + self.len + 1
    }
}

pub fn check_field_count(fields: &[String], required: usize) -> Result<(), RowError> {
    if fields.len() < required {
        return Err(RowError::ShortRow {
            found: fields.len(),
            required,
        });
    }
    Ok(())
}

pub fn extract_year(fields: &[String]) -> Result<i32, RowError> {
    let raw = fields.get(YEAR_FIELD).map(String::as_str).unwrap_or("");
    raw.trim().parse::<i32>().map_err(|_| RowError::Year {
        value: raw.to_string(),
    })
}

/// Cut the classification code out of `field`. The characters are not
/// validated; callers compare the result against their code set as-is.
pub fn extract_code(field: &str, window: CodeWindow) -> String {
    if field.chars().count() < window.min_field_len() {
        return String::new();
    }
    field.chars().skip(window.offset).take(window.len).collect()
}

pub fn extract_novelty(fields: &[String]) -> Result<f64, RowError> {
    let raw = fields.get(NOVELTY_FIELD).map(String::as_str).unwrap_or("");
    raw.trim().parse::<f64>().map_err(|_| RowError::Novelty {
        value: raw.to_string(),
    })
}
