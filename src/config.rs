use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    process::{extract::CodeWindow, tally::TallyRules},
    report::SignStyle,
};

/// Settings for one report run. Every field has a default, so a YAML file
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: PathBuf,
    pub tech_codes: Vec<String>,
    pub novelty_threshold: f64,
    pub min_fields: usize,
    pub code_window: CodeWindow,
    /// Log a progress line every this many data lines; 0 disables it.
    pub progress_every: u64,
    /// How many observed codes to list in the diagnostics.
    pub observed_limit: usize,
    pub sign_style: SignStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("DeepPatentAI_1000.csv"),
            tech_codes: vec!["G06K".into(), "F41G".into(), "G10F".into()],
            novelty_threshold: 0.8,
            min_fields: 9,
            code_window: CodeWindow::default(),
            progress_every: 10_000,
            observed_limit: 20,
            sign_style: SignStyle::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn rules(&self) -> TallyRules {
        TallyRules {
            novelty_threshold: self.novelty_threshold,
            min_fields: self.min_fields,
            code_window: self.code_window,
        }
    }
}
