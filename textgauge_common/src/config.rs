use crate::TextGaugeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Similarity above which a removed/added line pair is shown as an edit
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;

/// Delay before a caller should show its "computing" indicator
pub const DEFAULT_INDICATOR_DELAY_MS: u64 = 150;

/// Sequence diff algorithm used for the whole-document line diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAlgorithm {
    /// Myers' O(ND) difference algorithm
    #[default]
    Myers,
    /// Patience diff (anchors on unique lines, often better for code)
    Patience,
}

/// How whitespace contributes to a line's match key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitespaceMode {
    /// Key keeps every whitespace char
    #[default]
    Exact,
    /// Key drops whitespace entirely, so `a b` matches `ab`
    IgnoreAll,
    /// Indentation is stripped from the key
    IgnoreLeading,
    /// Whitespace at the line end is stripped from the key
    IgnoreTrailing,
    /// Runs of whitespace collapse to one space and the ends are trimmed
    IgnoreChanges,
}

/// Regular expression applied to each line before it is compared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexRuleConfig {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub description: String,
}

/// Configuration for document comparison.
///
/// Comparison options (case, whitespace, line endings, regex rules) only
/// change how lines are matched. Output cells always carry the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub similarity_threshold: f64,
    pub algorithm: DiffAlgorithm,
    pub ignore_case: bool,
    pub whitespace_mode: WhitespaceMode,
    /// Match `a\r` and `a` as the same line. Off by default, so CRLF and LF
    /// documents differ on every line.
    pub normalize_line_endings: bool,
    pub indicator_delay_ms: u64,
    pub regex_rules: Vec<RegexRuleConfig>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            algorithm: DiffAlgorithm::Myers,
            ignore_case: false,
            whitespace_mode: WhitespaceMode::Exact,
            normalize_line_endings: false,
            indicator_delay_ms: DEFAULT_INDICATOR_DELAY_MS,
            regex_rules: Vec::new(),
        }
    }
}

impl DiffConfig {
    pub fn validate(&self) -> Result<(), TextGaugeError> {
        let threshold = self.similarity_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(TextGaugeError::Config(format!(
                "similarity_threshold must be between 0 and 1 (exclusive), got {}",
                threshold
            )));
        }
        if let Some(rule) = self.regex_rules.iter().find(|rule| rule.pattern.is_empty()) {
            return Err(TextGaugeError::Config(format!(
                "regex rule '{}' has an empty pattern",
                rule.description
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(data: &str) -> Result<Self, TextGaugeError> {
        let config: DiffConfig =
            toml::from_str(data).map_err(|e| TextGaugeError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, TextGaugeError> {
        toml::to_string_pretty(self).map_err(|e| TextGaugeError::Serialization(e.to_string()))
    }
}

pub fn load_config(path: &Path) -> Result<DiffConfig, TextGaugeError> {
    let data = fs::read_to_string(path)?;
    DiffConfig::from_toml_str(&data)
}

pub fn save_config(path: &Path, config: &DiffConfig) -> Result<(), TextGaugeError> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = config.to_toml_string()?;
    fs::write(path, data)?;
    Ok(())
}
