use crate::TextGaugeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of one cell in the two-column output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Line present on both sides
    Unchanged,
    /// Line only in the original document
    Removed,
    /// Line only in the modified document
    Added,
    /// Filler cell opposite a line that has no counterpart
    Blank,
}

/// One side of an aligned row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCell {
    pub text: String,
    #[serde(rename = "type")]
    pub cell_type: CellType,
    /// Row index of the removed/added pair this cell belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_index: Option<usize>,
}

impl LineCell {
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self::new(text, CellType::Unchanged)
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self::new(text, CellType::Removed)
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self::new(text, CellType::Added)
    }

    pub fn blank() -> Self {
        Self::new(String::new(), CellType::Blank)
    }

    pub fn with_pair(mut self, pair_index: usize) -> Self {
        self.pair_index = Some(pair_index);
        self
    }

    pub fn is_blank(&self) -> bool {
        self.cell_type == CellType::Blank
    }

    pub fn is_paired(&self) -> bool {
        self.pair_index.is_some()
    }

    fn new(text: impl Into<String>, cell_type: CellType) -> Self {
        Self {
            text: text.into(),
            cell_type,
            pair_index: None,
        }
    }
}

/// Line counts taken from the raw diff runs, before alignment padding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

impl DiffStats {
    pub fn total_changes(&self) -> usize {
        self.added + self.removed
    }

    pub fn is_unchanged(&self) -> bool {
        self.total_changes() == 0
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} additions -{} deletions", self.added, self.removed)
    }
}

/// Result of comparing two documents: two length-synchronized columns plus stats.
///
/// Row `i` of the output is `(original_lines[i], modified_lines[i])`. Both
/// columns always have the same length, and a `pair_index` of `k` always
/// points at row `k`, where the removed half sits on the original side and
/// the added half on the modified side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub original_lines: Vec<LineCell>,
    pub modified_lines: Vec<LineCell>,
    pub stats: DiffStats,
}

impl DiffResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of aligned rows
    pub fn len(&self) -> usize {
        self.original_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original_lines.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<(&LineCell, &LineCell)> {
        Some((self.original_lines.get(index)?, self.modified_lines.get(index)?))
    }

    pub fn rows(&self) -> impl Iterator<Item = (&LineCell, &LineCell)> {
        self.original_lines.iter().zip(self.modified_lines.iter())
    }

    /// Number of removed/added pairs selected for word-level highlighting
    pub fn pair_count(&self) -> usize {
        self.original_lines.iter().filter(|cell| cell.is_paired()).count()
    }
}

/// Language hint used only to pick a highlighter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    #[default]
    Text,
    Json,
    Yaml,
    Toml,
    Csv,
}

impl LanguageTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::Text => "text",
            LanguageTag::Json => "json",
            LanguageTag::Yaml => "yaml",
            LanguageTag::Toml => "toml",
            LanguageTag::Csv => "csv",
        }
    }

    /// File extension conventionally associated with the language
    pub fn extension(&self) -> &'static str {
        match self {
            LanguageTag::Text => "txt",
            LanguageTag::Json => "json",
            LanguageTag::Yaml => "yaml",
            LanguageTag::Toml => "toml",
            LanguageTag::Csv => "csv",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageTag {
    type Err = TextGaugeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(LanguageTag::Text),
            "json" => Ok(LanguageTag::Json),
            "yaml" | "yml" => Ok(LanguageTag::Yaml),
            "toml" => Ok(LanguageTag::Toml),
            "csv" => Ok(LanguageTag::Csv),
            other => Err(TextGaugeError::Config(format!(
                "Unknown language tag: {}",
                other
            ))),
        }
    }
}

/// How a diff is laid out for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    SideBySide,
    Unified,
}

impl FromStr for ViewMode {
    type Err = TextGaugeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "side-by-side" | "split" => Ok(ViewMode::SideBySide),
            "unified" | "inline" => Ok(ViewMode::Unified),
            other => Err(TextGaugeError::Config(format!("Unknown view mode: {}", other))),
        }
    }
}
