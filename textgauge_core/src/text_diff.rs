use crate::alignment::AlignmentResolver;
use crate::line_diff::{split_lines, LineDiff, LineDiffer};
use std::time::Instant;
use textgauge_common::{DiffConfig, DiffResult, DiffStats, LineCell, TextGaugeError};
use tracing::debug;

/// Line diff plus alignment, the whole comparison pipeline for two documents
#[derive(Debug, Clone)]
pub struct TextDiffEngine {
    config: DiffConfig,
    differ: LineDiffer,
    resolver: AlignmentResolver,
}

impl TextDiffEngine {
    pub fn new() -> Self {
        let config = DiffConfig::default();
        // The default configuration has no regex rules to compile
        let differ = LineDiffer::from_config(&config).unwrap_or_default();
        Self {
            config,
            differ,
            resolver: AlignmentResolver::new(),
        }
    }

    /// Build an engine from a validated configuration.
    ///
    /// Fails if the threshold is out of range or a regex rule does not compile.
    pub fn with_config(config: DiffConfig) -> Result<Self, TextGaugeError> {
        config.validate()?;
        let differ = LineDiffer::from_config(&config)?;
        let resolver = AlignmentResolver::with_threshold(config.similarity_threshold);

        Ok(Self {
            config,
            differ,
            resolver,
        })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Raw diff runs, before any alignment
    pub fn line_diff<'a>(&self, original: &'a str, modified: &'a str) -> LineDiff<'a> {
        self.differ.diff(original, modified)
    }

    /// Compare two documents into aligned, equal-length columns
    pub fn compare(&self, original: &str, modified: &str) -> DiffResult {
        if original.is_empty() && modified.is_empty() {
            return DiffResult::empty();
        }

        if original == modified {
            let cells: Vec<LineCell> = split_lines(original)
                .into_iter()
                .map(LineCell::unchanged)
                .collect();
            return DiffResult {
                original_lines: cells.clone(),
                modified_lines: cells,
                stats: DiffStats::default(),
            };
        }

        if original.is_empty() {
            let added: Vec<LineCell> = split_lines(modified).into_iter().map(LineCell::added).collect();
            return one_sided(vec![LineCell::blank(); added.len()], added);
        }

        if modified.is_empty() {
            let removed: Vec<LineCell> = split_lines(original).into_iter().map(LineCell::removed).collect();
            let blank = vec![LineCell::blank(); removed.len()];
            return one_sided(removed, blank);
        }

        let start = Instant::now();
        let diff = self.differ.diff(original, modified);
        let result = self.resolver.resolve(&diff);
        debug!(
            "Compared {} vs {} lines into {} rows ({}) in {:?}",
            diff.original_lines().len(),
            diff.modified_lines().len(),
            result.len(),
            result.stats,
            start.elapsed()
        );
        result
    }
}

impl Default for TextDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Result for a comparison where one side has no lines at all
fn one_sided(original_lines: Vec<LineCell>, modified_lines: Vec<LineCell>) -> DiffResult {
    let stats = DiffStats {
        added: modified_lines.iter().filter(|cell| !cell.is_blank()).count(),
        removed: original_lines.iter().filter(|cell| !cell.is_blank()).count(),
    };
    DiffResult {
        original_lines,
        modified_lines,
        stats,
    }
}

/// Compare two documents with the default configuration
pub fn calculate_diff(original: &str, modified: &str) -> DiffResult {
    TextDiffEngine::new().compare(original, modified)
}
