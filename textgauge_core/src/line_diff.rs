use regex::Regex;
use serde::Serialize;
use similar::{capture_diff_slices, Algorithm, DiffOp, DiffTag};
use std::borrow::Cow;
use std::ops::Range;
use std::time::Instant;
use textgauge_common::{DiffAlgorithm, DiffConfig, DiffStats, TextGaugeError, WhitespaceMode};
use tracing::debug;

/// Split a document into lines.
///
/// Lines are separated by `\n`. A final `\n` terminates the last line rather
/// than starting an empty one, so `"a\nb\n"` and `"a\nb"` both have two lines,
/// `"\n"` has one empty line and `""` has none. A `\r` before the `\n` is kept
/// as part of the line.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').collect()
}

/// Classification of a run of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Unchanged,
    Removed,
    Added,
}

/// A maximal block of lines sharing one classification.
///
/// `original` and `modified` index into the split lines of each document.
/// Removed runs have an empty `modified` range and Added runs an empty
/// `original` range; Unchanged runs cover the same number of lines on both
/// sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRun {
    pub kind: RunKind,
    pub original: Range<usize>,
    pub modified: Range<usize>,
}

impl DiffRun {
    /// Number of lines in the run
    pub fn len(&self) -> usize {
        match self.kind {
            RunKind::Added => self.modified.len(),
            RunKind::Unchanged | RunKind::Removed => self.original.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Line-level diff of two documents, borrowing their text
#[derive(Debug, Clone)]
pub struct LineDiff<'a> {
    original: Vec<&'a str>,
    modified: Vec<&'a str>,
    runs: Vec<DiffRun>,
}

impl<'a> LineDiff<'a> {
    pub fn runs(&self) -> &[DiffRun] {
        &self.runs
    }

    pub fn original_lines(&self) -> &[&'a str] {
        &self.original
    }

    pub fn modified_lines(&self) -> &[&'a str] {
        &self.modified
    }

    /// Original-side lines covered by a run (empty for Added runs)
    pub fn original_side(&self, run: &DiffRun) -> &[&'a str] {
        &self.original[run.original.clone()]
    }

    /// Modified-side lines covered by a run (empty for Removed runs)
    pub fn modified_side(&self, run: &DiffRun) -> &[&'a str] {
        &self.modified[run.modified.clone()]
    }

    /// The lines of a run, taken from the side the run belongs to
    pub fn lines(&self, run: &DiffRun) -> &[&'a str] {
        match run.kind {
            RunKind::Added => self.modified_side(run),
            RunKind::Unchanged | RunKind::Removed => self.original_side(run),
        }
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for run in &self.runs {
            match run.kind {
                RunKind::Added => stats.added += run.len(),
                RunKind::Removed => stats.removed += run.len(),
                RunKind::Unchanged => {}
            }
        }
        stats
    }
}

/// Regular expression rule applied to lines before comparison
#[derive(Debug, Clone)]
pub struct RegexRule {
    pub pattern: Regex,
    pub replacement: String,
    pub description: String,
}

/// Derives the key a line is matched on from the comparison options
#[derive(Debug, Clone, Default)]
pub struct LineNormalizer {
    ignore_case: bool,
    whitespace_mode: WhitespaceMode,
    normalize_line_endings: bool,
    regex_rules: Vec<RegexRule>,
}

impl LineNormalizer {
    pub fn from_config(config: &DiffConfig) -> Result<Self, TextGaugeError> {
        let regex_rules = config
            .regex_rules
            .iter()
            .map(|rule| {
                let pattern = Regex::new(&rule.pattern).map_err(|e| {
                    TextGaugeError::Pattern(format!("{}: {}", rule.pattern, e))
                })?;
                Ok(RegexRule {
                    pattern,
                    replacement: rule.replacement.clone(),
                    description: rule.description.clone(),
                })
            })
            .collect::<Result<Vec<_>, TextGaugeError>>()?;

        Ok(Self {
            ignore_case: config.ignore_case,
            whitespace_mode: config.whitespace_mode,
            normalize_line_endings: config.normalize_line_endings,
            regex_rules,
        })
    }

    /// True when lines are matched on their exact text
    pub fn is_exact(&self) -> bool {
        !self.ignore_case
            && self.whitespace_mode == WhitespaceMode::Exact
            && !self.normalize_line_endings
            && self.regex_rules.is_empty()
    }

    pub fn key<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut key = Cow::Borrowed(line);

        if self.normalize_line_endings {
            if let Some(stripped) = line.strip_suffix('\r') {
                key = Cow::Borrowed(stripped);
            }
        }

        if self.ignore_case {
            key = Cow::Owned(key.to_lowercase());
        }

        for rule in &self.regex_rules {
            let replaced = match rule.pattern.replace_all(&key, rule.replacement.as_str()) {
                Cow::Owned(text) => Some(text),
                Cow::Borrowed(_) => None,
            };
            if let Some(text) = replaced {
                key = Cow::Owned(text);
            }
        }

        match self.whitespace_mode {
            WhitespaceMode::Exact => key,
            WhitespaceMode::IgnoreAll => {
                Cow::Owned(key.chars().filter(|c| !c.is_whitespace()).collect())
            }
            WhitespaceMode::IgnoreLeading => trim_key(key, str::trim_start),
            WhitespaceMode::IgnoreTrailing => trim_key(key, str::trim_end),
            WhitespaceMode::IgnoreChanges => {
                Cow::Owned(key.split_whitespace().collect::<Vec<_>>().join(" "))
            }
        }
    }
}

fn trim_key<'a>(key: Cow<'a, str>, trim: fn(&str) -> &str) -> Cow<'a, str> {
    match key {
        Cow::Borrowed(text) => Cow::Borrowed(trim(text)),
        Cow::Owned(text) => Cow::Owned(trim(&text).to_string()),
    }
}

/// Whole-document line differ backed by a subquadratic sequence diff
#[derive(Debug, Clone)]
pub struct LineDiffer {
    algorithm: Algorithm,
    normalizer: LineNormalizer,
}

impl LineDiffer {
    /// Exact line matching with Myers' algorithm
    pub fn new() -> Self {
        Self {
            algorithm: Algorithm::Myers,
            normalizer: LineNormalizer::default(),
        }
    }

    pub fn from_config(config: &DiffConfig) -> Result<Self, TextGaugeError> {
        let algorithm = match config.algorithm {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
        };
        Ok(Self {
            algorithm,
            normalizer: LineNormalizer::from_config(config)?,
        })
    }

    pub fn diff<'a>(&self, original: &'a str, modified: &'a str) -> LineDiff<'a> {
        let started = Instant::now();
        let original_lines = split_lines(original);
        let modified_lines = split_lines(modified);

        let ops = if self.normalizer.is_exact() {
            capture_diff_slices(self.algorithm, &original_lines, &modified_lines)
        } else {
            let original_keys: Vec<Cow<'_, str>> =
                original_lines.iter().map(|line| self.normalizer.key(*line)).collect();
            let modified_keys: Vec<Cow<'_, str>> =
                modified_lines.iter().map(|line| self.normalizer.key(*line)).collect();
            capture_diff_slices(self.algorithm, &original_keys, &modified_keys)
        };

        let runs = collect_runs(&ops);
        debug!(
            "Line diff: {} vs {} lines, {} runs in {:?}",
            original_lines.len(),
            modified_lines.len(),
            runs.len(),
            started.elapsed()
        );

        LineDiff {
            original: original_lines,
            modified: modified_lines,
            runs,
        }
    }
}

impl Default for LineDiffer {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_runs(ops: &[DiffOp]) -> Vec<DiffRun> {
    let mut runs = Vec::with_capacity(ops.len());

    for op in ops {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => push_run(&mut runs, RunKind::Unchanged, old, new),
            DiffTag::Delete => push_run(&mut runs, RunKind::Removed, old, new.start..new.start),
            DiffTag::Insert => push_run(&mut runs, RunKind::Added, old.start..old.start, new),
            DiffTag::Replace => {
                push_run(&mut runs, RunKind::Removed, old.clone(), new.start..new.start);
                push_run(&mut runs, RunKind::Added, old.end..old.end, new);
            }
        }
    }

    runs
}

/// Append a run, extending the previous one when it has the same kind so runs stay maximal
fn push_run(runs: &mut Vec<DiffRun>, kind: RunKind, original: Range<usize>, modified: Range<usize>) {
    if original.is_empty() && modified.is_empty() {
        return;
    }

    if let Some(last) = runs.last_mut() {
        if last.kind == kind
            && last.original.end == original.start
            && last.modified.end == modified.start
        {
            last.original.end = original.end;
            last.modified.end = modified.end;
            return;
        }
    }

    runs.push(DiffRun {
        kind,
        original,
        modified,
    });
}

/// Size statistics for one input document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub lines: usize,
    pub chars: usize,
    pub bytes: usize,
}

impl DocumentSummary {
    pub fn of(text: &str) -> Self {
        Self {
            lines: split_lines(text).len(),
            chars: text.chars().count(),
            bytes: text.len(),
        }
    }

    /// Human-readable size, e.g. `"512 B"` or `"1.5 KB"`
    pub fn size_label(&self) -> String {
        if self.bytes > 1024 {
            format!("{:.1} KB", self.bytes as f64 / 1024.0)
        } else {
            format!("{} B", self.bytes)
        }
    }
}
