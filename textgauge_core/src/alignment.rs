use crate::line_diff::{LineDiff, RunKind};
use textgauge_common::{DiffResult, DiffStats, LineCell, DEFAULT_SIMILARITY_THRESHOLD};
use tracing::debug;

/// Normalized edit-distance similarity of two lines, in `[0, 1]`.
///
/// `1 - levenshtein(a, b) / max(len(a), len(b))`, measured in chars. Two
/// empty lines are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    1.0 - distance as f64 / max_len as f64
}

/// Turns diff runs into two equal-length columns, pairing removed and added
/// lines that look like edits of one another.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentResolver {
    threshold: f64,
}

impl AlignmentResolver {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether a removed/added line pair should be shown as one edited line
    pub fn is_similar(&self, removed: &str, added: &str) -> bool {
        // The edit distance is at least the length difference, so the ratio of
        // the lengths bounds the similarity from above.
        let removed_len = removed.chars().count();
        let added_len = added.chars().count();
        let longest = removed_len.max(added_len);
        if longest > 0 && removed_len.min(added_len) as f64 / longest as f64 <= self.threshold {
            return false;
        }
        similarity(removed, added) > self.threshold
    }

    pub fn resolve(&self, diff: &LineDiff<'_>) -> DiffResult {
        let mut columns = Columns::default();
        let mut removed_buf: Vec<&str> = Vec::new();
        let mut added_buf: Vec<&str> = Vec::new();

        for run in diff.runs() {
            match run.kind {
                RunKind::Removed => removed_buf.extend_from_slice(diff.lines(run)),
                RunKind::Added => added_buf.extend_from_slice(diff.lines(run)),
                RunKind::Unchanged => {
                    self.flush(&mut columns, &mut removed_buf, &mut added_buf);
                    for (original, modified) in
                        diff.original_side(run).iter().zip(diff.modified_side(run))
                    {
                        columns.push_row(LineCell::unchanged(*original), LineCell::unchanged(*modified));
                    }
                }
            }
        }
        self.flush(&mut columns, &mut removed_buf, &mut added_buf);

        let result = columns.finish(diff.stats());
        debug!(
            "Aligned {} rows ({} paired edits)",
            result.len(),
            result.pair_count()
        );
        result
    }

    fn flush(&self, columns: &mut Columns, removed_buf: &mut Vec<&str>, added_buf: &mut Vec<&str>) {
        let rows = removed_buf.len().max(added_buf.len());

        for i in 0..rows {
            match (removed_buf.get(i), added_buf.get(i)) {
                (Some(removed), Some(added)) => {
                    if self.is_similar(removed, added) {
                        let pair_index = columns.next_row();
                        columns.push_row(
                            LineCell::removed(*removed).with_pair(pair_index),
                            LineCell::added(*added).with_pair(pair_index),
                        );
                    } else {
                        columns.push_row(LineCell::removed(*removed), LineCell::blank());
                        columns.push_row(LineCell::blank(), LineCell::added(*added));
                    }
                }
                (Some(removed), None) => {
                    columns.push_row(LineCell::removed(*removed), LineCell::blank());
                }
                (None, Some(added)) => {
                    columns.push_row(LineCell::blank(), LineCell::added(*added));
                }
                (None, None) => {}
            }
        }

        removed_buf.clear();
        added_buf.clear();
    }
}

impl Default for AlignmentResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Columns {
    original: Vec<LineCell>,
    modified: Vec<LineCell>,
}

impl Columns {
    fn next_row(&self) -> usize {
        self.original.len()
    }

    fn push_row(&mut self, original: LineCell, modified: LineCell) {
        self.original.push(original);
        self.modified.push(modified);
    }

    fn finish(mut self, stats: DiffStats) -> DiffResult {
        pad_columns(&mut self.original, &mut self.modified);
        DiffResult {
            original_lines: self.original,
            modified_lines: self.modified,
            stats,
        }
    }
}

/// Pad the shorter column with blank cells so both have the same length
pub(crate) fn pad_columns(original: &mut Vec<LineCell>, modified: &mut Vec<LineCell>) {
    let rows = original.len().max(modified.len());
    original.resize_with(rows, LineCell::blank);
    modified.resize_with(rows, LineCell::blank);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_diff::LineDiffer;
    use textgauge_common::CellType;

    fn align(original: &str, modified: &str) -> DiffResult {
        let diff = LineDiffer::new().diff(original, modified);
        AlignmentResolver::new().resolve(&diff)
    }

    fn types(cells: &[LineCell]) -> Vec<CellType> {
        cells.iter().map(|cell| cell.cell_type).collect()
    }

    #[test]
    fn test_similarity_values() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("same", "same"), 1.0);

        let score = similarity("hello world", "hello mars");
        assert!(score > 0.6 && score < 0.7, "{score}");
    }

    #[test]
    fn test_similarity_counts_chars_not_bytes() {
        // One substitution over four chars, regardless of UTF-8 width
        assert_eq!(similarity("über", "uber"), 0.75);
    }

    #[test]
    fn test_similar_lines_are_paired() {
        let result = align("start\nhello world\nend\n", "start\nhello mars\nend\n");

        assert_eq!(result.len(), 3);
        let (original, modified) = result.row(1).unwrap();
        assert_eq!(original.cell_type, CellType::Removed);
        assert_eq!(modified.cell_type, CellType::Added);
        assert_eq!(original.pair_index, Some(1));
        assert_eq!(modified.pair_index, Some(1));
        assert_eq!(original.text, "hello world");
        assert_eq!(modified.text, "hello mars");
    }

    #[test]
    fn test_dissimilar_lines_are_split() {
        let result = align("abc", "xyz");

        assert_eq!(types(&result.original_lines), vec![CellType::Removed, CellType::Blank]);
        assert_eq!(types(&result.modified_lines), vec![CellType::Blank, CellType::Added]);
        assert!(result.rows().all(|(o, m)| o.pair_index.is_none() && m.pair_index.is_none()));
        assert_eq!(result.stats, DiffStats { added: 1, removed: 1 });
    }

    #[test]
    fn test_uneven_buffers() {
        let result = align("keep\nvalue = 1\nvalue = 2\nvalue = 3\nkeep\n", "keep\nvalue = 10\nkeep\n");

        assert_eq!(
            types(&result.original_lines),
            vec![
                CellType::Unchanged,
                CellType::Removed,
                CellType::Removed,
                CellType::Removed,
                CellType::Unchanged
            ]
        );
        assert_eq!(
            types(&result.modified_lines),
            vec![
                CellType::Unchanged,
                CellType::Added,
                CellType::Blank,
                CellType::Blank,
                CellType::Unchanged
            ]
        );
        assert_eq!(result.original_lines[1].pair_index, Some(1));
        assert_eq!(result.stats, DiffStats { added: 1, removed: 3 });
    }

    #[test]
    fn test_pairing_does_not_cross_unchanged_lines() {
        let result = align("alpha one\nshared\n", "shared\nalpha two\n");

        assert_eq!(result.pair_count(), 0);
        assert_eq!(result.original_lines[0].cell_type, CellType::Removed);
        assert_eq!(result.modified_lines[2].cell_type, CellType::Added);
    }

    #[test]
    fn test_empty_lines_pair_with_each_other() {
        let resolver = AlignmentResolver::new();
        assert!(resolver.is_similar("", ""));
        assert!(!resolver.is_similar("", "x"));
    }

    #[test]
    fn test_length_bound_agrees_with_similarity() {
        let resolver = AlignmentResolver::new();
        let cases = [
            ("ab", "abcde"),
            ("abc", "abcde"),
            ("hello", "hello world"),
            ("x", "xy"),
        ];
        for (a, b) in cases {
            assert_eq!(resolver.is_similar(a, b), similarity(a, b) > 0.4, "{a} / {b}");
        }
    }

    #[test]
    fn test_custom_threshold() {
        let diff = LineDiffer::new().diff("hello world", "hello mars");
        let strict = AlignmentResolver::with_threshold(0.9).resolve(&diff);
        assert_eq!(strict.pair_count(), 0);
        assert_eq!(strict.len(), 2);
    }

    #[test]
    fn test_pad_columns() {
        let mut original = vec![LineCell::unchanged("a"), LineCell::removed("b")];
        let mut modified = vec![LineCell::unchanged("a")];

        pad_columns(&mut original, &mut modified);

        assert_eq!(original.len(), 2);
        assert_eq!(modified.len(), 2);
        assert!(modified[1].is_blank());
    }
}
