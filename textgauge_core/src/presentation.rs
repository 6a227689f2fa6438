use crate::highlight::{escape_html, Highlighter};
use crate::word_diff::{TokenChange, WordDiff, WordSpan};
use serde::Serialize;
use std::fmt::Write;
use std::ops::Range;
use textgauge_common::{CellType, DiffResult, DiffStats, LanguageTag, LineCell, ViewMode};

/// Gutter marker shown before a rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMarker {
    Context,
    Removed,
    Added,
    None,
}

impl LineMarker {
    pub fn symbol(&self) -> &'static str {
        match self {
            LineMarker::Context => " ",
            LineMarker::Removed => "-",
            LineMarker::Added => "+",
            LineMarker::None => "",
        }
    }
}

/// Background emphasis of a rendered line.
///
/// Paired lines get a soft tone with the changed words emphasized; unpaired
/// removed/added lines are highlighted solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTone {
    Plain,
    Blank,
    PairedRemoved,
    PairedAdded,
    Removed,
    Added,
}

impl LineTone {
    pub fn css_class(&self) -> &'static str {
        match self {
            LineTone::Plain => "diff-plain",
            LineTone::Blank => "diff-blank",
            LineTone::PairedRemoved => "diff-removed-soft",
            LineTone::PairedAdded => "diff-added-soft",
            LineTone::Removed => "diff-removed",
            LineTone::Added => "diff-added",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LineContent {
    /// Highlighter output, already display-safe
    Markup(String),
    /// Word-diff spans as raw text
    Words(Vec<WordSpan>),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    /// 1-based line number in the document the line comes from
    pub number: Option<usize>,
    pub marker: LineMarker,
    pub tone: LineTone,
    pub content: LineContent,
}

impl RenderedLine {
    fn blank() -> Self {
        Self {
            number: None,
            marker: LineMarker::None,
            tone: LineTone::Blank,
            content: LineContent::Empty,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.tone == LineTone::Blank
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("<div class=\"diff-line {}\">", self.tone.css_class());
        if let Some(number) = self.number {
            let _ = write!(html, "<span class=\"diff-line-number\">{}</span>", number);
        }
        let _ = write!(
            html,
            "<span class=\"diff-marker\">{}</span>",
            self.marker.symbol()
        );

        match &self.content {
            LineContent::Markup(markup) => html.push_str(markup),
            LineContent::Words(spans) => {
                for span in spans {
                    match span.change {
                        TokenChange::Common => html.push_str(&escape_html(&span.text)),
                        TokenChange::Removed => {
                            let _ = write!(
                                html,
                                "<mark class=\"diff-word-removed\">{}</mark>",
                                escape_html(&span.text)
                            );
                        }
                        TokenChange::Added => {
                            let _ = write!(
                                html,
                                "<mark class=\"diff-word-added\">{}</mark>",
                                escape_html(&span.text)
                            );
                        }
                    }
                }
            }
            LineContent::Empty => {}
        }

        html.push_str("</div>");
        html
    }
}

/// Two row-synchronized panels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideBySideView {
    pub original: Vec<RenderedLine>,
    pub modified: Vec<RenderedLine>,
    pub stats: DiffStats,
}

impl SideBySideView {
    pub fn to_html(&self) -> String {
        let mut html = stats_html(&self.stats);
        html.push_str("<div class=\"diff-side-by-side\">");
        for (class, lines) in [("diff-original", &self.original), ("diff-modified", &self.modified)] {
            let _ = write!(html, "<div class=\"diff-column {}\">", class);
            for line in lines {
                html.push_str(&line.to_html());
            }
            html.push_str("</div>");
        }
        html.push_str("</div>");
        html
    }
}

/// One interleaved stream of context, removed and added lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedView {
    pub lines: Vec<RenderedLine>,
    pub stats: DiffStats,
}

impl UnifiedView {
    pub fn to_html(&self) -> String {
        let mut html = stats_html(&self.stats);
        html.push_str("<div class=\"diff-unified\">");
        for line in &self.lines {
            html.push_str(&line.to_html());
        }
        html.push_str("</div>");
        html
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Presentation {
    SideBySide(SideBySideView),
    Unified(UnifiedView),
}

impl Presentation {
    pub fn stats(&self) -> DiffStats {
        match self {
            Presentation::SideBySide(view) => view.stats,
            Presentation::Unified(view) => view.stats,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Presentation::SideBySide(view) => view.to_html(),
            Presentation::Unified(view) => view.to_html(),
        }
    }
}

fn stats_html(stats: &DiffStats) -> String {
    format!(
        "<div class=\"diff-stats\"><span class=\"diff-stats-added\">+{} additions</span>\
         <span class=\"diff-stats-removed\">-{} deletions</span></div>",
        stats.added, stats.removed
    )
}

/// Renders aligned rows for display.
///
/// Purely downstream of the diff: it never re-runs the line diff, and word
/// diffs are computed only for the paired rows inside the requested window.
pub struct PresentationBuilder<'h> {
    highlighter: &'h dyn Highlighter,
    language: LanguageTag,
}

impl<'h> PresentationBuilder<'h> {
    pub fn new(highlighter: &'h dyn Highlighter, language: LanguageTag) -> Self {
        Self {
            highlighter,
            language,
        }
    }

    pub fn build(&self, result: &DiffResult, mode: ViewMode) -> Presentation {
        match mode {
            ViewMode::SideBySide => Presentation::SideBySide(self.side_by_side(result)),
            ViewMode::Unified => Presentation::Unified(self.unified(result)),
        }
    }

    pub fn side_by_side(&self, result: &DiffResult) -> SideBySideView {
        self.side_by_side_range(result, 0..result.len())
    }

    /// Render only the rows in `rows` (clamped to the result)
    pub fn side_by_side_range(&self, result: &DiffResult, rows: Range<usize>) -> SideBySideView {
        let rows = clamp_rows(rows, result.len());
        let mut original_number = count_lines(&result.original_lines[..rows.start]);
        let mut modified_number = count_lines(&result.modified_lines[..rows.start]);
        let mut original = Vec::with_capacity(rows.len());
        let mut modified = Vec::with_capacity(rows.len());

        for row in rows {
            let (original_words, modified_words) = row_word_diffs(result, row);
            original.push(self.render_cell(
                &result.original_lines[row],
                &mut original_number,
                original_words.as_ref(),
            ));
            modified.push(self.render_cell(
                &result.modified_lines[row],
                &mut modified_number,
                modified_words.as_ref(),
            ));
        }

        SideBySideView {
            original,
            modified,
            stats: result.stats,
        }
    }

    pub fn unified(&self, result: &DiffResult) -> UnifiedView {
        self.unified_range(result, 0..result.len())
    }

    /// Render only the rows in `rows` (clamped to the result) as one stream
    pub fn unified_range(&self, result: &DiffResult, rows: Range<usize>) -> UnifiedView {
        let rows = clamp_rows(rows, result.len());
        let mut original_number = count_lines(&result.original_lines[..rows.start]);
        let mut modified_number = count_lines(&result.modified_lines[..rows.start]);
        let mut lines = Vec::with_capacity(rows.len());

        for row in rows {
            let original = &result.original_lines[row];
            let modified = &result.modified_lines[row];

            if original.cell_type == CellType::Unchanged && modified.cell_type == CellType::Unchanged {
                modified_number += 1;
                lines.push(self.render_cell(original, &mut original_number, None));
                continue;
            }

            let (original_words, modified_words) = row_word_diffs(result, row);
            let removed = self.render_cell(original, &mut original_number, original_words.as_ref());
            let added = self.render_cell(modified, &mut modified_number, modified_words.as_ref());
            lines.extend([removed, added].into_iter().filter(|line| !line.is_blank()));
        }

        UnifiedView {
            lines,
            stats: result.stats,
        }
    }

    fn render_cell(&self, cell: &LineCell, number: &mut usize, words: Option<&WordDiff>) -> RenderedLine {
        let (marker, tone, paired_tone) = match cell.cell_type {
            CellType::Blank => return RenderedLine::blank(),
            CellType::Unchanged => (LineMarker::Context, LineTone::Plain, LineTone::Plain),
            CellType::Removed => (LineMarker::Removed, LineTone::Removed, LineTone::PairedRemoved),
            CellType::Added => (LineMarker::Added, LineTone::Added, LineTone::PairedAdded),
        };
        *number += 1;

        let (tone, content) = match (cell.cell_type, words) {
            (CellType::Removed, Some(words)) => (
                paired_tone,
                LineContent::Words(words.removed_view().cloned().collect()),
            ),
            (CellType::Added, Some(words)) => (
                paired_tone,
                LineContent::Words(words.added_view().cloned().collect()),
            ),
            _ => (
                tone,
                LineContent::Markup(self.highlighter.highlight(&cell.text, self.language)),
            ),
        };

        RenderedLine {
            number: Some(*number),
            marker,
            tone,
            content,
        }
    }
}

fn clamp_rows(rows: Range<usize>, len: usize) -> Range<usize> {
    let end = rows.end.min(len);
    rows.start.min(end)..end
}

fn count_lines(cells: &[LineCell]) -> usize {
    cells.iter().filter(|cell| !cell.is_blank()).count()
}

/// The removed/added halves of pair `pair_index`, if the pair is well formed
fn pair_texts(result: &DiffResult, pair_index: usize) -> Option<(&str, &str)> {
    let (removed, added) = result.row(pair_index)?;
    let well_formed = removed.cell_type == CellType::Removed
        && added.cell_type == CellType::Added
        && removed.pair_index == Some(pair_index)
        && added.pair_index == Some(pair_index);
    well_formed.then(|| (removed.text.as_str(), added.text.as_str()))
}

/// Word diffs for the original and modified cells of one row
fn row_word_diffs(result: &DiffResult, row: usize) -> (Option<WordDiff>, Option<WordDiff>) {
    let original_pair = result.original_lines[row].pair_index;
    let modified_pair = result.modified_lines[row].pair_index;

    let original_words = original_pair
        .and_then(|k| pair_texts(result, k))
        .map(|(removed, added)| WordDiff::compute(removed, added));

    let modified_words = if modified_pair.is_some() && modified_pair == original_pair {
        original_words.clone()
    } else {
        modified_pair
            .and_then(|k| pair_texts(result, k))
            .map(|(removed, added)| WordDiff::compute(removed, added))
    };

    (original_words, modified_words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::PlainHighlighter;
    use crate::text_diff::calculate_diff;

    fn builder() -> PresentationBuilder<'static> {
        PresentationBuilder::new(&PlainHighlighter, LanguageTag::Text)
    }

    fn changed_words(line: &RenderedLine) -> Vec<String> {
        match &line.content {
            LineContent::Words(spans) => spans
                .iter()
                .filter(|span| span.is_change())
                .map(|span| span.text.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_side_by_side_paired_row_uses_word_diff() {
        let result = calculate_diff("same\nhello world\n", "same\nhello mars\n");
        let view = builder().side_by_side(&result);

        assert_eq!(view.original.len(), view.modified.len());
        assert_eq!(view.original[1].tone, LineTone::PairedRemoved);
        assert_eq!(view.modified[1].tone, LineTone::PairedAdded);
        assert_eq!(changed_words(&view.original[1]), vec!["world"]);
        assert_eq!(changed_words(&view.modified[1]), vec!["mars"]);
        assert_eq!(view.original[0].content, LineContent::Markup("same".to_string()));
    }

    #[test]
    fn test_side_by_side_unpaired_rows_are_solid() {
        let result = calculate_diff("abc", "xyz");
        let view = builder().side_by_side(&result);

        assert_eq!(view.original[0].tone, LineTone::Removed);
        assert!(view.modified[0].is_blank());
        assert!(view.original[1].is_blank());
        assert_eq!(view.modified[1].tone, LineTone::Added);
        assert_eq!(view.modified[1].number, Some(1));
    }

    #[test]
    fn test_unified_interleaves_pairs() {
        let result = calculate_diff("a\nhello world\nz\n", "a\nhello mars\nnew line entirely\nz\n");
        let view = builder().unified(&result);

        let markers: Vec<&str> = view.lines.iter().map(|line| line.marker.symbol()).collect();
        assert_eq!(markers, vec![" ", "-", "+", "+", " "]);
        assert_eq!(view.lines[1].tone, LineTone::PairedRemoved);
        assert_eq!(view.lines[2].tone, LineTone::PairedAdded);
        assert_eq!(view.lines[3].tone, LineTone::Added);
        assert_eq!(view.lines[4].number, Some(3));
        assert_eq!(view.stats, result.stats);
    }

    #[test]
    fn test_line_numbers_skip_blank_cells() {
        let result = calculate_diff("one\ntwo\nthree\n", "one\nthree\n");
        let view = builder().side_by_side(&result);

        let original: Vec<Option<usize>> = view.original.iter().map(|l| l.number).collect();
        let modified: Vec<Option<usize>> = view.modified.iter().map(|l| l.number).collect();
        assert_eq!(original, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(modified, vec![Some(1), None, Some(2)]);
    }

    #[test]
    fn test_range_rendering_keeps_numbers() {
        let original: String = (1..=20).map(|i| format!("line {i}\n")).collect();
        let modified = original.replace("line 15\n", "line 150\n");
        let result = calculate_diff(&original, &modified);
        let window = builder().side_by_side_range(&result, 12..16);

        assert_eq!(window.original.len(), 4);
        assert_eq!(window.original[0].number, Some(13));
        assert_eq!(window.original[2].tone, LineTone::PairedRemoved);

        let clamped = builder().side_by_side_range(&result, 18..100);
        assert_eq!(clamped.original.len(), 2);
        assert!(builder().unified_range(&result, 50..60).lines.is_empty());
    }

    #[test]
    fn test_highlighter_is_used_for_plain_cells() {
        let highlighter = |line: &str, language: LanguageTag| format!("<{}>{}", language, line);
        let builder = PresentationBuilder::new(&highlighter, LanguageTag::Json);
        let result = calculate_diff("{}\n", "{}\n[]\n");
        let view = builder.unified(&result);

        assert_eq!(view.lines[0].content, LineContent::Markup("<json>{}".to_string()));
        assert_eq!(view.lines[1].content, LineContent::Markup("<json>[]".to_string()));
    }

    #[test]
    fn test_html_escapes_word_spans() {
        let result = calculate_diff("<b>old</b> text", "<b>new</b> text");
        let html = builder().build(&result, ViewMode::Unified).to_html();

        assert!(html.contains("diff-stats"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("<mark class=\"diff-word-removed\">"));
    }

    #[test]
    fn test_build_dispatches_on_mode() {
        let result = calculate_diff("a", "b");
        assert!(matches!(
            builder().build(&result, ViewMode::SideBySide),
            Presentation::SideBySide(_)
        ));
        let unified = builder().build(&result, ViewMode::Unified);
        assert_eq!(unified.stats(), result.stats);
    }
}
