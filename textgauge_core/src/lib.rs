pub mod line_diff;
pub mod alignment;
pub mod word_diff;
pub mod highlight;
pub mod presentation;
pub mod text_diff;
pub mod scheduler;

pub use line_diff::{split_lines, DiffRun, DocumentSummary, LineDiff, LineDiffer, LineNormalizer, RunKind};
pub use alignment::{similarity, AlignmentResolver};
pub use word_diff::{TokenChange, WordDiff, WordSpan};
pub use highlight::{escape_html, Highlighter, PlainHighlighter, SyntectHighlighter};
pub use presentation::{
    LineContent, LineMarker, LineTone, Presentation, PresentationBuilder, RenderedLine,
    SideBySideView, UnifiedView,
};
pub use text_diff::{calculate_diff, TextDiffEngine};
pub use scheduler::{DiffComputation, DiffOutcome, DiffResponse, DiffScheduler, DiffTicket, RequestId};
