use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use textgauge_common::{LanguageTag, TextGaugeError};
use tracing::debug;

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Turns one line of text into display-safe markup.
///
/// Implementations must escape anything they do not mark up themselves; the
/// presentation layer passes their output through untouched.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, line: &str, language: LanguageTag) -> String;
}

impl<F> Highlighter for F
where
    F: Fn(&str, LanguageTag) -> String + Send + Sync,
{
    fn highlight(&self, line: &str, language: LanguageTag) -> String {
        self(line, language)
    }
}

pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escapes text without adding any styling
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, line: &str, _language: LanguageTag) -> String {
        escape_html(line)
    }
}

/// Per-line HTML highlighting with syntect's bundled grammars and themes
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME).unwrap_or_else(|_| Self {
            syntax_set: SyntaxSet::load_defaults_nonewlines(),
            theme: Theme::default(),
        })
    }

    pub fn with_theme(name: &str) -> Result<Self, TextGaugeError> {
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(name)
            .ok_or_else(|| TextGaugeError::Config(format!("Unknown highlighting theme: {}", name)))?;

        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_nonewlines(),
            theme,
        })
    }

    fn syntax_for(&self, language: LanguageTag) -> &SyntaxReference {
        match language {
            LanguageTag::Text => self.syntax_set.find_syntax_plain_text(),
            _ => self
                .syntax_set
                .find_syntax_by_extension(language.extension())
                .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text()),
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, line: &str, language: LanguageTag) -> String {
        let syntax = self.syntax_for(language);
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let ranges = match highlighter.highlight_line(line, &self.syntax_set) {
            Ok(ranges) => ranges,
            Err(e) => {
                debug!("Highlighting failed for {} line: {}", language, e);
                return escape_html(line);
            }
        };

        match styled_line_to_highlighted_html(&ranges[..], IncludeBackground::No) {
            Ok(html) => html,
            Err(e) => {
                debug!("HTML rendering failed for {} line: {}", language, e);
                escape_html(line)
            }
        }
    }
}
