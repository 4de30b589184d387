//! Syntax highlighting for fenced code blocks.
//!
//! Uses syntect with the bundled Sublime Text syntax definitions, emitting
//! class-annotated `<span>` markup so the page stylesheet controls the
//! color scheme.

use std::sync::OnceLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Bundled syntax definitions, loaded once per process.
fn syntax_set() -> &'static SyntaxSet {
    static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Highlight `source` as `lang`, producing class-annotated span markup.
///
/// Returns `None` when the language token is unknown or highlighting fails;
/// the caller falls back to escaped plain text.
pub(crate) fn highlight_to_classes(lang: &str, source: &str) -> Option<String> {
    let set = syntax_set();
    let syntax = set.find_syntax_by_token(lang)?;
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, set, ClassStyle::Spaced);
    for line in LinesWithEndings::from(source) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .ok()?;
    }
    Some(generator.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_language_produces_spans() {
        let html = highlight_to_classes("rust", "fn main() {}\n").unwrap();
        assert!(html.contains("<span"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_language_matched_by_extension_token() {
        // `rs` resolves through the extension rather than the syntax name
        assert!(highlight_to_classes("rs", "let x = 1;\n").is_some());
    }

    #[test]
    fn test_unknown_language_is_none() {
        assert_eq!(highlight_to_classes("not-a-language", "text\n"), None);
    }

    #[test]
    fn test_output_is_escaped() {
        let html = highlight_to_classes("rust", "let s = \"<tag>\";\n").unwrap();
        assert!(!html.contains("<tag>"));
        assert!(html.contains("&lt;tag&gt;"));
    }
}
