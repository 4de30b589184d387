//! Regex-based text passes applied to raw markdown before parsing.
//!
//! Two transforms run ahead of the renderer:
//!
//! - [`encode_image_paths`] percent-encodes image link targets so paths with
//!   spaces or non-ASCII characters survive the trip through the HTML `src`
//!   attribute
//! - [`normalize_formulas`] flattens whitespace inside math delimiters; the
//!   math renderer does not tolerate embedded line breaks between `$$` pairs

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};

/// Characters percent-encoded in image paths.
///
/// Matches `encodeURI` semantics: alphanumerics and `;,/?:@&=+$-_.!~*'()#`
/// pass through, everything else (spaces, quotes, brackets, non-ASCII) is
/// escaped as UTF-8 percent sequences.
const URI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// Markdown image syntax: `![alt](src)`. Non-greedy on `alt` (no `]`),
/// greedy-safe on `src` (no `)`).
static IMAGE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());

/// Math spans: `$$...$$` takes precedence over `$...$` at the same position.
static FORMULA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$|\$([^$]*?)\$").unwrap());

/// Leading blockquote markers on each line of a block formula.
static QUOTE_MARKERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^>+").unwrap());

/// Newline runs inside a block formula.
static NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());

/// Percent-encode the target of every markdown image link.
///
/// The `alt` text is left untouched. Already-safe paths pass through
/// unchanged, so the transform is idempotent for them.
#[must_use]
pub fn encode_image_paths(markdown: &str) -> String {
    IMAGE_LINK
        .replace_all(markdown, |caps: &Captures<'_>| {
            let alt = &caps[1];
            let src = utf8_percent_encode(&caps[2], URI_ESCAPE);
            format!("![{alt}]({src})")
        })
        .into_owned()
}

/// Normalize whitespace inside math-formula delimiters.
///
/// Inline spans (`$...$`) are trimmed of surrounding whitespace. Block spans
/// (`$$...$$`) are additionally stripped of leading `>` blockquote markers on
/// each line, and newline runs are collapsed to single spaces so a multi-line
/// block formula reaches the math renderer as one line.
#[must_use]
pub fn normalize_formulas(markdown: &str) -> String {
    FORMULA
        .replace_all(markdown, |caps: &Captures<'_>| {
            if let Some(block) = caps.get(1) {
                let content = QUOTE_MARKERS.replace_all(block.as_str().trim(), "");
                let content = NEWLINES.replace_all(&content, " ");
                format!("$${}$$", content.trim())
            } else {
                let inline = caps.get(2).map_or("", |m| m.as_str());
                format!("${}$", inline.trim())
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_safe_path_unchanged() {
        let markdown = "![photo](images/photo.png)";
        assert_eq!(encode_image_paths(markdown), markdown);
    }

    #[test]
    fn test_encode_is_idempotent_for_safe_paths() {
        let markdown = "![photo](images/photo.png)";
        let once = encode_image_paths(markdown);
        assert_eq!(encode_image_paths(&once), once);
    }

    #[test]
    fn test_encode_path_with_spaces() {
        assert_eq!(
            encode_image_paths("![pic](my album/my pic.png)"),
            "![pic](my%20album/my%20pic.png)"
        );
    }

    #[test]
    fn test_encode_unicode_path() {
        assert_eq!(
            encode_image_paths("![图](assets/图.png)"),
            "![图](assets/%E5%9B%BE.png)"
        );
    }

    #[test]
    fn test_encode_leaves_alt_untouched() {
        assert_eq!(
            encode_image_paths("![my photo 图](a b.png)"),
            "![my photo 图](a%20b.png)"
        );
    }

    #[test]
    fn test_encode_preserves_url_structure() {
        // Scheme, host, query and fragment delimiters all survive
        let markdown = "![x](https://example.org/a/b.png?size=2&v=1#frag)";
        assert_eq!(encode_image_paths(markdown), markdown);
    }

    #[test]
    fn test_encode_multiple_images() {
        assert_eq!(
            encode_image_paths("![a](p q.png) text ![b](r s.png)"),
            "![a](p%20q.png) text ![b](r%20s.png)"
        );
    }

    #[test]
    fn test_encode_ignores_plain_links() {
        let markdown = "[not an image](a b.png)";
        assert_eq!(encode_image_paths(markdown), markdown);
    }

    #[test]
    fn test_normalize_inline_trims_outer_spaces_only() {
        assert_eq!(normalize_formulas("$ x+y $"), "$x+y$");
        assert_eq!(normalize_formulas("$ x + y $"), "$x + y$");
    }

    #[test]
    fn test_normalize_block_flattens_newlines() {
        let markdown = "$$\n  a + b \n  = c\n$$";
        let result = normalize_formulas(markdown);
        assert!(!result.contains('\n'));
        assert!(result.starts_with("$$"));
        assert!(result.ends_with("$$"));
    }

    #[test]
    fn test_normalize_block_strips_quote_markers() {
        let markdown = "$$\n> a + b\n>> = c\n$$";
        let result = normalize_formulas(markdown);
        assert!(!result.contains('>'));
        assert!(!result.contains('\n'));
    }

    #[test]
    fn test_normalize_leaves_plain_text_alone() {
        let markdown = "no formulas here, just $, oh wait";
        // A lone `$` has no closing delimiter, so nothing matches
        assert_eq!(normalize_formulas(markdown), markdown);
    }

    #[test]
    fn test_normalize_mixed_inline_and_block() {
        let markdown = "inline $ a $ and block $$\nb\n$$";
        assert_eq!(normalize_formulas(markdown), "inline $a$ and block $$b$$");
    }
}
