//! Math formula typesetting via KaTeX.

use katex::Opts;

/// Render a TeX formula to KaTeX HTML markup.
///
/// `throw_on_error` is disabled, so malformed input yields KaTeX's inline
/// error markup rather than a failure. Returns `None` only when the embedded
/// JS engine itself fails; the caller falls back to escaped source text.
pub(crate) fn render_math(tex: &str, display_mode: bool) -> Option<String> {
    let opts = Opts::builder()
        .display_mode(display_mode)
        .throw_on_error(false)
        .build()
        .ok()?;
    katex::render_with_opts(tex, &opts).ok()
}
