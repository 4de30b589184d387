//! Markdown rendering for Vellum blog content.
//!
//! This crate turns raw blog markdown into HTML suitable for embedding in a
//! page whose styles are scoped by a CSS class: every structural tag the
//! renderer emits carries the caller-supplied class name.
//!
//! Rendering is a pipeline:
//!
//! 1. [`encode_image_paths`] percent-encodes image link targets
//! 2. [`normalize_formulas`] flattens whitespace inside `$`/`$$` spans
//! 3. the event renderer walks the pulldown-cmark stream, highlighting code
//!    fences through syntect and typesetting math through KaTeX
//!
//! Configuration is an immutable [`RenderOptions`] value passed per call, so
//! parallel renders never share mutable state.
//!
//! # Example
//!
//! ```
//! use vellum_renderer::{RenderOptions, render_markdown};
//!
//! let options = RenderOptions::new().with_class("markdown");
//! let html = render_markdown("# Hello\n\n**Bold** text", &options);
//! assert!(html.contains(r#"<h1 class="markdown">"#));
//! ```

mod highlight;
mod math;
mod preprocess;
mod renderer;

pub use preprocess::{encode_image_paths, normalize_formulas};
pub use renderer::{RenderOptions, escape_html, render_markdown};
