//! Event-driven markdown-to-HTML renderer.

use std::fmt::Write;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::highlight::highlight_to_classes;
use crate::math::render_math;
use crate::preprocess::{encode_image_paths, normalize_formulas};

/// Immutable per-call rendering configuration.
///
/// A fresh event renderer is constructed for every [`render_markdown`] call,
/// so sharing one `RenderOptions` across threads is safe.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    class_name: Option<String>,
    gfm: bool,
}

impl RenderOptions {
    /// Create options with GFM enabled and no class name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            class_name: None,
            gfm: true,
        }
    }

    /// Set the CSS class injected into every structural tag.
    ///
    /// Rendered blog content lands inside pages whose styles are scoped; the
    /// class is what the page stylesheet keys on.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class_name = Some(class.into());
        self
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// When enabled (the default), the parser supports tables, strikethrough
    /// and task lists.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Configured class name, if any.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Parser options for this configuration. Math spans are always parsed.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let base = Options::ENABLE_MATH;
        if self.gfm {
            base | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            base
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Render markdown to an HTML string.
///
/// Runs the image-path and formula preprocessors, then walks the parser
/// events writing HTML with the configured class on every structural tag.
/// Raw HTML in the source passes through unchanged.
#[must_use]
pub fn render_markdown(markdown: &str, options: &RenderOptions) -> String {
    let source = encode_image_paths(markdown);
    let source = normalize_formulas(&source);
    let parser = Parser::new_ext(&source, options.parser_options());

    let mut writer = HtmlWriter::new(options);
    for event in parser {
        writer.event(event);
    }
    writer.finish()
}

/// Escape text for HTML element and attribute contexts.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// In-flight fenced or indented code block.
struct CodeCollect {
    lang: Option<String>,
    content: String,
}

/// In-flight image: alt text is collected between start and end tags.
struct ImageCollect {
    src: String,
    title: String,
    alt: String,
}

#[derive(Default)]
struct TableState {
    alignments: Vec<Alignment>,
    cell: usize,
    in_head: bool,
}

struct HtmlWriter<'a> {
    out: String,
    /// Pre-rendered ` class="..."` attribute, empty when no class is set.
    class_attr: String,
    class_name: Option<&'a str>,
    code: Option<CodeCollect>,
    image: Option<ImageCollect>,
    table: TableState,
}

impl<'a> HtmlWriter<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        let class_attr = match options.class_name() {
            Some(class) => format!(r#" class="{}""#, escape_html(class)),
            None => String::new(),
        };
        Self {
            out: String::with_capacity(4096),
            class_attr,
            class_name: options.class_name(),
            code: None,
            image: None,
            table: TableState::default(),
        }
    }

    fn finish(self) -> String {
        self.out
    }

    /// Class attribute combining the configured class with an extra one.
    fn classes_with(&self, extra: &str) -> String {
        match self.class_name {
            Some(class) => format!(r#" class="{} {extra}""#, escape_html(class)),
            None => format!(r#" class="{extra}""#),
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                write!(self.out, "<code{}>{}</code>", self.class_attr, escape_html(&code)).unwrap();
            }
            Event::Html(html) | Event::InlineHtml(html) => self.out.push_str(&html),
            Event::SoftBreak => self.out.push('\n'),
            Event::HardBreak => self.out.push_str("<br>"),
            Event::Rule => write!(self.out, "<hr{}>", self.class_attr).unwrap(),
            Event::TaskListMarker(checked) => {
                self.out.push_str(if checked {
                    r#"<input type="checkbox" checked disabled> "#
                } else {
                    r#"<input type="checkbox" disabled> "#
                });
            }
            Event::InlineMath(tex) => self.math(&tex, false),
            Event::DisplayMath(tex) => self.math(&tex, true),
            Event::FootnoteReference(_) => {}
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => write!(self.out, "<p{}>", self.class_attr).unwrap(),
            Tag::Heading { level, .. } => {
                write!(self.out, "<{}{}>", heading_tag(level), self.class_attr).unwrap();
            }
            Tag::BlockQuote(_) => {
                write!(self.out, "<blockquote{}>", self.class_attr).unwrap();
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        info.split(' ').next().map(str::to_owned)
                    }
                    _ => None,
                };
                self.code = Some(CodeCollect {
                    lang,
                    content: String::new(),
                });
            }
            Tag::List(start) => match start {
                Some(1) => write!(self.out, "<ol{}>", self.class_attr).unwrap(),
                Some(n) => write!(self.out, r#"<ol{} start="{n}">"#, self.class_attr).unwrap(),
                None => write!(self.out, "<ul{}>", self.class_attr).unwrap(),
            },
            Tag::Item => write!(self.out, "<li{}>", self.class_attr).unwrap(),
            Tag::Table(alignments) => {
                self.table = TableState {
                    alignments,
                    cell: 0,
                    in_head: false,
                };
                write!(self.out, "<table{}>", self.class_attr).unwrap();
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell = 0;
                write!(self.out, "<thead><tr{}>", self.class_attr).unwrap();
            }
            Tag::TableRow => {
                self.table.cell = 0;
                write!(self.out, "<tr{}>", self.class_attr).unwrap();
            }
            Tag::TableCell => {
                let tag = if self.table.in_head { "th" } else { "td" };
                let align = alignment_style(self.table.alignments.get(self.table.cell));
                write!(self.out, "<{tag}{}{align}>", self.class_attr).unwrap();
            }
            Tag::Emphasis => write!(self.out, "<em{}>", self.class_attr).unwrap(),
            Tag::Strong => write!(self.out, "<strong{}>", self.class_attr).unwrap(),
            Tag::Strikethrough => write!(self.out, "<s{}>", self.class_attr).unwrap(),
            Tag::Link {
                dest_url, title, ..
            } => {
                write!(
                    self.out,
                    r#"<a{} href="{}""#,
                    self.class_attr,
                    escape_html(&dest_url)
                )
                .unwrap();
                if !title.is_empty() {
                    write!(self.out, r#" title="{}""#, escape_html(&title)).unwrap();
                }
                self.out.push('>');
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image = Some(ImageCollect {
                    src: dest_url.into_string(),
                    title: title.into_string(),
                    alt: String::new(),
                });
            }
            // Extensions not enabled by our parser options
            Tag::FootnoteDefinition(_)
            | Tag::HtmlBlock
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.out.push_str("</p>"),
            TagEnd::Heading(level) => {
                write!(self.out, "</{}>", heading_tag(level)).unwrap();
            }
            TagEnd::BlockQuote(_) => self.out.push_str("</blockquote>"),
            TagEnd::CodeBlock => self.end_code_block(),
            TagEnd::List(ordered) => {
                self.out.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.out.push_str("</li>"),
            TagEnd::Table => self.out.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.out.push_str("</tr></thead><tbody>");
                self.table.in_head = false;
            }
            TagEnd::TableRow => self.out.push_str("</tr>"),
            TagEnd::TableCell => {
                self.out
                    .push_str(if self.table.in_head { "</th>" } else { "</td>" });
                self.table.cell += 1;
            }
            TagEnd::Emphasis => self.out.push_str("</em>"),
            TagEnd::Strong => self.out.push_str("</strong>"),
            TagEnd::Strikethrough => self.out.push_str("</s>"),
            TagEnd::Link => self.out.push_str("</a>"),
            TagEnd::Image => self.end_image(),
            TagEnd::FootnoteDefinition
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock(_)
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::Superscript
            | TagEnd::Subscript => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = &mut self.code {
            code.content.push_str(text);
        } else if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else {
            self.out.push_str(&escape_html(text));
        }
    }

    fn end_code_block(&mut self) {
        let Some(block) = self.code.take() else {
            return;
        };
        let highlighted = block
            .lang
            .as_deref()
            .and_then(|lang| highlight_to_classes(lang, &block.content).map(|html| (lang, html)));

        match highlighted {
            Some((lang, html)) => {
                let code_class = self.classes_with(&format!("language-{}", escape_html(lang)));
                write!(
                    self.out,
                    "<pre{}><code{code_class}>{html}</code></pre>",
                    self.class_attr,
                )
                .unwrap();
            }
            // Unknown language or highlight failure: escaped plain text in
            // the generic wrapper
            None => {
                write!(
                    self.out,
                    "<pre{c}><code{c}>{}</code></pre>",
                    escape_html(&block.content),
                    c = self.class_attr,
                )
                .unwrap();
            }
        }
    }

    fn end_image(&mut self) {
        let Some(image) = self.image.take() else {
            return;
        };
        write!(
            self.out,
            r#"<img{} src="{}""#,
            self.class_attr,
            escape_html(&image.src)
        )
        .unwrap();
        if !image.title.is_empty() {
            write!(self.out, r#" title="{}""#, escape_html(&image.title)).unwrap();
        }
        write!(self.out, r#" alt="{}">"#, escape_html(&image.alt)).unwrap();
    }

    fn math(&mut self, tex: &str, display_mode: bool) {
        match render_math(tex, display_mode) {
            Some(html) => self.out.push_str(&html),
            // Typesetter unavailable: show the escaped source instead
            None => {
                write!(self.out, "<code{}>{}</code>", self.class_attr, escape_html(tex)).unwrap();
            }
        }
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn alignment_style(alignment: Option<&Alignment>) -> &'static str {
    match alignment {
        Some(Alignment::Left) => r#" style="text-align: left""#,
        Some(Alignment::Center) => r#" style="text-align: center""#,
        Some(Alignment::Right) => r#" style="text-align: right""#,
        Some(Alignment::None) | None => "",
    }
}
