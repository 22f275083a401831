//! Implements a custom [`push_html`]. [`pulldown_cmark::html::push_html`]
//! assumes that footnote definitions live on the same page as their
//! references and that one page holds one document's footnotes. Neither holds
//! for previews on the index page, so this renderer anchors footnote
//! references at the post's page and namespaces footnote ids per post (see
//! [`Footnotes`]). It also fills in image alt text and marks images for lazy
//! loading, since the index holds every post's images.

use pulldown_cmark::escape::{escape_href, escape_html, StrWrite};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Tag};
use std::io;

/// Escapes `s` for use in HTML text or a quoted attribute.
pub fn escaped(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // writing to a `String` can't fail
    let _ = escape_html(&mut out, s);
    out
}

fn escaped_href(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let _ = escape_href(&mut out, s);
    out
}

enum TableState {
    Head,
    Body,
}

/// An image whose alt text is still being collected.
struct PendingImage {
    dest: String,
    title: String,
    alt: String,
}

/// Where a document's footnotes live and how their anchors are named.
#[derive(Clone, Copy, Debug, Default)]
pub struct Footnotes<'a> {
    /// The URL footnote references link to, i.e. the post's own page.
    pub page: &'a str,

    /// Prepended onto each footnote's name to form its anchor, so that the
    /// footnotes of several posts can share the index page without their ids
    /// colliding. Empty means the bare name.
    pub anchor_prefix: &'a str,
}

impl Footnotes<'_> {
    fn anchor(&self, name: &str) -> String {
        if self.anchor_prefix.is_empty() {
            escaped(name)
        } else {
            escaped(&format!("{}-{}", self.anchor_prefix, name))
        }
    }
}

/// Renders markdown [`Event`]s into HTML. Modeled after `pulldown_cmark`'s
/// private `HtmlWriter`.
struct HtmlRenderer<'f> {
    table_alignments: Vec<Alignment>,
    table_state: TableState,
    table_cell_index: usize,

    /// Images nest (an image's alt text can itself contain an image), so
    /// this is a stack.
    images: Vec<PendingImage>,

    footnotes: Footnotes<'f>,
}

impl<'f> HtmlRenderer<'f> {
    fn new(footnotes: Footnotes<'f>) -> Self {
        HtmlRenderer {
            table_alignments: Vec::new(),
            table_state: TableState::Head,
            table_cell_index: 0,
            images: Vec::new(),
            footnotes,
        }
    }

    fn on_event<'a, W: StrWrite>(&mut self, w: &mut W, event: Event<'a>) -> io::Result<()> {
        if let Some(image) = self.images.last_mut() {
            match event {
                Event::Text(ref text) | Event::Code(ref text) => {
                    image.alt.push_str(&text);
                    return Ok(());
                }
                Event::Start(Tag::Image(..)) | Event::End(Tag::Image(..)) => {}
                // alt text is plain; markup inside it is dropped
                _ => return Ok(()),
            }
        }

        match event {
            Event::Start(tag) => self.on_start(w, tag),
            Event::End(tag) => self.on_end(w, tag),
            Event::Code(code) => write!(w, "<code>{}</code>", escaped(&code)),
            Event::FootnoteReference(name) => write!(
                w,
                r##"<sup class="footnote-reference"><a href="{}#{}">{}</a></sup>"##,
                escaped(self.footnotes.page),
                self.footnotes.anchor(&name),
                escaped(&name),
            ),
            Event::HardBreak => w.write_str("<br />\n"),
            Event::Html(html) => w.write_str(&html),
            Event::Rule => w.write_str("<hr />\n"),
            Event::SoftBreak => w.write_str("\n"),
            Event::TaskListMarker(checked) => write!(
                w,
                r#"<input disabled="" type="checkbox"{}/>"#,
                if checked { r#" checked="""# } else { "" }
            ),
            Event::Text(text) => escape_html(&mut *w, &text),
        }
    }

    fn on_start<'a, W: StrWrite>(&mut self, w: &mut W, tag: Tag<'a>) -> io::Result<()> {
        match tag {
            Tag::BlockQuote => w.write_str("<blockquote>\n"),
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                match info.split_whitespace().next() {
                    Some(lang) => write!(w, r#"<pre><code class="language-{}">"#, escaped(lang)),
                    None => w.write_str("<pre><code>"),
                }
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => w.write_str("<pre><code>"),
            Tag::Emphasis => w.write_str("<em>"),
            Tag::FootnoteDefinition(name) => write!(
                w,
                r#"<div class="footnote-definition" id="{}">{}. &nbsp;"#,
                self.footnotes.anchor(&name),
                escaped(&name),
            ),
            Tag::Heading(level) => write!(w, "<h{}>", level),
            Tag::Image(_link_type, dest, title) => {
                self.images.push(PendingImage {
                    dest: dest.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
                Ok(())
            }
            Tag::Item => w.write_str("<li>"),
            Tag::Link(LinkType::Email, dest, title) => write!(
                w,
                r#"<a href="mailto:{}" title="{}">"#,
                escaped_href(&dest),
                escaped(&title),
            ),
            Tag::Link(_link_type, dest, title) => write!(
                w,
                r#"<a href="{}" title="{}">"#,
                escaped_href(&dest),
                escaped(&title),
            ),
            Tag::List(None) => w.write_str("<ul>\n"),
            Tag::List(Some(1)) => w.write_str("<ol>\n"),
            Tag::List(Some(start)) => write!(w, "<ol start=\"{}\">\n", start),
            Tag::Paragraph => w.write_str("<p>"),
            Tag::Strikethrough => w.write_str("<del>"),
            Tag::Strong => w.write_str("<strong>"),
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                w.write_str("<table>")
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                w.write_str("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                w.write_str("<tr>")
            }
            Tag::TableCell => write!(
                w,
                "<{}{}>",
                match self.table_state {
                    TableState::Head => "th",
                    TableState::Body => "td",
                },
                match self.table_alignments.get(self.table_cell_index) {
                    Some(Alignment::Left) => r#" style="text-align: left""#,
                    Some(Alignment::Right) => r#" style="text-align: right""#,
                    Some(Alignment::Center) => r#" style="text-align: center""#,
                    _ => "",
                }
            ),
        }
    }

    fn on_end<W: StrWrite>(&mut self, w: &mut W, tag: Tag) -> io::Result<()> {
        match tag {
            Tag::BlockQuote => w.write_str("</blockquote>\n"),
            Tag::CodeBlock(_) => w.write_str("</code></pre>\n"),
            Tag::Emphasis => w.write_str("</em>"),
            Tag::FootnoteDefinition(_) => w.write_str("</div>\n"),
            Tag::Heading(level) => write!(w, "</h{}>\n", level),
            Tag::Image(..) => match self.images.pop() {
                Some(image) => self.write_image(w, image),
                None => Ok(()),
            },
            Tag::Item => w.write_str("</li>\n"),
            Tag::Link(..) => w.write_str("</a>"),
            Tag::List(Some(_)) => w.write_str("</ol>\n"),
            Tag::List(None) => w.write_str("</ul>\n"),
            Tag::Paragraph => w.write_str("</p>\n"),
            Tag::Strikethrough => w.write_str("</del>"),
            Tag::Strong => w.write_str("</strong>"),
            Tag::Table(_) => w.write_str("</tbody></table>\n"),
            Tag::TableHead => {
                self.table_state = TableState::Body;
                w.write_str("</tr></thead><tbody>")
            }
            Tag::TableRow => w.write_str("</tr>"),
            Tag::TableCell => {
                self.table_cell_index += 1;
                w.write_str(match self.table_state {
                    TableState::Head => "</th>",
                    TableState::Body => "</td>",
                })
            }
        }
    }

    fn write_image<W: StrWrite>(&mut self, w: &mut W, image: PendingImage) -> io::Result<()> {
        // an image nested in another image's alt text only contributes its
        // own alt text
        if let Some(outer) = self.images.last_mut() {
            outer.alt.push_str(&image.alt);
            return Ok(());
        }
        write!(w, r#"<img src="{}" alt="{}""#, escaped_href(&image.dest), escaped(&image.alt))?;
        if !image.title.is_empty() {
            write!(w, r#" title="{}""#, escaped(&image.title))?;
        }
        w.write_str(r#" loading="lazy" />"#)
    }
}

/// Converts [`Event`]s into HTML much like `pulldown_cmark::html::push_html`
/// except that footnote references link to `{page}#{anchor_prefix}-{name}`.
/// See the module description for more details.
pub fn push_html<'a, W, I>(out: &mut W, events: I, footnotes: Footnotes) -> io::Result<()>
where
    W: StrWrite,
    I: Iterator<Item = Event<'a>>,
{
    let mut renderer = HtmlRenderer::new(footnotes);
    for event in events {
        renderer.on_event(out, event)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pulldown_cmark::{Options, Parser};

    fn render_with(markdown: &str, footnotes: Footnotes) -> String {
        let mut out = String::new();
        push_html(&mut out, Parser::new_ext(markdown, Options::all()), footnotes).unwrap();
        out
    }

    fn render(markdown: &str) -> String {
        render_with(markdown, Footnotes::default())
    }

    #[test]
    fn test_footnotes() {
        let html = render_with(
            "Claim.[^1]\n\n[^1]: Source.",
            Footnotes {
                page: "/blog/post/",
                anchor_prefix: "post",
            },
        );
        assert!(html.contains(r##"<a href="/blog/post/#post-1">1</a>"##), "{}", html);
        assert!(
            html.contains(r#"<div class="footnote-definition" id="post-1">1. &nbsp;"#),
            "{}",
            html
        );
    }

    #[test]
    fn test_footnote_ids_distinct_per_post() {
        let markdown = "Claim.[^1]\n\n[^1]: Source.";
        let first = render_with(
            markdown,
            Footnotes {
                page: "/first/",
                anchor_prefix: "first",
            },
        );
        let second = render_with(
            markdown,
            Footnotes {
                page: "/second/",
                anchor_prefix: "second",
            },
        );
        assert!(first.contains(r#"id="first-1""#), "{}", first);
        assert!(second.contains(r#"id="second-1""#), "{}", second);
        assert!(!first.contains(r#"id="1""#), "{}", first);
    }

    #[test]
    fn test_footnotes_without_anchor_prefix() {
        let html = render("Claim.[^note]\n\n[^note]: Source.");
        assert!(html.contains(r##"<a href="#note">note</a>"##), "{}", html);
        assert!(html.contains(r#"id="note""#), "{}", html);
    }

    #[test]
    fn test_image_alt_text() {
        let html = render(r#"![a *nerd* `face`](/img/nerd.png "Me")"#);
        assert!(
            html.contains(
                r#"<img src="/img/nerd.png" alt="a nerd face" title="Me" loading="lazy" />"#
            ),
            "{}",
            html
        );
    }

    #[test]
    fn test_table() {
        let html = render("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        assert!(html.starts_with("<table><thead><tr>"), "{}", html);
        assert!(html.contains(r#"<td style="text-align: right">2</td>"#), "{}", html);
    }

    #[test]
    fn test_escaping() {
        let html = render("1 < 2 & `<b>`");
        assert_eq!("<p>1 &lt; 2 &amp; <code>&lt;b&gt;</code></p>\n", html);
    }
}
