use crate::htmlrenderer::{push_html, Footnotes};
use pulldown_cmark::*;
use std::io;
use thiserror::Error;

/// The rank the post title is rendered at on the index page. Headings inside
/// the post body are demoted below it.
const TITLE_HEADING_LEVEL: u32 = 2;

/// Converts markdown to HTML, writing the result into `w`.
///
/// * `path_prefix` is prepended onto root-relative link and image targets
///   (e.g., with a prefix of `/blog`, `/img/a.png` becomes
///   `/blog/img/a.png`). It should not end in a slash.
/// * `footnotes` says where footnote references link to and how footnote
///   anchors are named.
/// * `markdown` is the markdown source.
pub fn to_html<W: escape::StrWrite>(
    w: &mut W,
    path_prefix: &str,
    footnotes: Footnotes,
    markdown: &str,
) -> Result<(), Error> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let event_converter = EventConverter { path_prefix };
    let events = Parser::new_ext(markdown, options).map(|ev| event_converter.convert(ev));
    push_html(w, events, footnotes)?;
    Ok(())
}

struct EventConverter<'a> {
    path_prefix: &'a str,
}

impl<'a> EventConverter<'a> {
    fn prefixed<'b>(&self, url: CowStr<'b>) -> CowStr<'b> {
        // `//host/...` is protocol-relative, not root-relative
        if self.path_prefix.is_empty() || !url.starts_with('/') || url.starts_with("//") {
            url
        } else {
            CowStr::Boxed(format!("{}{}", self.path_prefix, url).into_boxed_str())
        }
    }

    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Tag<'b> {
        match tag {
            // The post body sits under the site banner and the post title, so
            // `#` becomes h3 rather than h1.
            Tag::Heading(level) => Tag::Heading((level + TITLE_HEADING_LEVEL).min(6)),
            Tag::Link(link @ LinkType::Email, url, title) => Tag::Link(link, url, title),
            Tag::Link(link, url, title) => Tag::Link(link, self.prefixed(url), title),
            Tag::Image(link, url, title) => Tag::Image(link, self.prefixed(url), title),
            _ => tag,
        }
    }

    fn convert<'b>(&self, ev: Event<'b>) -> Event<'b> {
        match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)),
            Event::End(tag) => Event::End(self.convert_tag(tag)),
            _ => ev,
        }
    }
}

/// Represents an error converting markdown to HTML.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the output couldn't be written.
    #[error(transparent)]
    Io(#[from] io::Error),
}
