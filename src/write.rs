use crate::category::Category;
use crate::config::LazyLoad;
use crate::hook::HookChain;
use crate::htmlrenderer::escaped;
use crate::post::PostRecord;
use crate::site::SiteMetadata;
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// The template used when the project has no theme.
pub const DEFAULT_INDEX_TEMPLATE: &str = include_str!("templates/index.html");

/// The file name of the index page within the output directory.
pub const INDEX_FILE_NAME: &str = "index.html";

/// Responsible for templating the index page, running the post-render hooks
/// over it, and writing it to disk.
pub struct Writer<'a> {
    /// The template for the index page.
    pub index_template: &'a Template,

    /// Run over the rendered page before it's written.
    pub hooks: &'a HookChain,

    /// The directory the index page is written into. It's created if it
    /// doesn't exist.
    pub output_directory: &'a Path,
}

impl Writer<'_> {
    /// Templates `page` and runs the hooks over the result.
    pub fn render(&self, page: &IndexPage) -> Result<String> {
        let context = Context::from(page.to_value()).map_err(Error::Template)?;
        let mut out: Vec<u8> = Vec::new();
        self.index_template
            .execute(&mut out, &context)
            .map_err(Error::Template)?;
        Ok(self.hooks.run(String::from_utf8_lossy(&out).into_owned()))
    }

    /// Renders `page` and writes it to `{output_directory}/index.html`,
    /// returning the path written.
    pub fn write_index(&self, page: &IndexPage) -> Result<PathBuf> {
        let html = self.render(page)?;
        std::fs::create_dir_all(self.output_directory)?;
        let file_path = self.output_directory.join(INDEX_FILE_NAME);
        std::fs::write(&file_path, html)?;
        Ok(file_path)
    }
}

/// Everything the index template gets to see. Converted to a template
/// [`Value`] via [`IndexPage::to_value`].
pub struct IndexPage<'a> {
    pub site: &'a SiteMetadata,

    /// Used to build absolute permalinks for previews.
    pub site_url: Option<&'a Url>,

    pub banner: &'a str,

    /// Prepended to post and category links.
    pub path_prefix: &'a str,

    pub lazy_load: LazyLoad,

    /// The posts to preview, in display order.
    pub posts: &'a [&'a PostRecord],
}

impl IndexPage<'_> {
    /// Converts the page into a [`Value::Object`] with fields `site`, `title`,
    /// `banner`, `lazyOffset`, and `posts` (an array of previews; see
    /// [`preview_value`]). Text is HTML-escaped; post bodies are not.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site".to_owned(), self.site.to_value());
        m.insert(
            "title".to_owned(),
            Value::String(escaped(self.site.title.as_deref().unwrap_or_default())),
        );
        m.insert("banner".to_owned(), Value::String(escaped(self.banner)));
        m.insert(
            "lazyOffset".to_owned(),
            Value::String(self.lazy_load.offset.to_string()),
        );
        m.insert(
            "posts".to_owned(),
            Value::Array(
                self.posts
                    .iter()
                    .enumerate()
                    .map(|(i, post)| self.preview_value(i, post))
                    .collect(),
            ),
        );
        Value::Object(m)
    }

    /// Converts a post into its preview: `id`, `title`, `date`, `url`,
    /// `permalink`, `summary`, `summarized`, `categories`, and `lazyHeight`.
    fn preview_value(&self, i: usize, post: &PostRecord) -> Value {
        let text = |v: &Option<String>| Value::String(escaped(v.as_deref().unwrap_or_default()));
        let route = format!(
            "{}{}",
            self.path_prefix,
            post.path.as_deref().unwrap_or_default()
        );
        let permalink = match self.site_url.map(|base| base.join(&route)) {
            Some(Ok(url)) => Value::String(escaped(url.as_str())),
            Some(Err(e)) => {
                log::warn!("no permalink for `{}`: {}", route, e);
                Value::Nil
            }
            None => Value::Nil,
        };
        let (summary, summarized) = post.summary();

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), Value::String(i.to_string()));
        m.insert("title".to_owned(), text(&post.title));
        m.insert("date".to_owned(), text(&post.date));
        m.insert("url".to_owned(), Value::String(escaped(&route)));
        m.insert("permalink".to_owned(), permalink);
        m.insert("summary".to_owned(), Value::String(summary.to_owned()));
        m.insert("summarized".to_owned(), Value::Bool(summarized));
        m.insert(
            "categories".to_owned(),
            Value::Array(
                Category::from_names(&post.categories, self.path_prefix)
                    .iter()
                    .map(category_value)
                    .collect(),
            ),
        );
        m.insert(
            "lazyHeight".to_owned(),
            Value::String(self.lazy_load.height.to_string()),
        );
        Value::Object(m)
    }
}

fn category_value(category: &Category) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("name".to_owned(), Value::String(escaped(&category.name)));
    m.insert("url".to_owned(), Value::String(escaped(&category.url)));
    Value::Object(m)
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, Error)]
pub enum Error {
    /// An error during templating.
    #[error("templating index page: {0}")]
    Template(String),

    /// An error writing the output file.
    #[error(transparent)]
    Io(#[from] io::Error),
}
