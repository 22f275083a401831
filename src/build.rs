//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the index page: loading the posts ([`crate::post`]),
//! selecting and ordering them ([`crate::select`]), and rendering the index
//! page ([`crate::write`]).

use crate::config::Config;
use crate::hook::HookChain;
use crate::post::{Error as LoadError, Loader, PostRecord};
use crate::write::{Error as WriteError, IndexPage, Writer, DEFAULT_INDEX_TEMPLATE};
use gtmpl::Template;
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Loads the project's posts and returns the ones that belong on the index,
/// in display order.
pub fn selected_posts(config: &Config) -> Result<Vec<PostRecord>> {
    let records = Loader::new(&config.path_prefix).load_posts(&config.posts_source_directory)?;
    let loaded = records.len();
    let selected = config.selection.apply(records);
    info!(
        "selected {} of {} documents from `{}` ({} tie order)",
        selected.len(),
        loaded,
        config.posts_source_directory.display(),
        config.selection.tie_order,
    );
    Ok(selected)
}

/// Builds the index page from a [`Config`] object and returns the path of the
/// written file. This calls into [`Loader::load_posts`],
/// [`crate::select::Selection::apply`], and [`Writer::write_index`] which do
/// the heavy-lifting.
pub fn build_site(config: &Config) -> Result<PathBuf> {
    let posts = selected_posts(config)?;
    let index_template = parse_template(config.index_template.iter())?;
    let hooks = HookChain::standard();

    let writer = Writer {
        index_template: &index_template,
        hooks: &hooks,
        output_directory: &config.output_directory,
    };
    let posts: Vec<&PostRecord> = posts.iter().collect();
    let path = writer.write_index(&IndexPage {
        site: &config.site,
        site_url: config.site_url.as_ref(),
        banner: &config.banner,
        path_prefix: &config.path_prefix,
        lazy_load: config.lazy_load,
        posts: &posts,
    })?;
    info!("wrote `{}`", path.display());
    Ok(path)
}

// Loads the template file contents, concatenating them in order, and parses
// the result into a template. No files means the built-in template.
fn parse_template<P: AsRef<Path>>(
    mut template_files: impl Iterator<Item = P>,
) -> Result<Template> {
    let mut contents = String::new();
    match template_files.next() {
        None => contents.push_str(DEFAULT_INDEX_TEMPLATE),
        Some(first) => {
            for template_file in std::iter::once(first).chain(template_files) {
                let template_file = template_file.as_ref();
                let text = std::fs::read_to_string(template_file).map_err(|err| {
                    Error::OpenTemplateFile {
                        path: template_file.to_owned(),
                        err,
                    }
                })?;
                contents.push_str(&text);
                contents.push(' ');
            }
        }
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building the index. Errors can be during loading,
/// writing, or reading and parsing template files.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for errors loading posts.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Returned for errors rendering or writing the index page.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {err}", path.display())]
    OpenTemplateFile {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for errors parsing template files.
    #[error("parsing template: {0}")]
    ParseTemplate(String),
}
