//! Defines the [`PostRecord`], [`Loader`], and [`Error`] types. Also defines
//! the logic for loading records from markdown files on disk into memory.
//! Records are loaded whole; deciding which of them belong on the index is the
//! job of [`crate::select`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde_yaml::{Mapping, Value};
use slug::slugify;
use thiserror::Error;
use walkdir::WalkDir;

use crate::htmlrenderer::Footnotes;
use crate::markdown;

/// The marker separating a post's summary from the rest of its body.
pub const FOLD_TAG: &str = "<!-- more -->";

/// The format dates are normalized to. It's zero-padded and fixed-width, so
/// comparing two dates as strings orders them chronologically.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

const MARKDOWN_EXTENSION: &str = "md";

/// One markdown document: its frontmatter fields plus the rendered body. Every
/// frontmatter field is optional; the selector decides what a missing field
/// means.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostRecord {
    /// The template kind, e.g. `post` or `page`.
    pub layout: Option<String>,

    /// `Some(true)` for unpublished posts.
    pub draft: Option<bool>,

    /// The route the document is served from, e.g. `/hello-world/`.
    pub path: Option<String>,

    /// The publication date, normalized to [`DATE_FORMAT`] when it could be
    /// parsed.
    pub date: Option<String>,

    pub title: Option<String>,

    pub categories: Vec<String>,

    /// The body rendered to HTML.
    pub html: String,

    /// The source file, relative to the posts directory.
    pub source: PathBuf,
}

impl PostRecord {
    /// Returns the part of the body above [`FOLD_TAG`] and whether the body was
    /// actually cut. Bodies without the marker are returned whole.
    pub fn summary(&self) -> (&str, bool) {
        match self.html.find(FOLD_TAG) {
            Some(i) => (&self.html[..i], true),
            None => (&self.html, false),
        }
    }
}

/// Loads [`PostRecord`]s from markdown source files.
pub struct Loader<'a> {
    /// Prepended to root-relative links in post bodies and to footnote
    /// anchors. Empty when the site is served from the domain root.
    path_prefix: &'a str,
}

impl<'a> Loader<'a> {
    pub fn new(path_prefix: &'a str) -> Loader<'a> {
        Loader { path_prefix }
    }

    /// Walks `source_directory` recursively and loads every file with a `.md`
    /// extension. Files are visited in file-name order, which is the order
    /// the records are returned in. Posts are structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with any of `layout`, `title`, `path`, `date`,
    ///    `draft`, and `categories`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Markdown body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// layout: post
    /// title: Hello, world!
    /// path: /hello-world/
    /// date: 2021-04-16
    /// categories: [greetings]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    ///
    /// A file without frontmatter loads as a record with no fields, and a
    /// field of the wrong type is dropped with a warning. Either way the
    /// record is left for the selector to exclude rather than failing the
    /// load.
    pub fn load_posts(&self, source_directory: &Path) -> Result<Vec<PostRecord>> {
        let mut records = Vec::new();
        for result in WalkDir::new(source_directory).sort_by_file_name() {
            let entry = result?;
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|e| e.to_str())
                    != Some(MARKDOWN_EXTENSION)
            {
                continue;
            }

            // strip_prefix() should never fail; every entry is under the root
            let relative_path = entry
                .path()
                .strip_prefix(source_directory)
                .unwrap_or_else(|_| entry.path());
            records.push(self.load_post(entry.path(), relative_path)?);
        }
        debug!(
            "loaded {} records from `{}`",
            records.len(),
            source_directory.display()
        );
        Ok(records)
    }

    fn load_post(&self, path: &Path, relative_path: &Path) -> Result<PostRecord> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(e).annotate(relative_path))?;
        self.parse_post(relative_path, &contents)
            .map_err(|e| e.annotate(relative_path))
    }

    /// Parses a single [`PostRecord`] from the contents of a markdown file.
    /// `relative_path` is recorded as the record's source.
    pub fn parse_post(&self, relative_path: &Path, input: &str) -> Result<PostRecord> {
        let (yaml, body) = split_frontmatter(input).unwrap_or_else(|| {
            debug!("`{}`: no frontmatter", relative_path.display());
            ("", input)
        });
        let frontmatter = Frontmatter::parse(relative_path, yaml);

        let mut record = PostRecord {
            layout: frontmatter.layout,
            draft: frontmatter.draft,
            path: frontmatter.path,
            date: frontmatter.date.map(|raw| {
                normalize_date(&raw).unwrap_or_else(|| {
                    warn!(
                        "`{}`: unrecognized date `{}`; sorting by it verbatim",
                        relative_path.display(),
                        raw
                    );
                    raw
                })
            }),
            title: frontmatter.title,
            categories: frontmatter.categories,
            html: String::new(),
            source: relative_path.to_owned(),
        };

        let page = format!(
            "{}{}",
            self.path_prefix,
            record.path.as_deref().unwrap_or_default()
        );
        let anchor_prefix = footnote_anchor_prefix(&record);
        markdown::to_html(
            &mut record.html,
            self.path_prefix,
            Footnotes {
                page: &page,
                anchor_prefix: &anchor_prefix,
            },
            body,
        )?;
        Ok(record)
    }
}

// Every preview shares the index page, so footnote anchors are namespaced by
// the post's route, or by its file name when it has none.
fn footnote_anchor_prefix(record: &PostRecord) -> String {
    let from_path = record.path.as_deref().map(slugify).unwrap_or_default();
    if !from_path.is_empty() {
        return from_path;
    }
    record
        .source
        .file_stem()
        .map(|stem| slugify(stem.to_string_lossy()))
        .unwrap_or_default()
}

/// Splits a document into its YAML frontmatter and its body. Returns `None`
/// when the document doesn't open with a `---` fence or the fence is never
/// closed. The closing fence must begin a line.
fn split_frontmatter(input: &str) -> Option<(&str, &str)> {
    const FENCE: &str = "---";
    const CLOSING_FENCE: &str = "\n---";
    let rest = input.strip_prefix(FENCE)?;
    let offset = rest.find(CLOSING_FENCE)?;
    Some((&rest[..offset], &rest[offset + CLOSING_FENCE.len()..]))
}

/// Converts the date formats that show up in frontmatter to [`DATE_FORMAT`].
/// Returns `None` for anything unrecognized.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, DATE_FORMAT))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local().date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })?;
    Some(date.format(DATE_FORMAT).to_string())
}

// The recognized frontmatter fields. Fields are read one at a time so a
// malformed one is dropped on its own instead of failing the whole post.
#[derive(Default)]
struct Frontmatter {
    layout: Option<String>,
    title: Option<String>,
    path: Option<String>,
    date: Option<String>,
    draft: Option<bool>,
    categories: Vec<String>,
}

impl Frontmatter {
    fn parse(source: &Path, yaml: &str) -> Frontmatter {
        if yaml.trim().is_empty() {
            return Frontmatter::default();
        }
        let fields: Mapping = match serde_yaml::from_str(yaml) {
            Ok(fields) => fields,
            Err(e) => {
                warn!("`{}`: ignoring unreadable frontmatter: {}", source.display(), e);
                return Frontmatter::default();
            }
        };
        let field = |name: &str| {
            fields
                .get(&Value::String(name.to_owned()))
                .filter(|value| !value.is_null())
        };
        let text = |name: &str| {
            field(name).and_then(|value| {
                let text = scalar_text(value);
                if text.is_none() {
                    warn!("`{}`: ignoring non-scalar `{}`", source.display(), name);
                }
                text
            })
        };

        Frontmatter {
            layout: text("layout"),
            title: text("title"),
            path: text("path"),
            date: text("date"),
            draft: field("draft").map(|value| {
                if !value.is_bool() {
                    warn!(
                        "`{}`: `draft` is not a boolean; reading it as {}",
                        source.display(),
                        truthy(value)
                    );
                }
                truthy(value)
            }),
            categories: field("categories")
                .map(|value| categories(source, value))
                .unwrap_or_default(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a frontmatter value as a condition: empty strings, zero, and null
/// are false and anything else is true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// `categories` may be a single category or a list of them.
fn categories(source: &Path, value: &Value) -> Vec<String> {
    let values = match value {
        Value::Sequence(values) => values.as_slice(),
        single => std::slice::from_ref(single),
    };
    values
        .iter()
        .filter_map(|value| {
            let category = scalar_text(value);
            if category.is_none() {
                warn!("`{}`: ignoring non-scalar category", source.display());
            }
            category
        })
        .collect()
}

/// Represents the result of a [`PostRecord`]-load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`PostRecord`].
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the body couldn't be rendered.
    #[error(transparent)]
    Markdown(#[from] markdown::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned for errors walking the posts directory.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// An error with an annotation.
    #[error("{0}: {1}")]
    Annotated(String, Box<Error>),
}

impl Error {
    fn annotate(self, relative_path: &Path) -> Error {
        Error::Annotated(
            format!("loading post `{}`", relative_path.display()),
            Box::new(self),
        )
    }
}
