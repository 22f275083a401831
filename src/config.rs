//! Loads the project configuration. A project is a directory containing a
//! `blogdex.yaml` file:
//!
//! ```yaml
//! site:
//!   title: Dev Diary
//!   description: Notes on AWS, .NET and DevOps
//!   url: https://example.org
//!   author: Jane Doe
//! path_prefix: /blog
//! banner: Welcome. I write things about AWS and DevOps...
//! tie_order: reversed
//! lazy_load:
//!   height: 500
//!   offset: 500
//! ```
//!
//! Posts are read from `content/` (override with `posts_directory`). An
//! optional `theme/theme.yaml` lists the index template files.

use crate::select::{Selection, TieOrder};
use crate::site::SiteMetadata;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "blogdex.yaml";

const THEME_DIRECTORY: &str = "theme";
const THEME_FILE: &str = "theme.yaml";
const DEFAULT_POSTS_DIRECTORY: &str = "content";
const DEFAULT_OUTPUT_DIRECTORY: &str = "public";

/// How previews are deferred until they scroll into view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct LazyLoad {
    /// The placeholder height, in pixels, reserved for a preview that hasn't
    /// been rendered yet.
    #[serde(default = "LazyLoad::default_height")]
    pub height: u32,

    /// How close, in pixels, a placeholder must come to the viewport before
    /// its preview is rendered.
    #[serde(default = "LazyLoad::default_offset")]
    pub offset: u32,
}

impl LazyLoad {
    fn default_height() -> u32 {
        500
    }

    fn default_offset() -> u32 {
        500
    }
}

impl Default for LazyLoad {
    fn default() -> Self {
        LazyLoad {
            height: LazyLoad::default_height(),
            offset: LazyLoad::default_offset(),
        }
    }
}

#[derive(Deserialize)]
struct Project {
    #[serde(default)]
    site: SiteMetadata,

    #[serde(default)]
    path_prefix: String,

    #[serde(default)]
    posts_directory: Option<PathBuf>,

    #[serde(default)]
    banner: Option<String>,

    #[serde(default)]
    tie_order: TieOrder,

    #[serde(default)]
    lazy_load: LazyLoad,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
}

/// Settings that come from the command line rather than the project file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    /// Where to write the site. Defaults to `{project_root}/public`.
    pub output_directory: Option<PathBuf>,

    /// Development builds serve the site from the domain root, so the path
    /// prefix is dropped.
    pub development: bool,

    /// Replaces the project's `tie_order`.
    pub tie_order: Option<TieOrder>,
}

/// The resolved configuration for a build.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteMetadata,

    /// The parsed `site.url`, if one was given.
    pub site_url: Option<Url>,

    /// Either empty or a path starting (but not ending) with `/`.
    pub path_prefix: String,

    pub posts_source_directory: PathBuf,

    /// The index template files, concatenated in order. Empty means the
    /// built-in template.
    pub index_template: Vec<PathBuf>,

    pub output_directory: PathBuf,

    pub banner: String,

    pub selection: Selection,

    pub lazy_load: LazyLoad,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for [`PROJECT_FILE`] and
    /// loads the first one found.
    pub fn from_directory(dir: &Path, overrides: Overrides) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                log::debug!("using project file `{}`", path.display());
                return Config::from_project_file(&path, overrides);
            }
            current = dir.parent();
        }
        Err(Error::ProjectFileNotFound(dir.to_owned()))
    }

    /// Loads the project file at `path`. The file's directory is the project
    /// root; the posts, theme and default output directories are relative to
    /// it.
    pub fn from_project_file(path: &Path, overrides: Overrides) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)
            .map_err(|err| Error::DeserializeYaml {
                path: path.to_owned(),
                err,
            })?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParentDirectory(path.to_owned()))?;

        let theme_dir = project_root.join(THEME_DIRECTORY);
        let theme_path = theme_dir.join(THEME_FILE);
        let index_template = if theme_path.is_file() {
            let theme: Theme = serde_yaml::from_reader(open(&theme_path, "theme")?)
                .map_err(|err| Error::DeserializeYaml {
                    path: theme_path.clone(),
                    err,
                })?;
            theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect()
        } else {
            Vec::new()
        };

        let site_url = match &project.site.url {
            Some(url) => Some(Url::parse(url).map_err(|err| Error::InvalidSiteUrl {
                url: url.clone(),
                err,
            })?),
            None => None,
        };

        let path_prefix = if overrides.development {
            String::new()
        } else {
            normalize_path_prefix(&project.path_prefix)
        };

        let banner = project
            .banner
            .or_else(|| project.site.description.clone())
            .unwrap_or_default();

        Ok(Config {
            site_url,
            path_prefix,
            posts_source_directory: project_root.join(
                project
                    .posts_directory
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_POSTS_DIRECTORY)),
            ),
            index_template,
            output_directory: overrides
                .output_directory
                .unwrap_or_else(|| project_root.join(DEFAULT_OUTPUT_DIRECTORY)),
            banner,
            selection: Selection::with_tie_order(overrides.tie_order.unwrap_or(project.tie_order)),
            lazy_load: project.lazy_load,
            site: project.site,
        })
    }
}

/// Turns `blog`, `/blog/` and `/blog` into `/blog`. An empty prefix or a
/// lone `/` becomes the empty string.
pub fn normalize_path_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn open(path: &Path, kind: &'static str) -> Result<File> {
    File::open(path).map_err(|err| Error::Open {
        kind,
        path: path.to_owned(),
        err,
    })
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when no ancestor of the starting directory holds a project
    /// file.
    #[error("could not find `blogdex.yaml` in `{}` or any parent directory", .0.display())]
    ProjectFileNotFound(PathBuf),

    #[error("can't get parent directory for project file `{}`", .0.display())]
    NoParentDirectory(PathBuf),

    /// Returned when the project or theme file can't be opened.
    #[error("opening {kind} file `{}`: {err}", path.display())]
    Open {
        kind: &'static str,
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the project or theme file isn't valid.
    #[error("loading `{}`: {err}", path.display())]
    DeserializeYaml {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },

    /// Returned when `site.url` isn't an absolute URL.
    #[error("invalid site url `{url}`: {err}")]
    InvalidSiteUrl {
        url: String,
        #[source]
        err: url::ParseError,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize_path_prefix() {
        assert_eq!("/blog", normalize_path_prefix("blog"));
        assert_eq!("/blog", normalize_path_prefix("/blog/"));
        assert_eq!("/a/b", normalize_path_prefix("/a/b"));
        assert_eq!("", normalize_path_prefix("/"));
        assert_eq!("", normalize_path_prefix(""));
    }

    #[test]
    fn test_from_directory_searches_parents() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        fs::write(
            root.path().join(PROJECT_FILE),
            "site:\n  title: Dev Diary\n  url: https://example.org\npath_prefix: blog/\n\
             tie_order: stable\nlazy_load:\n  offset: 200\n",
        )?;
        let nested = root.path().join("content").join("2020");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested, Overrides::default())?;
        assert_eq!(Some("Dev Diary"), config.site.title.as_deref());
        assert_eq!("/blog", config.path_prefix);
        assert_eq!(root.path().join("content"), config.posts_source_directory);
        assert_eq!(root.path().join("public"), config.output_directory);
        assert_eq!(TieOrder::Stable, config.selection.tie_order);
        assert_eq!(LazyLoad { height: 500, offset: 200 }, config.lazy_load);
        assert!(config.index_template.is_empty());
        assert_eq!(
            Some("https://example.org/"),
            config.site_url.as_ref().map(Url::as_str)
        );
        Ok(())
    }

    #[test]
    fn test_overrides() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        fs::write(
            root.path().join(PROJECT_FILE),
            "site:\n  description: About things\npath_prefix: /blog\n",
        )?;
        let out = root.path().join("out");
        let config = Config::from_directory(
            root.path(),
            Overrides {
                output_directory: Some(out.clone()),
                development: true,
                tie_order: Some(TieOrder::Stable),
            },
        )?;
        assert_eq!("", config.path_prefix);
        assert_eq!(out, config.output_directory);
        assert_eq!(TieOrder::Stable, config.selection.tie_order);
        // the banner falls back to the site description
        assert_eq!("About things", config.banner);
        Ok(())
    }

    #[test]
    fn test_theme() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join(PROJECT_FILE), "posts_directory: posts\n")?;
        fs::create_dir(root.path().join("theme"))?;
        fs::write(
            root.path().join("theme").join("theme.yaml"),
            "index_template: [base.html, index.html]\n",
        )?;
        let config = Config::from_directory(root.path(), Overrides::default())?;
        assert_eq!(
            vec![
                root.path().join("theme").join("base.html"),
                root.path().join("theme").join("index.html"),
            ],
            config.index_template
        );
        assert_eq!(root.path().join("posts"), config.posts_source_directory);
        Ok(())
    }

    #[test]
    fn test_invalid_site_url() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join(PROJECT_FILE), "site:\n  url: not a url\n")?;
        assert!(matches!(
            Config::from_directory(root.path(), Overrides::default()),
            Err(Error::InvalidSiteUrl { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_project_file_not_found() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        // tempdirs live under the system temp directory, which has no
        // project file above it
        assert!(matches!(
            Config::from_directory(root.path(), Overrides::default()),
            Err(Error::ProjectFileNotFound(_))
        ));
        Ok(())
    }
}
